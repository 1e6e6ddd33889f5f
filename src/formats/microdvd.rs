/*!
 * MicroDVD (`.sub`) grammar.
 *
 * One event per line, `{start}{end}text`, positions in frames and `|` between
 * text lines. A leading `{1}{1}<fps>` line declares the frame rate.
 */

use std::fmt::Write as _;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{report_dropped_fields, EventCollector, FormatKind, ParseOptions, Parsed, WriteOptions};
use crate::document::{Header, SubtitleDocument, SubtitleEvent};
use crate::errors::{Result, SubtitleError};
use crate::timing::{FrameRate, Mode, Position};

pub const EVENT_FIELDS: &[&str] = &["Start", "End", "Text"];

pub(crate) const LINE_SEPARATOR: &str = "|";

// @const: MicroDVD event line regex
static EVENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([^}]*)\}\{([^}]*)\}(.*)$").expect("Invalid MicroDVD event regex"));

fn parse_frame(value: &str, event_index: usize) -> Result<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubtitleError::TimecodeParse {
            event_index,
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| SubtitleError::TimecodeParse {
        event_index,
        value: value.to_string(),
    })
}

fn parse_event(line: &str, event_index: usize) -> Result<SubtitleEvent> {
    let caps = EVENT_REGEX.captures(line).ok_or_else(|| SubtitleError::TimecodeParse {
        event_index,
        value: line.trim().to_string(),
    })?;
    let start = parse_frame(&caps[1], event_index)?;
    let end = parse_frame(&caps[2], event_index)?;
    Ok(SubtitleEvent::new(
        Position::Frame(start),
        Position::Frame(end),
        caps[3].replace(LINE_SEPARATOR, "\n"),
    ))
}

/// Read a `{1}{1}<fps>` frame-rate declaration
fn frame_rate_line(line: &str) -> Option<FrameRate> {
    let caps = EVENT_REGEX.captures(line)?;
    if &caps[1] != "1" || &caps[2] != "1" {
        return None;
    }
    caps[3].parse().ok()
}

pub(crate) fn parse(content: &str, options: &ParseOptions) -> Result<Parsed> {
    let mut collector = EventCollector::new(options.malformed, Mode::Frame);
    let mut frame_rate = None;
    let mut first = true;

    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if std::mem::take(&mut first) {
            if let Some(rate) = frame_rate_line(line) {
                debug!("MicroDVD file declares {} fps", rate);
                frame_rate = Some(rate);
                continue;
            }
        }
        let event = parse_event(line, collector.index());
        collector.collect(number + 1, event)?;
    }
    let (events, warnings) = collector.finish();

    Ok(Parsed {
        document: SubtitleDocument {
            header: Header::new(FormatKind::MicroDvd),
            mode: Mode::Frame,
            frame_rate,
            events,
        },
        warnings,
    })
}

pub(crate) fn write(document: &SubtitleDocument, options: &WriteOptions) -> Result<String> {
    report_dropped_fields(document, FormatKind::MicroDvd, &[], options);
    let mut output = String::new();
    match document.frame_rate {
        Some(rate) => {
            let declared = rate.to_decimal_string().ok_or_else(|| {
                SubtitleError::Unsupported(format!("MicroDVD cannot declare a frame rate of {}", rate))
            })?;
            let _ = writeln!(output, "{{1}}{{1}}{}", declared);
        }
        None => {
            // Without a rate line, a first event reading as one would be taken for it
            if let Some(first) = document.events.first() {
                let line = format!("{{1}}{{1}}{}", options.text_of(first));
                if first.start == Position::Frame(1) && first.end == Position::Frame(1) && frame_rate_line(&line).is_some() {
                    return Err(SubtitleError::Unsupported(
                        "MicroDVD cannot hold a first event that reads as a frame rate".to_string(),
                    ));
                }
            }
        }
    }
    for (index, event) in document.events.iter().enumerate() {
        let (Position::Frame(start), Position::Frame(end)) = (event.start, event.end) else {
            return Err(SubtitleError::ModeMismatch { event_index: index });
        };
        let text = options.text_of(event).replace('\n', LINE_SEPARATOR);
        let _ = writeln!(output, "{{{}}}{{{}}}{}", start, end, text);
    }
    Ok(output)
}
