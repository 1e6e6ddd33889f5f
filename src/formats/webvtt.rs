/*!
 * WebVTT (`.vtt`) grammar.
 *
 * The file starts with a `WEBVTT` signature block. `STYLE` and `REGION` blocks
 * are kept as header lines, `NOTE` blocks are dropped. A cue is an optional
 * identifier line, a timing line `[HH:]MM:SS.mmm --> [HH:]MM:SS.mmm [settings]`
 * and its text. Identifiers and settings become the `Identifier` and
 * `Settings` auxiliary fields.
 */

use std::fmt::Write as _;
use std::time::Duration;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::subrip::{blocks, Block};
use super::{report_dropped_fields, EventCollector, FormatKind, ParseOptions, Parsed, WriteOptions};
use crate::document::{Header, SubtitleDocument, SubtitleEvent};
use crate::errors::{Result, SubtitleError};
use crate::timing::{clock_parts, parse_clock, round_to_unit, Mode, Position};

pub const EVENT_FIELDS: &[&str] = &["Start", "End", "Text"];

const SIGNATURE: &str = "WEBVTT";
const IDENTIFIER: &str = "Identifier";
const SETTINGS: &str = "Settings";
const HEADER_BLOCKS: &[&str] = &["STYLE", "REGION"];

// @const: WebVTT cue timing line regex
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+-->\s+(\S+)(?:\s+(.*?))?\s*$").expect("Invalid WebVTT timing regex")
});

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm`
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.matches(':').count() == 1 {
        parse_clock(&format!("00:{}", value), '.', 3)
    } else {
        parse_clock(value, '.', 3)
    }
}

/// Format `HH:MM:SS.mmm`, rounding to the nearest millisecond
pub fn format_timestamp(time: Duration) -> String {
    let (h, m, s, nanos) = clock_parts(round_to_unit(time, 1_000_000));
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, nanos / 1_000_000)
}

fn first_word<'a>(block: &Block<'a>) -> &'a str {
    block
        .lines
        .first()
        .and_then(|line| line.split_whitespace().next())
        .unwrap_or_default()
}

fn parse_cue(block: &Block<'_>, event_index: usize) -> Result<SubtitleEvent> {
    let (identifier, timing_index) = match block.lines.first() {
        Some(line) if !line.contains("-->") => (Some(*line), 1),
        _ => (None, 0),
    };
    let timing_line = block.lines.get(timing_index).copied().unwrap_or_default();
    let caps = TIMING_REGEX
        .captures(timing_line)
        .ok_or_else(|| SubtitleError::TimecodeParse {
            event_index,
            value: timing_line.trim().to_string(),
        })?;
    let timestamp = |index: usize| -> Result<Position> {
        let value = &caps[index];
        parse_timestamp(value)
            .map(Position::Time)
            .ok_or_else(|| SubtitleError::TimecodeParse {
                event_index,
                value: value.to_string(),
            })
    };

    let text = block.lines[timing_index + 1..].join("\n");
    let mut event = SubtitleEvent::new(timestamp(1)?, timestamp(2)?, text);
    if let Some(identifier) = identifier {
        event.extra.insert(IDENTIFIER.to_string(), identifier.to_string());
    }
    if let Some(settings) = caps.get(3).filter(|m| !m.as_str().is_empty()) {
        event.extra.insert(SETTINGS.to_string(), settings.as_str().to_string());
    }
    Ok(event)
}

pub(crate) fn parse(content: &str, options: &ParseOptions) -> Result<Parsed> {
    let blocks = blocks(content);
    let Some(signature) = blocks.first().filter(|block| block.lines[0].starts_with(SIGNATURE)) else {
        return Err(SubtitleError::HeaderParse {
            line: 1,
            message: format!("missing {} signature", SIGNATURE),
        });
    };

    let mut header = Header::new(FormatKind::WebVtt);
    header.lines.extend(signature.lines.iter().map(|line| line.to_string()));

    let mut collector = EventCollector::new(options.malformed, Mode::Time);
    for block in &blocks[1..] {
        match first_word(block) {
            "NOTE" => debug!("Skipping WebVTT comment at line {}", block.line),
            word if HEADER_BLOCKS.contains(&word) && collector.index() == 0 => {
                header.lines.push(String::new());
                header.lines.extend(block.lines.iter().map(|line| line.to_string()));
            }
            _ => {
                let event = parse_cue(block, collector.index());
                collector.collect(block.line, event)?;
            }
        }
    }
    let (events, warnings) = collector.finish();

    Ok(Parsed {
        document: SubtitleDocument {
            header,
            mode: Mode::Time,
            frame_rate: None,
            events,
        },
        warnings,
    })
}

pub(crate) fn write(document: &SubtitleDocument, options: &WriteOptions) -> Result<String> {
    report_dropped_fields(document, FormatKind::WebVtt, &[IDENTIFIER, SETTINGS], options);

    let mut output = if document.header.source_format == Some(FormatKind::WebVtt) && !document.header.lines.is_empty() {
        document.header.lines.join("\n")
    } else {
        SIGNATURE.to_string()
    };
    output.push_str("\n\n");

    for (index, event) in document.events.iter().enumerate() {
        let (Position::Time(start), Position::Time(end)) = (event.start, event.end) else {
            return Err(SubtitleError::ModeMismatch { event_index: index });
        };
        if let Some(identifier) = event.extra(IDENTIFIER) {
            let _ = writeln!(output, "{}", identifier);
        }
        let _ = write!(output, "{} --> {}", format_timestamp(start), format_timestamp(end));
        if let Some(settings) = event.extra(SETTINGS) {
            let _ = write!(output, " {}", settings);
        }
        let _ = write!(output, "\n{}\n\n", options.text_of(event));
    }
    Ok(output)
}
