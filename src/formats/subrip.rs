/*!
 * SubRip (`.srt`) grammar.
 *
 * Events are blocks separated by blank lines: an optional sequence number, a
 * timing line `HH:MM:SS,mmm --> HH:MM:SS,mmm [coordinates]` and any number of
 * text lines. Sequence numbers are regenerated on write; coordinates are kept
 * as the `Coordinates` auxiliary field.
 */

use std::fmt::Write as _;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{report_dropped_fields, EventCollector, FormatKind, ParseOptions, Parsed, WriteOptions};
use crate::document::{Header, SubtitleDocument, SubtitleEvent};
use crate::errors::{Result, SubtitleError};
use crate::timing::{clock_parts, parse_clock, round_to_unit, Mode, Position};

pub const EVENT_FIELDS: &[&str] = &["Start", "End", "Text"];

const COORDINATES: &str = "Coordinates";

// @const: SRT timing line regex
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+-->\s+(\S+)(?:\s+(.*?))?\s*$").expect("Invalid SubRip timing regex")
});

/// A run of non-empty lines with the one-based number of its first line
pub(crate) struct Block<'a> {
    pub line: usize,
    pub lines: Vec<&'a str>,
}

/// Split content into blank-line separated blocks
pub(crate) fn blocks(content: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<Block<'_>> = None;
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        current
            .get_or_insert_with(|| Block {
                line: number + 1,
                lines: Vec::new(),
            })
            .lines
            .push(line);
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

/// Parse `HH:MM:SS,mmm`
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    parse_clock(value, ',', 3)
}

/// Format `HH:MM:SS,mmm`, rounding to the nearest millisecond
pub fn format_timestamp(time: Duration) -> String {
    let (h, m, s, nanos) = clock_parts(round_to_unit(time, 1_000_000));
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, nanos / 1_000_000)
}

fn parse_event(block: &Block<'_>, event_index: usize) -> Result<SubtitleEvent> {
    let mut lines = block.lines.iter().copied();
    let first = lines.next().unwrap_or_default();
    let timing_line = if first.trim().bytes().all(|b| b.is_ascii_digit()) {
        lines.next().unwrap_or_default()
    } else {
        first
    };

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

    let mut event = SubtitleEvent::new(timestamp(1)?, timestamp(2)?, lines.collect::<Vec<_>>().join("\n"));
    if let Some(coordinates) = caps.get(3).filter(|m| !m.as_str().is_empty()) {
        event.extra.insert(COORDINATES.to_string(), coordinates.as_str().to_string());
    }
    Ok(event)
}

pub(crate) fn parse(content: &str, options: &ParseOptions) -> Result<Parsed> {
    let mut collector = EventCollector::new(options.malformed, Mode::Time);
    for block in blocks(content) {
        let event = parse_event(&block, collector.index());
        collector.collect(block.line, event)?;
    }
    let (events, warnings) = collector.finish();

    Ok(Parsed {
        document: SubtitleDocument {
            header: Header::new(FormatKind::SubRip),
            mode: Mode::Time,
            frame_rate: None,
            events,
        },
        warnings,
    })
}

pub(crate) fn write(document: &SubtitleDocument, options: &WriteOptions) -> Result<String> {
    report_dropped_fields(document, FormatKind::SubRip, &[COORDINATES], options);
    let mut output = String::new();
    for (index, event) in document.events.iter().enumerate() {
        let (Position::Time(start), Position::Time(end)) = (event.start, event.end) else {
            return Err(SubtitleError::ModeMismatch { event_index: index });
        };
        let _ = write!(output, "{}\n{} --> {}", index + 1, format_timestamp(start), format_timestamp(end));
        if let Some(coordinates) = event.extra(COORDINATES) {
            let _ = write!(output, " {}", coordinates);
        }
        let _ = write!(output, "\n{}\n\n", options.text_of(event));
    }
    Ok(output)
}
