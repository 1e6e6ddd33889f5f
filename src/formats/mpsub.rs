/*!
 * MPsub (`.sub`) grammar.
 *
 * The header is a run of `KEY=value` lines. Its `FORMAT` line selects the
 * document mode: `FORMAT=TIME` for seconds, `FORMAT=<fps>` for frames at the
 * given rate. There is no default; a missing or unrecognized value fails.
 *
 * Each event is a block whose first line holds two numbers, the distance
 * from the end of the previous event to the start of this one and the
 * duration of this one, followed by the text lines.
 */

use std::fmt::Write as _;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::subrip::blocks;
use super::{report_dropped_fields, EventCollector, FormatKind, ParseOptions, Parsed, WriteOptions};
use crate::document::{Header, SubtitleDocument, SubtitleEvent};
use crate::errors::{Result, SubtitleError};
use crate::timing::{duration_from_nanos, FrameRate, Mode, Position};

pub const EVENT_FIELDS: &[&str] = &["Start", "End", "Text"];

const FORMAT_KEY: &str = "FORMAT";
const TIME_VALUE: &str = "TIME";
const NANOS_PER_SEC: i128 = 1_000_000_000;

// @const: MPsub event timing line regex
static TIMING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S+)\s+(\S+)\s*$").expect("Invalid MPsub timing regex"));

/// Find the `FORMAT` header line and derive the document mode from it.
///
/// Returns the mode and, in FRAME mode, the declared frame rate.
pub fn parse_header(header: &str) -> Result<(Mode, Option<FrameRate>)> {
    let found = header.lines().enumerate().find_map(|(number, line)| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == FORMAT_KEY).then(|| (number + 1, value.trim()))
    });
    let Some((line, value)) = found else {
        return Err(SubtitleError::HeaderParse {
            line: 0,
            message: "missing FORMAT line".to_string(),
        });
    };

    if value == TIME_VALUE {
        return Ok((Mode::Time, None));
    }
    let looks_numeric = !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    if !looks_numeric {
        return Err(SubtitleError::HeaderParse {
            line,
            message: format!("unrecognized FORMAT value '{}'", value),
        });
    }
    let rate: FrameRate = value.parse().map_err(|error: SubtitleError| SubtitleError::HeaderParse {
        line,
        message: error.to_string(),
    })?;
    Ok((Mode::Frame, Some(rate)))
}

/// Parse signed decimal seconds into nanoseconds, exactly
fn parse_seconds(value: &str) -> Option<i128> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > 9 || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i128 = if fraction.is_empty() {
        0
    } else {
        fraction.parse::<i128>().ok()? * 10i128.pow(9 - fraction.len() as u32)
    };
    let nanos = whole.checked_mul(NANOS_PER_SEC)?.checked_add(fraction)?;
    Some(if negative { -nanos } else { nanos })
}

fn parse_frames(value: &str) -> Option<i128> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Format signed nanoseconds as decimal seconds with trailing zeros trimmed
fn format_seconds(nanos: i128) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let nanos = nanos.abs();
    let whole = nanos / NANOS_PER_SEC;
    let fraction = nanos % NANOS_PER_SEC;
    if fraction == 0 {
        return format!("{}{}", sign, whole);
    }
    let fraction = format!("{:09}", fraction);
    format!("{}{}.{}", sign, whole, fraction.trim_end_matches('0'))
}

fn position_value(position: Position) -> i128 {
    match position {
        Position::Time(time) => time.as_nanos() as i128,
        Position::Frame(frame) => frame as i128,
    }
}

/// `None` when the value is negative or beyond the position range
fn make_position(mode: Mode, value: i128) -> Option<Position> {
    let value = u128::try_from(value).ok()?;
    match mode {
        Mode::Time => duration_from_nanos(value).map(Position::Time),
        Mode::Frame => u64::try_from(value).ok().map(Position::Frame),
    }
}

/// Parse one event block, resolving its relative timing against `previous_end`
fn parse_event(lines: &[&str], mode: Mode, previous_end: &mut i128, event_index: usize) -> Result<SubtitleEvent> {
    let timing_line = lines.first().copied().unwrap_or_default();
    let invalid = |value: &str| SubtitleError::TimecodeParse {
        event_index,
        value: value.trim().to_string(),
    };
    let caps = TIMING_REGEX.captures(timing_line).ok_or_else(|| invalid(timing_line))?;
    let parse_value = |value: &str| match mode {
        Mode::Time => parse_seconds(value),
        Mode::Frame => parse_frames(value),
    };
    let offset = parse_value(&caps[1]).ok_or_else(|| invalid(&caps[1]))?;
    let duration = parse_value(&caps[2]).ok_or_else(|| invalid(&caps[2]))?;

    let start = previous_end.checked_add(offset).ok_or_else(|| invalid(timing_line))?;
    let end = start.checked_add(duration).ok_or_else(|| invalid(timing_line))?;
    *previous_end = end;
    if end < start {
        return Err(SubtitleError::InvalidTimeRange { event_index });
    }
    let start = make_position(mode, start).ok_or_else(|| invalid(timing_line))?;
    let end = make_position(mode, end).ok_or_else(|| invalid(timing_line))?;
    Ok(SubtitleEvent::new(start, end, lines[1..].join("\n")))
}

pub(crate) fn parse(content: &str, options: &ParseOptions) -> Result<Parsed> {
    let blocks = blocks(content);
    let header_blocks = blocks
        .iter()
        .take_while(|block| block.lines.first().is_some_and(|line| line.contains('=')))
        .count();

    let mut header = Header::new(FormatKind::MPsub);
    for block in &blocks[..header_blocks] {
        header.lines.extend(block.lines.iter().map(|line| line.to_string()));
    }
    let (mode, frame_rate) = parse_header(&header.lines.join("\n"))?;
    debug!("MPsub header selects {} mode", mode);

    let mut collector = EventCollector::new(options.malformed, mode);
    let mut previous_end = 0i128;
    for block in &blocks[header_blocks..] {
        let event = parse_event(&block.lines, mode, &mut previous_end, collector.index());
        collector.collect(block.line, event)?;
    }
    let (events, warnings) = collector.finish();

    Ok(Parsed {
        document: SubtitleDocument {
            header,
            mode,
            frame_rate,
            events,
        },
        warnings,
    })
}

fn format_line(document: &SubtitleDocument) -> Result<String> {
    match document.mode {
        Mode::Time => Ok(format!("{}={}", FORMAT_KEY, TIME_VALUE)),
        Mode::Frame => {
            let rate = document.frame_rate.ok_or_else(|| {
                SubtitleError::Unsupported("MPsub frame mode needs a document frame rate".to_string())
            })?;
            let decimal = rate.to_decimal_string().ok_or_else(|| {
                SubtitleError::Unsupported(format!("MPsub cannot declare a frame rate of {}", rate))
            })?;
            Ok(format!("{}={}", FORMAT_KEY, decimal))
        }
    }
}

fn is_format_line(line: &str) -> bool {
    line.split_once('=').is_some_and(|(key, _)| key.trim() == FORMAT_KEY)
}

pub(crate) fn write(document: &SubtitleDocument, options: &WriteOptions) -> Result<String> {
    report_dropped_fields(document, FormatKind::MPsub, &[], options);
    let format = format_line(document)?;

    let mut header: Vec<String> = Vec::new();
    if document.header.source_format == Some(FormatKind::MPsub) {
        header.extend(
            document
                .header
                .lines
                .iter()
                .map(|line| if is_format_line(line) { format.clone() } else { line.clone() }),
        );
    }
    if !header.iter().any(|line| is_format_line(line)) {
        header.push(format);
    }

    let mut output = header.join("\n");
    output.push_str("\n\n");
    let mut previous_end = 0i128;
    for event in &document.events {
        let start = position_value(event.start);
        let end = position_value(event.end);
        let (offset, duration) = (start - previous_end, end - start);
        previous_end = end;
        let (offset, duration) = match document.mode {
            Mode::Time => (format_seconds(offset), format_seconds(duration)),
            Mode::Frame => (offset.to_string(), duration.to_string()),
        };
        let _ = write!(output, "{} {}\n{}\n\n", offset, duration, options.text_of(event));
    }
    Ok(output)
}
