/*!
 * SubStation-Alpha (`.ssa`) and Advanced SubStation-Alpha (`.ass`) grammar.
 *
 * Both formats share one sectioned layout: everything before `[Events]` is
 * header, the `[Events]` section holds a `Format:` line naming the event
 * fields followed by `Dialogue:`/`Comment:` lines, and any later section is
 * kept verbatim as trailer. The two formats differ only in their fixed event
 * schema, which is passed to the shared parser and writer as a value.
 *
 * All fields other than `Start`, `End` and `Text` are auxiliary and stored
 * under their field name. A `Comment:` line is marked with the `Kind`
 * auxiliary field.
 */

use std::collections::BTreeSet;
use std::time::Duration;

use log::debug;

use super::{report_dropped_fields, EventCollector, FormatKind, ParseOptions, Parsed, WriteOptions};
use crate::document::{Header, SubtitleDocument, SubtitleEvent};
use crate::errors::{Result, SubtitleError};
use crate::timing::{clock_parts, parse_clock, round_to_unit, Mode, Position};

/// Line break escape inside event text
pub(crate) const LINE_BREAK: &str = "\\N";

/// Advanced SubStation-Alpha event schema
pub const ASS_EVENT_FIELDS: &[&str] = &[
    "Layer", "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text",
];

/// SubStation-Alpha event schema
pub const SSA_EVENT_FIELDS: &[&str] = &[
    "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text",
];

/// Auxiliary field marking the line type of an event
pub const KIND: &str = "Kind";

const EVENTS_SECTION: &str = "[Events]";
const DIALOGUE: &str = "Dialogue";
const COMMENT: &str = "Comment";

const ASS_HEADER: &[&str] = &[
    "[Script Info]",
    "ScriptType: v4.00+",
    "",
    "[V4+ Styles]",
    "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding",
    "Style: Default,Arial,20,&H00FFFFFF,&H0300FFFF,&H00000000,&H02000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1",
    "",
];

const SSA_HEADER: &[&str] = &[
    "[Script Info]",
    "ScriptType: v4.00",
    "",
    "[V4 Styles]",
    "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, TertiaryColour, BackColour, Bold, Italic, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, AlphaLevel, Encoding",
    "Style: Default,Arial,18,16777215,65535,65535,-2147483640,-1,0,1,2,2,2,30,30,10,0,0",
    "",
];

/// The fixed event schema of a SubStation-Alpha family format
pub fn event_fields(format: FormatKind) -> &'static [&'static str] {
    match format {
        FormatKind::AdvSubStationAlpha => ASS_EVENT_FIELDS,
        _ => SSA_EVENT_FIELDS,
    }
}

fn default_header(format: FormatKind) -> &'static [&'static str] {
    match format {
        FormatKind::AdvSubStationAlpha => ASS_HEADER,
        _ => SSA_HEADER,
    }
}

/// Parse `H:MM:SS.cc`
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    parse_clock(value, '.', 2)
}

/// Format `H:MM:SS.cc`, rounding to the nearest centisecond
pub fn format_timestamp(time: Duration) -> String {
    let (h, m, s, nanos) = clock_parts(round_to_unit(time, 10_000_000));
    format!("{}:{:02}:{:02}.{:02}", h, m, s, nanos / 10_000_000)
}

/// Check a declared `Format:` line against the fixed schema
fn declared_fields(value: &str, schema: &[&str], line: usize) -> Result<Vec<String>> {
    let fields: Vec<String> = value.split(',').map(|f| f.trim().to_string()).collect();
    if fields.last().map(String::as_str) != Some("Text") {
        return Err(SubtitleError::HeaderParse {
            line,
            message: "event format must end with Text".to_string(),
        });
    }
    if let Some(missing) = schema.iter().find(|name| !fields.iter().any(|f| f == *name)) {
        return Err(SubtitleError::HeaderParse {
            line,
            message: format!("event format lacks the {} field", missing),
        });
    }
    let unique: BTreeSet<&String> = fields.iter().collect();
    if unique.len() != fields.len() {
        return Err(SubtitleError::HeaderParse {
            line,
            message: "event format repeats a field".to_string(),
        });
    }
    Ok(fields)
}

fn parse_event(kind: &str, data: &str, fields: &[String], event_index: usize) -> Result<SubtitleEvent> {
    let values: Vec<&str> = data.splitn(fields.len(), ',').collect();
    if values.len() != fields.len() {
        return Err(SubtitleError::EventSchema {
            event_index,
            expected: fields.len(),
            found: values.len(),
        });
    }

    let mut start = None;
    let mut end = None;
    let mut event = SubtitleEvent::new(Position::Time(Duration::ZERO), Position::Time(Duration::ZERO), "");
    for (name, value) in fields.iter().zip(values) {
        match name.as_str() {
            "Start" | "End" => {
                let time = parse_timestamp(value).ok_or_else(|| SubtitleError::TimecodeParse {
                    event_index,
                    value: value.trim().to_string(),
                })?;
                if name == "Start" {
                    start = Some(time);
                } else {
                    end = Some(time);
                }
            }
            "Text" => event.text = value.replace(LINE_BREAK, "\n"),
            _ => {
                event.extra.insert(name.clone(), value.to_string());
            }
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        event.start = Position::Time(start);
        event.end = Position::Time(end);
    }
    if kind == COMMENT {
        event.extra.insert(KIND.to_string(), COMMENT.to_string());
    }
    Ok(event)
}

enum Section {
    Header,
    Events,
    Trailer,
}

pub(crate) fn parse(content: &str, format: FormatKind, options: &ParseOptions) -> Result<Parsed> {
    let schema = event_fields(format);
    let mut header = Header::new(format);
    let mut fields: Vec<String> = schema.iter().map(|f| f.to_string()).collect();
    let mut collector = EventCollector::new(options.malformed, Mode::Time);
    let mut section = Section::Header;

    for (number, line) in content.lines().enumerate() {
        let line_number = number + 1;
        match section {
            Section::Header => {
                if line.trim().eq_ignore_ascii_case(EVENTS_SECTION) {
                    section = Section::Events;
                    continue;
                }
                if let Some(value) = line.strip_prefix("ScriptType:") {
                    header.script_type = Some(value.trim().to_string());
                }
                header.lines.push(line.to_string());
            }
            Section::Events => {
                let trimmed = line.trim();
                if trimmed.starts_with('[') {
                    section = Section::Trailer;
                    header.trailer.push(line.to_string());
                    continue;
                }
                if trimmed.is_empty() || trimmed.starts_with(';') {
                    continue;
                }
                let Some((key, data)) = line.split_once(':') else {
                    debug!("Ignoring unrecognized line {} in events section", line_number);
                    continue;
                };
                let data = data.trim_start();
                match key.trim() {
                    "Format" => {
                        fields = declared_fields(data, schema, line_number)?;
                        header.event_fields = Some(fields.clone());
                    }
                    kind @ (DIALOGUE | COMMENT) => {
                        let event = parse_event(kind, data, &fields, collector.index());
                        collector.collect(line_number, event)?;
                    }
                    other => debug!("Ignoring '{}' line {} in events section", other, line_number),
                }
            }
            Section::Trailer => header.trailer.push(line.to_string()),
        }
    }

    if matches!(section, Section::Header) {
        return Err(SubtitleError::HeaderParse {
            line: 0,
            message: format!("missing {} section", EVENTS_SECTION),
        });
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

/// Default value written for an auxiliary field the event does not carry
fn default_value(field: &str) -> &'static str {
    match field {
        "Layer" => "0",
        "Style" => "Default",
        "MarginL" | "MarginR" | "MarginV" => "0000",
        _ => "",
    }
}

pub(crate) fn write(document: &SubtitleDocument, format: FormatKind, options: &WriteOptions) -> Result<String> {
    let schema = event_fields(format);
    let same_format = document.header.source_format == Some(format);
    let fields: Vec<String> = match (&document.header.event_fields, same_format) {
        (Some(declared), true) => declared.clone(),
        _ => schema.iter().map(|f| f.to_string()).collect(),
    };

    let mut kept: Vec<&str> = fields.iter().map(String::as_str).collect();
    kept.push(KIND);
    report_dropped_fields(document, format, &kept, options);

    let mut lines: Vec<String> = if same_format {
        document.header.lines.clone()
    } else {
        default_header(format).iter().map(|l| l.to_string()).collect()
    };
    lines.push(EVENTS_SECTION.to_string());
    lines.push(format!("Format: {}", fields.join(", ")));

    for (index, event) in document.events.iter().enumerate() {
        let (Position::Time(start), Position::Time(end)) = (event.start, event.end) else {
            return Err(SubtitleError::ModeMismatch { event_index: index });
        };
        let values: Vec<String> = fields
            .iter()
            .map(|field| match field.as_str() {
                "Start" => format_timestamp(start),
                "End" => format_timestamp(end),
                "Text" => options.text_of(event).replace('\n', LINE_BREAK),
                other => event.extra(other).unwrap_or(default_value(other)).to_string(),
            })
            .collect();
        let kind = event.extra(KIND).unwrap_or(DIALOGUE);
        lines.push(format!("{}: {}", kind, values.join(",")));
    }

    if same_format {
        lines.extend(document.header.trailer.iter().cloned());
    }

    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}
