/*!
 * Format registry and format-independent parse/write entry points.
 *
 * Every supported format has one immutable `FormatDescriptor`, built once on
 * first use and shared read-only afterwards. Descriptors are kept in probing
 * priority order: a stricter format always comes before the general format it
 * refines, so Advanced SubStation-Alpha (`ScriptType: v4.00+`) is tried before
 * SubStation-Alpha (`ScriptType: v4.00`), whose identifier also matches it.
 *
 * # Architecture
 *
 * - `subrip`: SubRip (`.srt`)
 * - `ssa`: SubStation-Alpha and Advanced SubStation-Alpha, one grammar
 *   parameterized by the fixed event schema of each
 * - `mpsub`: MPsub, with header-driven TIME/FRAME mode
 * - `microdvd`: MicroDVD, frame based
 * - `webvtt`: WebVTT
 */

pub mod microdvd;
pub mod mpsub;
pub mod ssa;
pub mod subrip;
pub mod webvtt;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::{SubtitleDocument, SubtitleEvent};
use crate::errors::{Result, SubtitleError};
use crate::timing::Mode;

/// Number of bytes of content probed by `identify_format`
pub const IDENTIFY_PREFIX_BYTES: usize = 64 * 1024;

/// Closed set of supported formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormatKind {
    #[serde(rename = "ass")]
    AdvSubStationAlpha,
    #[serde(rename = "ssa")]
    SubStationAlpha,
    #[serde(rename = "mpsub")]
    MPsub,
    #[serde(rename = "webvtt")]
    WebVtt,
    #[serde(rename = "microdvd")]
    MicroDvd,
    #[default]
    #[serde(rename = "subrip")]
    SubRip,
}

impl FormatKind {
    /// All formats in identification priority order
    pub const ALL: [FormatKind; 6] = [
        FormatKind::AdvSubStationAlpha,
        FormatKind::SubStationAlpha,
        FormatKind::MPsub,
        FormatKind::WebVtt,
        FormatKind::MicroDvd,
        FormatKind::SubRip,
    ];

    fn priority(self) -> usize {
        match self {
            FormatKind::AdvSubStationAlpha => 0,
            FormatKind::SubStationAlpha => 1,
            FormatKind::MPsub => 2,
            FormatKind::WebVtt => 3,
            FormatKind::MicroDvd => 4,
            FormatKind::SubRip => 5,
        }
    }

    /// Short lowercase identifier used in configuration and on the command line
    pub fn id(self) -> &'static str {
        match self {
            FormatKind::AdvSubStationAlpha => "ass",
            FormatKind::SubStationAlpha => "ssa",
            FormatKind::MPsub => "mpsub",
            FormatKind::WebVtt => "webvtt",
            FormatKind::MicroDvd => "microdvd",
            FormatKind::SubRip => "subrip",
        }
    }

    pub fn descriptor(self) -> &'static FormatDescriptor {
        &FORMATS[self.priority()]
    }

    /// Format conventionally stored under `extension`, with or without the
    /// leading dot. Shared extensions resolve in priority order (`.sub` is MPsub).
    pub fn from_extension(extension: &str) -> Option<FormatKind> {
        let extension = extension.trim_start_matches('.');
        FORMATS
            .iter()
            .find(|descriptor| descriptor.extension[1..].eq_ignore_ascii_case(extension))
            .map(|descriptor| descriptor.kind)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for FormatKind {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ass" | "advsubstationalpha" => Ok(FormatKind::AdvSubStationAlpha),
            "ssa" | "substationalpha" => Ok(FormatKind::SubStationAlpha),
            "mpsub" => Ok(FormatKind::MPsub),
            "webvtt" | "vtt" => Ok(FormatKind::WebVtt),
            "microdvd" => Ok(FormatKind::MicroDvd),
            "subrip" | "srt" => Ok(FormatKind::SubRip),
            _ => Err(SubtitleError::UnknownFormat),
        }
    }
}

/// Static description of one file format
#[derive(Debug)]
pub struct FormatDescriptor {
    pub kind: FormatKind,
    /// Human readable name
    pub name: &'static str,
    /// Conventional file extension, with the leading dot
    pub extension: &'static str,
    /// Content-sniffing pattern matched against a prefix of the content
    pub identifier: Regex,
    /// Fixed, ordered event field schema
    pub event_fields: &'static [&'static str],
    /// Position modes the format can express
    pub modes: &'static [Mode],
}

impl FormatDescriptor {
    pub fn supports_mode(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn matches(&self, content: &str) -> bool {
        self.identifier.is_match(content)
    }
}

fn descriptor(
    kind: FormatKind,
    name: &'static str,
    extension: &'static str,
    identifier: &str,
    event_fields: &'static [&'static str],
    modes: &'static [Mode],
) -> FormatDescriptor {
    FormatDescriptor {
        kind,
        name,
        extension,
        identifier: Regex::new(identifier).expect("Invalid format identifier regex"),
        event_fields,
        modes,
    }
}

/// Format descriptors in identification priority order
static FORMATS: Lazy<Vec<FormatDescriptor>> = Lazy::new(|| {
    vec![
        descriptor(
            FormatKind::AdvSubStationAlpha,
            "Advanced Sub Station Alpha",
            ".ass",
            r"(?m)^ScriptType:\s+[vV]4\.00\+\s*$",
            ssa::ASS_EVENT_FIELDS,
            &[Mode::Time],
        ),
        descriptor(
            FormatKind::SubStationAlpha,
            "Sub Station Alpha",
            ".ssa",
            r"(?m)^ScriptType:\s+[vV]4\.00",
            ssa::SSA_EVENT_FIELDS,
            &[Mode::Time],
        ),
        descriptor(
            FormatKind::MPsub,
            "MPsub",
            ".sub",
            r"(?m)^FORMAT=(TIME|[\d.]+)\s*$",
            mpsub::EVENT_FIELDS,
            &[Mode::Time, Mode::Frame],
        ),
        descriptor(
            FormatKind::WebVtt,
            "WebVTT",
            ".vtt",
            r"\A\x{FEFF}?WEBVTT",
            webvtt::EVENT_FIELDS,
            &[Mode::Time],
        ),
        descriptor(
            FormatKind::MicroDvd,
            "MicroDVD",
            ".sub",
            r"(?m)^\{-?\d+\}\{-?\d+\}",
            microdvd::EVENT_FIELDS,
            &[Mode::Frame],
        ),
        descriptor(
            FormatKind::SubRip,
            "SubRip",
            ".srt",
            r"(?m)^\d+:\d{2}:\d{2},\d{3}\s+-->\s+\d+:\d{2}:\d{2},\d{3}",
            subrip::EVENT_FIELDS,
            &[Mode::Time],
        ),
    ]
});

/// All descriptors in identification priority order
pub fn descriptors() -> &'static [FormatDescriptor] {
    &FORMATS
}

/// Pick the first format whose identifier matches a bounded prefix of `content`
pub fn identify_format(content: &str) -> Result<&'static FormatDescriptor> {
    let mut end = content.len().min(IDENTIFY_PREFIX_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let prefix = &content[..end];

    let found = FORMATS.iter().find(|descriptor| descriptor.matches(prefix));
    match found {
        Some(descriptor) => {
            debug!("Identified content as {}", descriptor.name);
            Ok(descriptor)
        }
        None => Err(SubtitleError::UnknownFormat),
    }
}

/// What to do with an event that cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the whole parse
    #[default]
    Abort,
    /// Drop the event and record a warning
    Skip,
}

/// Options for `parse`
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Encoding the caller decoded the content from, recorded in the header
    pub encoding: Option<String>,
    pub malformed: MalformedPolicy,
}

/// An event dropped under `MalformedPolicy::Skip`
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    /// Zero-based index of the event in the input
    pub event_index: usize,
    /// One-based line the event starts on
    pub line: usize,
    pub error: SubtitleError,
}

/// Result of a successful parse
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: SubtitleDocument,
    pub warnings: Vec<ParseWarning>,
}

/// Line terminator used on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Newline {
    #[default]
    Unix,
    Windows,
    Mac,
}

impl Newline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Unix => "\n",
            Newline::Windows => "\r\n",
            Newline::Mac => "\r",
        }
    }
}

/// Which text of each event to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextField {
    #[default]
    Main,
    Translation,
}

/// Options for `write`
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub newline: Newline,
    pub text: TextField,
}

impl WriteOptions {
    pub(crate) fn text_of<'a>(&self, event: &'a SubtitleEvent) -> &'a str {
        match self.text {
            TextField::Main => &event.text,
            TextField::Translation => event.translation.as_deref().unwrap_or(""),
        }
    }
}

/// Collects parsed events, applying the malformed-event policy and the
/// document invariants to each one
pub(crate) struct EventCollector {
    policy: MalformedPolicy,
    mode: Mode,
    index: usize,
    events: Vec<SubtitleEvent>,
    warnings: Vec<ParseWarning>,
}

impl EventCollector {
    pub(crate) fn new(policy: MalformedPolicy, mode: Mode) -> Self {
        Self {
            policy,
            mode,
            index: 0,
            events: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Index of the event currently being parsed
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Accept or reject the next event; returns whether it was kept
    pub(crate) fn collect(&mut self, line: usize, result: Result<SubtitleEvent>) -> Result<bool> {
        let event_index = self.index;
        self.index += 1;
        let result = result.and_then(|event| event.validate(self.mode, event_index).map(|_| event));
        match result {
            Ok(event) => {
                self.events.push(event);
                Ok(true)
            }
            Err(error) if self.policy == MalformedPolicy::Skip => {
                warn!("Skipping invalid subtitle event {} at line {}: {}", event_index, line, error);
                self.warnings.push(ParseWarning {
                    event_index,
                    line,
                    error,
                });
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    pub(crate) fn finish(self) -> (Vec<SubtitleEvent>, Vec<ParseWarning>) {
        (self.events, self.warnings)
    }
}

/// Name under which an unwritten translation text is reported
const TRANSLATION_FIELD: &str = "Translation";

/// Log once per write the auxiliary fields `format` has no place for,
/// including translation texts left out when writing the main text.
/// Returns the names reported.
pub(crate) fn report_dropped_fields<'a>(
    document: &'a SubtitleDocument,
    format: FormatKind,
    kept: &[&str],
    options: &WriteOptions,
) -> Vec<&'a str> {
    let mut dropped: BTreeSet<&str> = document
        .events
        .iter()
        .flat_map(|event| event.extra.keys())
        .map(String::as_str)
        .filter(|key| !kept.contains(key))
        .collect();
    if options.text == TextField::Main && document.events.iter().any(|event| event.translation.is_some()) {
        dropped.insert(TRANSLATION_FIELD);
    }
    let dropped: Vec<&str> = dropped.into_iter().collect();
    if !dropped.is_empty() {
        warn!(
            "Dropping auxiliary fields not expressible in {}: {}",
            format,
            dropped.join(", ")
        );
    }
    dropped
}

/// Reject event text that `format` would read back differently
fn check_text(format: FormatKind, event_index: usize, text: &str) -> Result<()> {
    let problem = match format {
        FormatKind::SubRip | FormatKind::MPsub | FormatKind::WebVtt => {
            let blank_line = !text.is_empty() && text.split('\n').any(|line| line.trim().is_empty());
            blank_line.then_some("a blank line")
        }
        FormatKind::MicroDvd => text.contains(microdvd::LINE_SEPARATOR).then_some("a literal '|'"),
        FormatKind::SubStationAlpha | FormatKind::AdvSubStationAlpha => {
            text.contains(ssa::LINE_BREAK).then_some("a literal '\\N'")
        }
    };
    match problem {
        Some(problem) => Err(SubtitleError::Unsupported(format!(
            "{} cannot hold {} in the text of event {}",
            format.descriptor().name,
            problem,
            event_index
        ))),
        None => Ok(()),
    }
}

/// Strip a byte-order mark and normalize every line terminator to `\n`
fn normalize_newlines(content: &str) -> String {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Parse `content` as `format`
pub fn parse(content: &str, format: FormatKind, options: &ParseOptions) -> Result<Parsed> {
    let content = normalize_newlines(content);
    let mut parsed = match format {
        FormatKind::SubRip => subrip::parse(&content, options),
        FormatKind::SubStationAlpha | FormatKind::AdvSubStationAlpha => ssa::parse(&content, format, options),
        FormatKind::MPsub => mpsub::parse(&content, options),
        FormatKind::MicroDvd => microdvd::parse(&content, options),
        FormatKind::WebVtt => webvtt::parse(&content, options),
    }?;
    parsed.document.header.source_format = Some(format);
    parsed.document.header.encoding = options.encoding.clone();
    debug!(
        "Parsed {} {} events ({} skipped)",
        parsed.document.len(),
        format,
        parsed.warnings.len()
    );
    Ok(parsed)
}

/// Identify the format of `content` and parse it
pub fn parse_auto(content: &str, options: &ParseOptions) -> Result<Parsed> {
    let descriptor = identify_format(content)?;
    parse(content, descriptor.kind, options)
}

/// Serialize `document` as `format`
pub fn write(document: &SubtitleDocument, format: FormatKind, options: &WriteOptions) -> Result<String> {
    let descriptor = format.descriptor();
    if !descriptor.supports_mode(document.mode) {
        return Err(SubtitleError::Unsupported(format!(
            "{} cannot express {} mode positions",
            descriptor.name, document.mode
        )));
    }
    document.validate()?;
    document
        .events
        .iter()
        .enumerate()
        .try_for_each(|(index, event)| check_text(format, index, options.text_of(event)))?;

    let output = match format {
        FormatKind::SubRip => subrip::write(document, options),
        FormatKind::SubStationAlpha | FormatKind::AdvSubStationAlpha => ssa::write(document, format, options),
        FormatKind::MPsub => mpsub::write(document, options),
        FormatKind::MicroDvd => microdvd::write(document, options),
        FormatKind::WebVtt => webvtt::write(document, options),
    }?;

    match options.newline {
        Newline::Unix => Ok(output),
        newline => Ok(output.replace('\n', newline.as_str())),
    }
}
