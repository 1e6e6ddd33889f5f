/*!
 * Format-independent subtitle document model.
 *
 * A `SubtitleDocument` owns an ordered list of events, the header metadata
 * read from (or to be written to) its file, and the position mode shared by
 * all events. Auxiliary fields that only some formats understand (layer,
 * style, margins, cue settings, ...) travel with each event as opaque
 * key/value pairs so that a document re-written in its own format loses
 * nothing.
 */

use std::collections::BTreeMap;

use log::debug;

use crate::errors::{Result, SubtitleError};
use crate::formats::FormatKind;
use crate::timing::{FrameRate, Mode, Offset, Position};

/// A single timed subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEvent {
    /// Start position
    pub start: Position,

    /// End position
    pub end: Position,

    /// Primary text; lines are separated by `\n`
    pub text: String,

    /// Secondary (translation) text
    pub translation: Option<String>,

    /// Format-specific auxiliary fields, preserved opaquely
    pub extra: BTreeMap<String, String>,
}

impl SubtitleEvent {
    pub fn new(start: Position, end: Position, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            translation: None,
            extra: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach an auxiliary field
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    /// Check the event against a mode and the start <= end invariant
    pub fn validate(&self, mode: Mode, event_index: usize) -> Result<()> {
        if self.start.mode() != mode || self.end.mode() != mode {
            return Err(SubtitleError::ModeMismatch { event_index });
        }
        if self.end < self.start {
            return Err(SubtitleError::InvalidTimeRange { event_index });
        }
        Ok(())
    }
}

/// Format-specific document metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Format the header lines below were read from
    pub source_format: Option<FormatKind>,

    /// Header lines verbatim, without line terminators
    pub lines: Vec<String>,

    /// Lines following the event region (SubStation-Alpha sections after `[Events]`)
    pub trailer: Vec<String>,

    /// Declared script type, e.g. `v4.00+`
    pub script_type: Option<String>,

    /// Event field order declared by the file, when the format declares one
    pub event_fields: Option<Vec<String>>,

    /// Encoding the content was declared to be in
    pub encoding: Option<String>,
}

impl Header {
    pub fn new(source_format: FormatKind) -> Self {
        Self {
            source_format: Some(source_format),
            ..Self::default()
        }
    }

    /// Names of the style definitions found in the header
    pub fn style_names(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix("Style:"))
            .filter_map(|rest| rest.split(',').next())
            .map(str::trim)
            .collect()
    }
}

/// Unified subtitle document
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDocument {
    /// Header metadata
    pub header: Header,

    /// Mode every event position is expressed in
    pub mode: Mode,

    /// Frame rate declared by the file, if any
    pub frame_rate: Option<FrameRate>,

    /// Events in display order
    pub events: Vec<SubtitleEvent>,
}

impl SubtitleDocument {
    /// Create an empty document
    pub fn new(mode: Mode) -> Self {
        Self {
            header: Header::default(),
            mode,
            frame_rate: None,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append an event, rejecting one that breaks the document invariants
    pub fn push_event(&mut self, event: SubtitleEvent) -> Result<()> {
        event.validate(self.mode, self.events.len())?;
        self.events.push(event);
        Ok(())
    }

    /// Insert an event at `index`
    pub fn insert_event(&mut self, index: usize, event: SubtitleEvent) -> Result<()> {
        if index > self.events.len() {
            return Err(SubtitleError::InvalidPosition(format!(
                "cannot insert at {} into {} events",
                index,
                self.events.len()
            )));
        }
        event.validate(self.mode, index)?;
        self.events.insert(index, event);
        Ok(())
    }

    /// Remove and return the event at `index`
    pub fn remove_event(&mut self, index: usize) -> Option<SubtitleEvent> {
        (index < self.events.len()).then(|| self.events.remove(index))
    }

    /// Move the event at `from` so that it ends up at `to`
    pub fn move_event(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.events.len();
        if from >= len || to >= len {
            return Err(SubtitleError::InvalidPosition(format!(
                "cannot move event {} to {} in {} events",
                from, to, len
            )));
        }
        let event = self.events.remove(from);
        self.events.insert(to, event);
        Ok(())
    }

    /// Shift every position by the same offset; nothing changes on failure
    pub fn shift(&mut self, offset: Offset) -> Result<()> {
        let shifted = self
            .events
            .iter()
            .map(|event| {
                Ok(SubtitleEvent {
                    start: event.start.offset(offset)?,
                    end: event.end.offset(offset)?,
                    ..event.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.events = shifted;
        Ok(())
    }

    /// Check the mode and ordering invariant of every event
    pub fn validate(&self) -> Result<()> {
        self.events
            .iter()
            .enumerate()
            .try_for_each(|(index, event)| event.validate(self.mode, index))
    }

    /// Copy the primary texts of `other` into the translation texts of this
    /// document, matching events by index. Returns the number of events updated.
    pub fn merge_translation(&mut self, other: &SubtitleDocument) -> usize {
        if other.len() != self.len() {
            debug!(
                "Merging translation with {} events into document with {} events",
                other.len(),
                self.len()
            );
        }
        let mut merged = 0;
        for (event, source) in self.events.iter_mut().zip(&other.events) {
            event.translation = Some(source.text.clone());
            merged += 1;
        }
        merged
    }

    /// Re-express every position in `target` mode.
    ///
    /// The converted document is built aside and returned whole; the input is
    /// never observed half converted. Converting from TIME to FRAME records
    /// `rate` as the document frame rate; converting to the current mode
    /// leaves positions as they are.
    pub fn convert_mode(&self, target: Mode, rate: FrameRate) -> Result<SubtitleDocument> {
        self.validate()?;
        let events = self
            .events
            .iter()
            .map(|event| {
                Ok(SubtitleEvent {
                    start: event.start.convert(target, rate)?,
                    end: event.end.convert(target, rate)?,
                    ..event.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let frame_rate = match (self.mode, target) {
            (Mode::Time, Mode::Frame) => Some(rate),
            _ => self.frame_rate,
        };
        debug!(
            "Converted {} events from {} to {} mode at {} fps",
            self.len(),
            self.mode,
            target,
            rate
        );
        Ok(SubtitleDocument {
            header: self.header.clone(),
            mode: target,
            frame_rate,
            events,
        })
    }
}

/// Free-function form of `SubtitleDocument::convert_mode`
pub fn convert_mode(document: &SubtitleDocument, target: Mode, rate: FrameRate) -> Result<SubtitleDocument> {
    document.convert_mode(target, rate)
}
