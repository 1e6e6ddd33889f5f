/*!
 * Error types for the subkit library.
 *
 * Parsing, writing, mode conversion and segmentation all report failures
 * through `SubtitleError`, defined with the thiserror crate. Positional
 * variants carry the zero-based event index so that a caller can point the
 * user at the offending entry.
 */

use thiserror::Error;

/// Result alias used by every library operation
pub type Result<T> = std::result::Result<T, SubtitleError>;

/// Errors produced by the format engine and the text segmenter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// No format descriptor matched the content
    #[error("Unknown subtitle format: no format identifier matched the content")]
    UnknownFormat,

    /// A format-specific header is missing or invalid
    #[error("Invalid header at line {line}: {message}")]
    HeaderParse {
        /// One-based line number in the input (0 when the header is missing)
        line: usize,
        /// What was wrong with the header
        message: String,
    },

    /// A positional field does not follow the format's numeric grammar
    #[error("Invalid timecode '{value}' in event {event_index}")]
    TimecodeParse {
        /// Zero-based event index
        event_index: usize,
        /// The offending text
        value: String,
    },

    /// An event has the wrong number of fields for the format's schema
    #[error("Event {event_index} has {found} fields, expected {expected}")]
    EventSchema {
        /// Zero-based event index
        event_index: usize,
        /// Number of fields the schema requires
        expected: usize,
        /// Number of fields present
        found: usize,
    },

    /// An event ends before it starts
    #[error("Event {event_index} ends before it starts")]
    InvalidTimeRange {
        /// Zero-based event index
        event_index: usize,
    },

    /// An event position is expressed in a mode other than the document's
    #[error("Event {event_index} is not expressed in the document mode")]
    ModeMismatch {
        /// Zero-based event index
        event_index: usize,
    },

    /// Position arithmetic left the representable range
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// The document cannot be represented in the target format
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// No segmentation rule set exists for the script
    #[error("Unknown script: {0}")]
    UnknownScript(String),

    /// A frame rate of zero or an unparseable frame rate
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(String),
}

impl SubtitleError {
    /// Zero-based index of the event the error refers to, if any
    pub fn event_index(&self) -> Option<usize> {
        match self {
            Self::TimecodeParse { event_index, .. }
            | Self::EventSchema { event_index, .. }
            | Self::InvalidTimeRange { event_index }
            | Self::ModeMismatch { event_index } => Some(*event_index),
            _ => None,
        }
    }
}

/// Application-level error used by the binary and the configuration layer
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the subtitle engine
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}
