/*!
 * # subkit - subtitle format engine
 *
 * A Rust library that reads, converts and writes textual subtitle files and
 * segments subtitle text into clauses and speaker turns.
 *
 * ## Features
 *
 * - Content-based format identification with a fixed priority order
 * - Parsing and writing of:
 *   - SubRip (`.srt`)
 *   - SubStation-Alpha (`.ssa`) and Advanced SubStation-Alpha (`.ass`)
 *   - MPsub (`.sub`), in time or frame mode
 *   - MicroDVD (`.sub`)
 *   - WebVTT (`.vtt`)
 * - Exact time/frame conversion with rational frame rates
 * - Script-aware clause and dialogue segmentation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timing`: positions, frame rates and time/frame conversion
 * - `document`: the format-independent subtitle document
 * - `formats`: format registry, identification and the per-format grammars
 * - `segmentation`: per-script clause and dialogue rules
 * - `app_config`: configuration management
 * - `file_utils`: file system operations
 * - `errors`: error types
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod segmentation;
pub mod timing;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{convert_mode, Header, SubtitleDocument, SubtitleEvent};
pub use errors::{AppError, Result, SubtitleError};
pub use formats::{
    identify_format, parse, parse_auto, write, FormatDescriptor, FormatKind, MalformedPolicy, Newline, ParseOptions,
    ParseWarning, Parsed, TextField, WriteOptions,
};
pub use segmentation::{apply_breaks, get_capitalize_after, split_clauses, split_dialogue, Break};
pub use timing::{to_frame, to_time, FrameRate, Mode, Offset, Position};
