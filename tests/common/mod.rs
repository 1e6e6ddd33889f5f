/*!
 * Common test utilities for the subkit test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use subkit::{FrameRate, Mode, Position, SubtitleDocument, SubtitleEvent};

pub const SRT_SAMPLE: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

pub const ASS_SAMPLE: &str = "[Script Info]
Title: Test
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize
Style: Default,Arial,20

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0000,0000,0000,,This is a test subtitle.
Dialogue: 0,0:00:05.00,0:00:09.00,Default,,0000,0000,0000,,It contains\\Nmultiple entries.
";

pub const SSA_SAMPLE: &str = "[Script Info]
ScriptType: v4.00

[Events]
Format: Marked, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: Marked=0,0:00:01.00,0:00:04.00,Default,,0000,0000,0000,,This is a test subtitle.
";

pub const MPSUB_FRAME_SAMPLE: &str = "TITLE=Test
FORMAT=25

25 75
This is a test subtitle.

25 100
It contains multiple entries.

";

pub const MICRODVD_SAMPLE: &str = "{1}{1}25
{25}{100}This is a test subtitle.
{125}{225}It contains|multiple entries.
";

pub const VTT_SAMPLE: &str = "WEBVTT

00:00:01.000 --> 00:00:04.000
This is a test subtitle.

second
00:00:05.000 --> 00:00:09.000 align:end
It contains multiple entries.
";

/// Route library log output through env_logger for the test run
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample SubRip file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SRT_SAMPLE)
}

/// A time event spanning `start_ms..end_ms`
pub fn time_event(start_ms: u64, end_ms: u64, text: &str) -> SubtitleEvent {
    SubtitleEvent::new(
        Position::Time(Duration::from_millis(start_ms)),
        Position::Time(Duration::from_millis(end_ms)),
        text,
    )
}

/// A frame event spanning `start..end`
pub fn frame_event(start: u64, end: u64, text: &str) -> SubtitleEvent {
    SubtitleEvent::new(Position::Frame(start), Position::Frame(end), text)
}

/// Three events in time mode with multi-line text
pub fn sample_time_document() -> SubtitleDocument {
    let mut document = SubtitleDocument::new(Mode::Time);
    document.events = vec![
        time_event(1000, 4000, "First subtitle"),
        time_event(4000, 9500, "Second subtitle\nwith two lines"),
        time_event(12_340, 15_000, "Third subtitle"),
    ];
    document
}

/// Three events in frame mode at 25 fps
pub fn sample_frame_document() -> SubtitleDocument {
    let mut document = SubtitleDocument::new(Mode::Frame);
    document.frame_rate = Some(FrameRate::integer(25).expect("valid rate"));
    document.events = vec![
        frame_event(25, 100, "First subtitle"),
        frame_event(100, 238, "Second subtitle\nwith two lines"),
        frame_event(300, 375, "Third subtitle"),
    ];
    document
}
