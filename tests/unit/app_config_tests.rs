/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use subkit::app_config::{Config, LogLevel};
use subkit::{FormatKind, FrameRate, MalformedPolicy, Newline, TextField};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.default_script, "latin");
    assert_eq!(config.default_format, FormatKind::SubRip);
    assert_eq!(config.newline, Newline::Unix);
    assert_eq!(config.encoding, "utf-8");
    assert_eq!(config.malformed_events, MalformedPolicy::Abort);
    assert_eq!(config.framerate, FrameRate::FPS_23_976);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Display names are accepted as script identifiers
    config.default_script = "Latin (English)".to_string();
    assert!(config.validate().is_ok());

    config.default_script = "cyrillic".to_string();
    assert!(config.validate().is_err());
    config.default_script = "latin".to_string();

    config.encoding = "  ".to_string();
    assert!(config.validate().is_err());
}

/// Test that a saved configuration loads back unchanged
#[test]
fn test_save_and_load_withCustomValues_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("subkit.json");

    let config = Config {
        default_format: FormatKind::WebVtt,
        newline: Newline::Mac,
        malformed_events: MalformedPolicy::Skip,
        framerate: "24000/1001".parse()?,
        log_level: LogLevel::Trace,
        ..Config::default()
    };
    config.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded, config);

    let json = std::fs::read_to_string(&path)?;
    assert!(json.contains("\"framerate\": \"24000/1001\""));
    assert!(json.contains("\"default_format\": \"webvtt\""));
    Ok(())
}

/// Test that a missing configuration file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("missing.json");

    let config = Config::load_or_create(&path)?;
    assert_eq!(config, Config::default());
    assert!(path.exists());
    Ok(())
}

/// Test that malformed JSON is reported with the file name
#[test]
fn test_load_withInvalidJson_shouldFailWithContext() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ \"newline\": \"dos\" }")?;

    let error = Config::load(&path).unwrap_err();
    assert!(format!("{:#}", error).contains("broken.json"));
    Ok(())
}

/// Test conversion into parse and write options
#[test]
fn test_options_fromConfig_shouldCarrySettings() {
    let config = Config {
        encoding: "windows-1252".to_string(),
        newline: Newline::Windows,
        ..Config::default()
    };
    let parse_options = config.to_parse_options();
    assert_eq!(parse_options.encoding.as_deref(), Some("windows-1252"));
    let write_options = config.to_write_options();
    assert_eq!(write_options.newline, Newline::Windows);
    assert_eq!(write_options.text, TextField::Main);
}
