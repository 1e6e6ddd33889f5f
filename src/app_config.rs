use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::formats::{FormatKind, MalformedPolicy, Newline, ParseOptions, TextField, WriteOptions};
use crate::segmentation;
use crate::timing::FrameRate;

// @module: Application configuration, including loading, validating and saving

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "subkit.json";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Script identifier used for segmentation
    #[serde(default = "default_script")]
    pub default_script: String,

    /// Output format when none is requested
    #[serde(default)]
    pub default_format: FormatKind,

    /// Line terminator written to output files
    #[serde(default)]
    pub newline: Newline,

    /// Encoding input files are declared to be in
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// What to do with events that fail to parse
    #[serde(default)]
    pub malformed_events: MalformedPolicy,

    /// Frame rate used when converting between time and frame mode
    #[serde(default = "default_framerate")]
    pub framerate: FrameRate,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_script() -> String {
    "latin".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_framerate() -> FrameRate {
    FrameRate::FPS_23_976
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration, or create and save the default one if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        segmentation::rules(&self.default_script)
            .map_err(|e| anyhow!("Invalid default_script: {}", e))?;

        if self.encoding.trim().is_empty() {
            return Err(anyhow!("Encoding must not be empty"));
        }

        Ok(())
    }

    pub fn to_parse_options(&self) -> ParseOptions {
        ParseOptions {
            encoding: Some(self.encoding.clone()),
            malformed: self.malformed_events,
        }
    }

    pub fn to_write_options(&self) -> WriteOptions {
        WriteOptions {
            newline: self.newline,
            text: TextField::Main,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            default_script: default_script(),
            default_format: FormatKind::default(),
            newline: Newline::default(),
            encoding: default_encoding(),
            malformed_events: MalformedPolicy::default(),
            framerate: default_framerate(),
            log_level: LogLevel::default(),
        }
    }
}
