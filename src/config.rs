//! Configuration management for lawakfs
//!
//! Runtime parameters come from a `lawak.conf` key/value file:
//!
//! ```text
//! # words replaced in .txt content
//! FILTER_WORDS=bad,ugly
//! SECRET_FILE_BASENAME=diary
//! ACCESS_START=9
//! ACCESS_END=17
//! ```
//!
//! The loaded [`Config`] is immutable for the lifetime of the mount.

use crate::audit::DEFAULT_LOG_PATH;
use crate::error::{Error, Result};
use crate::transform::collides_with_token;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lawak.conf";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Words censored in text files, in match priority order
    pub filter_words: Vec<String>,

    /// Basename (without extension) of the time-gated file; empty disables gating
    pub secret_basename: String,

    /// Hours during which the secret file is visible
    pub access_window: AccessWindow,

    /// Directory whose contents are presented
    pub source_root: PathBuf,

    /// Audit log file
    pub log_path: PathBuf,

    /// Mount configuration
    pub mount: MountConfig,
}

/// Half-open hour range `[start, end)` in local time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessWindow {
    /// First visible hour, 0..=23
    pub start: u8,
    /// First hidden hour after the window, 0..=24
    pub end: u8,
}

impl AccessWindow {
    pub fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Is `hour` inside the window
    pub fn contains(&self, hour: u8) -> bool {
        hour >= self.start && hour < self.end
    }
}

impl Default for AccessWindow {
    fn default() -> Self {
        Self { start: 0, end: 24 }
    }
}

/// Mount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Mount point path
    pub mount_point: PathBuf,

    /// Allow other users to access the mount
    pub allow_other: bool,

    /// Filesystem name shown in the mount table
    pub fs_name: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        MountConfig {
            mount_point: PathBuf::from("/mnt/lawakfs"),
            allow_other: false,
            fs_name: "lawakfs".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            filter_words: Vec::new(),
            secret_basename: String::new(),
            access_window: AccessWindow::default(),
            source_root: PathBuf::from("."),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            mount: MountConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut config = Config::parse(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse `KEY=VALUE` lines on top of the defaults
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Config::default();

        for line in content.lines() {
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "FILTER_WORDS" => {
                    config.filter_words = value
                        .split(',')
                        .map(str::trim)
                        .filter(|w| !w.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "SECRET_FILE_BASENAME" => config.secret_basename = value.to_string(),
                "ACCESS_START" => config.access_window.start = parse_hour("ACCESS_START", value)?,
                "ACCESS_END" => config.access_window.end = parse_hour("ACCESS_END", value)?,
                "LOG_PATH" => config.log_path = PathBuf::from(value),
                other => debug!("ignoring unknown config key {:?}", other),
            }
        }

        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("LAWAKFS_LOG_PATH") {
            let path = path.trim().to_string();
            if !path.is_empty() {
                self.log_path = PathBuf::from(path);
            }
        }

        if let Ok(start) = std::env::var("LAWAKFS_ACCESS_START") {
            if let Ok(hour) = start.trim().parse::<u8>() {
                self.access_window.start = hour;
            }
        }

        if let Ok(end) = std::env::var("LAWAKFS_ACCESS_END") {
            if let Ok(hour) = end.trim().parse::<u8>() {
                self.access_window.end = hour;
            }
        }
    }

    /// Set the source root, canonicalizing it
    pub fn with_source_root<P: AsRef<Path>>(mut self, root: P) -> Result<Self> {
        let root = root.as_ref();
        self.source_root = root
            .canonicalize()
            .map_err(|_| Error::PathNotFound(root.to_string_lossy().to_string()))?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let window = self.access_window;
        if window.start > 23 {
            return Err(Error::InvalidConfig(format!(
                "ACCESS_START must be between 0 and 23, got {}",
                window.start
            )));
        }
        if window.end > 24 {
            return Err(Error::InvalidConfig(format!(
                "ACCESS_END must be between 0 and 24, got {}",
                window.end
            )));
        }
        if window.start >= window.end && !self.secret_basename.is_empty() {
            warn!(
                "access window {:02}-{:02} is empty, {:?} will always be hidden",
                window.start, window.end, self.secret_basename
            );
        }

        // A word matching the token at a boundary makes repeated filtering change output
        if let Some(word) = self.filter_words.iter().find(|w| collides_with_token(w)) {
            return Err(Error::InvalidConfig(format!(
                "filter word {:?} collides with the replacement token",
                word
            )));
        }

        if !self.source_root.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "source root {:?} is not a directory",
                self.source_root
            )));
        }

        Ok(())
    }

    /// Effective configuration as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

fn parse_hour(key: &str, value: &str) -> Result<u8> {
    value
        .parse::<u8>()
        .map_err(|_| Error::InvalidConfig(format!("{} is not an hour: {:?}", key, value)))
}
