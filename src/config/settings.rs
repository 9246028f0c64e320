//! Harness settings

use crate::core::badge::{BadgeReporter, DEFAULT_LABEL};
use crate::core::reader::{ReaderConfig, DEFAULT_START_COMMAND, DEFAULT_TERMINATION_MARKER};
use crate::core::transport::SerialConfig;
use crate::core::verifier::PairingMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        /// Config path
        path: PathBuf,
        /// TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A setting has an unusable value
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Device link
    pub device: DeviceSettings,
    /// Read loop and verification
    pub run: RunSettings,
    /// Expectation table
    pub expectations: ExpectationSettings,
    /// Badge output
    pub badges: BadgeSettings,
}

/// Device link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Serial port name
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Wait after opening the port before starting the run
    pub reset_delay_ms: u64,
    /// Per-read timeout
    pub read_timeout_ms: u64,
    /// Sent once to start the on-device tests
    pub start_command: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: 115_200,
            reset_delay_ms: 2000,
            read_timeout_ms: 1000,
            start_command: DEFAULT_START_COMMAND.to_string(),
        }
    }
}

fn default_port() -> &'static str {
    if cfg!(windows) {
        "COM3"
    } else {
        "/dev/ttyACM0"
    }
}

/// Read loop and verification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Line prefix the firmware prints when done
    pub termination_marker: String,
    /// Give up after this many seconds (unset = wait forever)
    pub max_duration_secs: Option<u64>,
    /// Result pairing strategy
    pub pairing: PairingMode,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            termination_marker: DEFAULT_TERMINATION_MARKER.to_string(),
            max_duration_secs: None,
            pairing: PairingMode::default(),
        }
    }
}

/// Expectation table settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectationSettings {
    /// CSV file with a header row
    pub path: PathBuf,
}

impl Default for ExpectationSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("expected_results.csv"),
        }
    }
}

/// Badge output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeSettings {
    /// Directory receiving the badge JSON files
    pub output_dir: PathBuf,
    /// Label of the aggregate badges
    pub label: String,
}

impl Default for BadgeSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("badges"),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the default config file, falling back to defaults if absent
    pub fn load_default() -> Result<Self, ConfigError> {
        match super::default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse TOML content
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject settings the harness cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.port.trim().is_empty() {
            return Err(ConfigError::Invalid("device.port is empty".into()));
        }
        if self.device.baud_rate == 0 {
            return Err(ConfigError::Invalid("device.baud_rate must be non-zero".into()));
        }
        if self.device.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "device.read_timeout_ms must be non-zero".into(),
            ));
        }
        if self.device.start_command.is_empty() {
            return Err(ConfigError::Invalid("device.start_command is empty".into()));
        }
        if self.run.termination_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("run.termination_marker is empty".into()));
        }
        Ok(())
    }

    /// Serial link settings
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(&self.device.port, self.device.baud_rate)
            .read_timeout(Duration::from_millis(self.device.read_timeout_ms))
    }

    /// Read loop settings
    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            termination_marker: self.run.termination_marker.trim().to_string(),
            start_command: self.device.start_command.clone(),
            settle_delay: Duration::from_millis(self.device.reset_delay_ms),
            max_duration: self.run.max_duration_secs.map(Duration::from_secs),
        }
    }

    /// Badge writer for the configured directory
    pub fn badge_reporter(&self) -> BadgeReporter {
        BadgeReporter::new(&self.badges.output_dir, &self.badges.label)
    }
}
