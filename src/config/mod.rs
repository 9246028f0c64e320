//! Configuration module
//!
//! Handles harness settings: device link, run limits, expectation table and
//! badge output.

mod settings;

pub use settings::{
    BadgeSettings, ConfigError, DeviceSettings, ExpectationSettings, HarnessConfig, RunSettings,
};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "hiltest", "Hiltest").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
