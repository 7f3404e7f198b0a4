// User settings
// Loaded from <config dir>/wsgrid/settings.toml; a missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SizingConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pixel constants for auto-size.
    pub sizing: SizingConfig,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Directory for the log file; the platform data dir when unset.
    pub log_dir: Option<PathBuf>,
    /// Use the platform clipboard instead of an in-process one.
    pub use_system_clipboard: bool,
    /// Grid size of a fresh worksheet.
    pub default_rows: usize,
    pub default_columns: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sizing: SizingConfig::default(),
            log_filter: "wsgrid=info".to_string(),
            log_dir: None,
            use_system_clipboard: true,
            default_rows: 50,
            default_columns: 10,
        }
    }
}

impl Settings {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "wsgrid")
    }

    /// Default settings file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads settings from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Where the log file goes.
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_local_dir().to_path_buf()))
    }
}
