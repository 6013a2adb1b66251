//! Persistent settings for the disk drag-out features
//!
//! Stored as pretty-printed JSON in `<config dir>/floppy-dragout/config.json`.
//! Missing fields take their defaults, so older files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::floppy::refresh::DEFAULT_DEBOUNCE;
use crate::gesture::DEFAULT_DRAG_THRESHOLD;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragOutConfig {
    /// Pointer travel (logical px, either axis) that turns a press into a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,
    /// Subdirectory of the system temp dir for staged files
    #[serde(default = "default_staging_dir_name")]
    pub staging_dir_name: String,
    /// Used when an entry has no usable file name
    #[serde(default = "default_fallback_file_name")]
    pub fallback_file_name: String,
}

fn default_drag_threshold() -> f64 {
    DEFAULT_DRAG_THRESHOLD
}

fn default_refresh_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_staging_dir_name() -> String {
    "floppy_drag".to_string()
}

fn default_fallback_file_name() -> String {
    "file.bin".to_string()
}

impl Default for DragOutConfig {
    fn default() -> Self {
        Self {
            drag_threshold: default_drag_threshold(),
            refresh_debounce_ms: default_refresh_debounce_ms(),
            staging_dir_name: default_staging_dir_name(),
            fallback_file_name: default_fallback_file_name(),
        }
    }
}

impl DragOutConfig {
    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config directory available")]
    NoConfigDir,
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Get the path to the config JSON
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("floppy-dragout").join("config.json"))
}

/// Load settings, falling back to defaults when the file does not exist
pub fn load(path: &Path) -> Result<DragOutConfig, ConfigError> {
    if !path.exists() {
        return Ok(DragOutConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Save settings to disk
pub fn save(path: &Path, config: &DragOutConfig) -> Result<(), ConfigError> {
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| write_err(std::io::Error::other(e)))?;
    std::fs::write(path, content).map_err(write_err)
}
