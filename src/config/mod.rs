//! Configuration management for Zeitgeist.
//!
//! Configuration is read from `~/.config/zeitgeist/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::api::ApiConfig;
use crate::index::IndexConfig;
use crate::thumbnail::ThumbnailConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub items: IndexConfig,
    pub thumbnails: ThumbnailConfig,
}

impl Config {
    /// Load configuration from the default path, creating it on first run.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load configuration from `path`. A missing file is created with the
    /// commented defaults; missing fields fall back to their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/zeitgeist/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("zeitgeist").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, Self::default_config_content()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn default_config_content() -> String {
        format!(
            r##"# Zeitgeist Configuration

[api]
# Base URL of the Zeitgeist instance
base_url = "http://localhost:4567"

# Timeout in seconds for listings, tag updates and thumbnail downloads
timeout_secs = 10

# User agent sent with every request
user_agent = "zeitgeist/{version}"

[items]
# Leave videos out of the item list
hide_videos = true

# Leave images out of the item list
hide_images = false

# Snapshot used to start with the items of the last session
# snapshot_path = "/path/to/items.json"

[thumbnails]
# Thumbnails kept in memory
memory_capacity = 150

# Thumbnails resolved at the same time
workers = 8

# JPEG quality of the disk cache (1-100)
jpeg_quality = 90

# Load thumbnails of new items before they are shown
prefetch = true

# Disk cache directory
# cache_dir = "/path/to/thumbnails"

# PNG drawn over the top-left corner of video thumbnails
# video_overlay = "/path/to/overlay.png"
"##,
            version = env!("CARGO_PKG_VERSION")
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
