//! Configuration loaded from `<config dir>/treeline/config.toml`.
//!
//! Every section and field has a default, so a missing file or a partial
//! file both work:
//!
//! ```toml
//! [engine]
//! target_fps = 30
//!
//! [layout]
//! sidebar_width = 40
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Terminal and main-loop settings.
    pub engine: EngineConfig,
    /// Widget geometry.
    pub layout: LayoutConfig,
    /// File logging.
    pub logging: LoggingConfig,
}

/// Configuration for the [`Engine`](crate::actor::Engine).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target frames per second.
    pub target_fps: u32,
    /// Input poll timeout in milliseconds.
    pub input_poll_ms: u64,
    /// Whether to use alternate screen buffer.
    pub alternate_screen: bool,
    /// Capacity of the deferred update queue.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            input_poll_ms: 10,
            alternate_screen: true,
            queue_capacity: crate::surface::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Input poll timeout.
    pub const fn input_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    /// Time budget of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

/// Widget geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of the navigation tree, in columns.
    pub sidebar_width: u16,
    /// Width of info boxes, in columns.
    pub info_width: u16,
    /// Seconds before an info box closes by itself.
    pub info_timeout_secs: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sidebar_width: 30,
            info_width: 50,
            info_timeout_secs: 3,
        }
    }
}

/// File logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    /// Log directory; defaults to the platform data directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("treeline").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from a specific file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
