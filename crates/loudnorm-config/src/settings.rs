//! Settings file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use loudnorm_host::WaitPolicy;

use crate::error::ConfigError;
use crate::paths::ensure_dir;
use crate::validation::validate_settings;

/// Runtime settings for the normalizer.
///
/// Every section and field is optional in the file; missing values take
/// their defaults.
///
/// # TOML Format
///
/// ```toml
/// [wait]
/// interval_ms = 100
/// max_attempts = 51
///
/// [selectors]
/// player = "#movie_player"
/// video = ".html5-main-video"
///
/// [render]
/// sample_rate = 48000
/// block_size = 512
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Polling for host elements and metadata.
    pub wait: WaitSettings,
    /// Selectors for the host elements.
    pub selectors: Selectors,
    /// Offline rendering parameters.
    pub render: RenderSettings,
}

/// `[wait]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WaitSettings {
    /// Delay before each attempt, in milliseconds.
    pub interval_ms: u64,
    /// Attempts before a wait gives up.
    pub max_attempts: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        let policy = WaitPolicy::default();
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            max_attempts: policy.max_attempts,
        }
    }
}

/// `[selectors]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Selectors {
    /// Selector of the player object.
    pub player: String,
    /// Selector of the media element.
    pub video: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            player: "#movie_player".to_string(),
            video: ".html5-main-video".to_string(),
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderSettings {
    /// Sample rate of the processing graph, in Hz.
    pub sample_rate: u32,
    /// Samples per processing block.
    pub block_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load settings from `path`, or the defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(toml_str)?;
        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// The `[wait]` section as a [`WaitPolicy`].
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_millis(self.wait.interval_ms),
            max_attempts: self.wait.max_attempts,
        }
    }

    /// Sample rate as the `f32` the audio graph runs at.
    pub fn sample_rate(&self) -> f32 {
        self.render.sample_rate as f32
    }
}
