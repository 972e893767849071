//! Engine configuration

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix (`ENCORE_QUEUE_SIZE`, `ENCORE_PICKER__MULTIPLIER`, ...)
const ENV_PREFIX: &str = "ENCORE";

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target size of System Queue + User Queue (default: 5)
    pub queue_size: usize,

    /// Maximum history size (default: 18)
    pub max_history_size: usize,

    /// Position sampling interval while playing (default: 500ms)
    pub position_poll_interval_ms: u64,

    /// Next-track picker constants
    pub picker: PickerConfig,
}

/// Constants of the next-track index walk `(multiplier * i + increment) mod N`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Multiplier applied to the seed index (default: 1)
    pub multiplier: u64,

    /// Increment added after multiplying (default: 1)
    pub increment: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_size: 5,
            max_history_size: 18,
            position_poll_interval_ms: 500,
            picker: PickerConfig::default(),
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            multiplier: 1,
            increment: 1,
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables (prefixed with `ENCORE_`, nested keys separated by
    /// `__`) override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(false));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(settings)
    }

    /// Parse configuration from inline TOML
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));

        Self::build(settings)
    }

    fn build(settings: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: Self = settings
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.queue_size == 0 {
            return Err(PlaybackError::Config(
                "queue_size must be at least 1".to_string(),
            ));
        }

        if self.max_history_size == 0 {
            return Err(PlaybackError::Config(
                "max_history_size must be at least 1".to_string(),
            ));
        }

        if self.position_poll_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "position_poll_interval_ms must be at least 1".to_string(),
            ));
        }

        if self.picker.multiplier == 0 {
            return Err(PlaybackError::Config(
                "picker.multiplier must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Position sampling interval
    pub fn position_poll_interval(&self) -> Duration {
        Duration::from_millis(self.position_poll_interval_ms)
    }
}
