//! Playback configuration
//!
//! Loaded from an optional TOML file, then overridden by `CADENCE_*`
//! environment variables (e.g. `CADENCE_PLAY_MODE=random`).

use crate::error::{PlaybackError, Result};
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::types::PlayMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial play mode (default: loop)
    #[serde(default)]
    pub play_mode: PlayMode,

    /// Seed for random mode; `None` draws from entropy
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Pending commands the playback service buffers (default: 32)
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Events buffered per observer (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::default(),
            random_seed: None,
            command_buffer: default_command_buffer(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from file (if given and present) and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.command_buffer == 0 {
            return Err(PlaybackError::Config(
                "command_buffer must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(PlaybackError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_command_buffer() -> usize {
    32
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}
