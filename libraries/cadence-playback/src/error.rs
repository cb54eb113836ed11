//! Error types for playback orchestration

use crate::types::{EngineOperation, PlayerState};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Operation needs a non-empty queue
    #[error("Queue is empty")]
    EmptyQueue,

    /// Explicit index outside the queue
    #[error("Index {index} out of range for queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Lifecycle operation not valid in the current engine state
    #[error("Cannot {operation} while {from}")]
    IllegalStateTransition {
        from: PlayerState,
        operation: EngineOperation,
    },

    /// Underlying engine reported a failure
    #[error("Engine failure: {0}")]
    EngineFailure(String),

    /// Engine was released and cannot be used again
    #[error("Engine has been released")]
    EngineReleased,

    /// Favorites store failure
    #[error("Favorites store error: {0}")]
    Favorites(String),

    /// Playback service task is no longer running
    #[error("Playback service stopped")]
    ServiceStopped,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors reported by an audio backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Source locator could not be opened or decoded
    #[error("Unplayable source: {0}")]
    Unplayable(String),

    /// Backend is in no condition to accept the command
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<BackendError> for PlaybackError {
    fn from(err: BackendError) -> Self {
        PlaybackError::EngineFailure(err.to_string())
    }
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        PlaybackError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_state_and_operation() {
        let err = PlaybackError::IllegalStateTransition {
            from: PlayerState::Idle,
            operation: EngineOperation::Pause,
        };
        assert_eq!(err.to_string(), "Cannot pause while idle");
    }

    #[test]
    fn backend_error_becomes_engine_failure() {
        let err: PlaybackError = BackendError::Unplayable("/missing.mp3".to_string()).into();
        assert!(matches!(err, PlaybackError::EngineFailure(ref msg) if msg.contains("/missing.mp3")));
    }
}
