//! Playback Events
//!
//! Domain events published by the controller for observers (notification
//! surfaces, track lists, favorite indicators). Publishing is fire-and-forget:
//! the controller never waits on observers and does not need any of them to
//! be registered.

use crate::types::{PlayMode, Track};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

/// Default number of events buffered per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Events emitted by the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// A track is about to be bound to the engine
    TrackLoading {
        /// Track being loaded
        track: Track,
    },

    /// Audio output started or resumed
    PlaybackStarted,

    /// Audio output paused
    PlaybackPaused,

    /// Favorite mark of the current track flipped
    FavoriteChanged {
        /// Mark after the change
        is_favorite: bool,
    },

    /// Play mode changed
    PlayModeChanged {
        /// New mode
        mode: PlayMode,
    },

    /// Engine released; no further playback on this controller
    EngineReleased,

    /// Engine failed on a track; the controller skips forward
    EngineFailure {
        /// Track that failed, if one was loaded
        track_id: Option<String>,
        /// Backend message
        message: String,
    },

    /// Tracks were appended or inserted
    QueueChanged {
        /// New queue length
        length: usize,
    },
}

/// Destination for playback events
///
/// Implementations must not block: `publish` is called from the controller
/// while it holds the single-writer position.
pub trait EventSink: Send + Sync {
    /// Publish an event to zero or more observers
    fn publish(&self, event: PlaybackEvent);
}

/// Broadcast event bus
///
/// Observers register with [`EventBus::subscribe`] and unregister by dropping
/// the returned [`Subscription`]. A slow observer that falls more than the
/// configured capacity behind loses the oldest events rather than stalling
/// the controller.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new observer
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of registered observers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: PlaybackEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

/// An observer's registration on an [`EventBus`]
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<PlaybackEvent>,
}

impl Subscription {
    /// Wait for the next event
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<PlaybackEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged, dropping oldest events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already buffered
    pub fn try_recv(&mut self) -> Option<PlaybackEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged, dropping oldest events");
                }
                Err(_) => return None,
            }
        }
    }

    /// Drain all buffered events
    pub fn drain(&mut self) -> Vec<PlaybackEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
