//! Cadence - Playback Orchestration
//!
//! Queue-based playback control for Cadence.
//!
//! This crate provides:
//! - A play queue with a cursor and identifier-based dedupe
//! - Play modes (Loop, Random, Repeat) for next/previous selection
//! - A player engine state machine over a pluggable audio backend
//! - Auto-advance on track completion or failure
//! - Favorite toggling through a pluggable store
//! - Domain events for UI synchronization
//! - A single-writer playback service for concurrent callers
//!
//! # Architecture
//!
//! `cadence-playback` does not decode audio. The platform supplies an
//! [`AudioBackend`]; the [`PlayerEngine`] tracks its lifecycle; the
//! [`QueueController`] decides what plays and reacts to engine notices.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use cadence_playback::{
//!     ClockBackend, EventBus, InMemoryFavorites, PlayMode, PlaybackConfig, PlaybackEvent,
//!     QueueController, Track,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cadence_playback::Result<()> {
//! let bus = EventBus::default();
//! let mut events = bus.subscribe();
//!
//! let mut controller = QueueController::new(
//!     &PlaybackConfig::default(),
//!     Box::new(ClockBackend::new()),
//!     Arc::new(InMemoryFavorites::new()),
//!     Arc::new(bus),
//! );
//!
//! controller.replace_queue(
//!     vec![
//!         Track::new("1", "Intro", "/music/intro.mp3", Duration::from_secs(90)),
//!         Track::new("2", "Theme", "/music/theme.mp3", Duration::from_secs(240)),
//!     ],
//!     0,
//! )?;
//!
//! controller.play_at(1)?;
//! assert!(controller.is_playing());
//! assert_eq!(controller.current_track()?.id, "2");
//!
//! controller.set_play_mode(PlayMode::Repeat);
//! controller.advance()?;
//! assert_eq!(controller.cursor(), 1);
//!
//! assert!(matches!(events.try_recv(), Some(PlaybackEvent::QueueChanged { length: 2 })));
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Playback Service
//!
//! ```rust,no_run
//! use cadence_playback::{
//!     ClockBackend, EventBus, InMemoryFavorites, PlaybackConfig, PlaybackService,
//!     QueueController, Track,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> cadence_playback::Result<()> {
//! let config = PlaybackConfig::load(None)?;
//! let controller = QueueController::new(
//!     &config,
//!     Box::new(ClockBackend::new()),
//!     Arc::new(InMemoryFavorites::new()),
//!     Arc::new(EventBus::new(config.event_capacity)),
//! );
//!
//! let handle = PlaybackService::spawn(controller, config.command_buffer);
//! handle
//!     .start_session(vec![Track::new("1", "Intro", "/music/intro.mp3", Duration::from_secs(90))])
//!     .await?;
//! handle.toggle_play_pause().await?;
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod controller;
mod engine;
mod error;
mod events;
mod favorites;
mod service;
pub mod types;

// Public exports
pub use backend::{AudioBackend, ClockBackend, EngineNotice, EngineNotifier, NoticeKind, NoticeReceiver};
pub use config::PlaybackConfig;
pub use controller::QueueController;
pub use engine::PlayerEngine;
pub use error::{BackendError, PlaybackError, Result};
pub use events::{EventBus, EventSink, PlaybackEvent, Subscription};
pub use favorites::{FavoritesStore, InMemoryFavorites};
pub use service::{PlaybackHandle, PlaybackService, PlaybackSnapshot};
pub use types::{EngineOperation, PlayMode, PlayerState, Track};
