//! Player engine state machine
//!
//! Wraps exactly one [`AudioBackend`] and tracks its lifecycle state:
//!
//! ```text
//!            load              start
//!  Idle ──────────► Initialized ──────► Started ◄──┐
//!   ▲                                    │  │      │ start
//!   │ reset / failure              pause │  │ end  │
//!   │                                    ▼  ▼      │
//!   └──────────────────────────── Paused  Completed┘
//! ```
//!
//! `stop` is legal from any state with a bound source. `release` is terminal.
//! The state field is updated synchronously with each command; completion and
//! failures arrive later as [`EngineNotice`]s.

use crate::{
    backend::{AudioBackend, EngineNotice, EngineNotifier, NoticeKind, NoticeReceiver},
    error::{PlaybackError, Result},
    types::{EngineOperation, PlayerState, Track},
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Stateful wrapper around an audio backend
pub struct PlayerEngine {
    backend: Box<dyn AudioBackend>,
    state: PlayerState,
    current: Option<Track>,
    generation: u64,
    released: bool,
    notices: mpsc::UnboundedSender<EngineNotice>,
}

impl PlayerEngine {
    /// Create an engine and the receiver its notices are delivered on
    pub fn new(backend: Box<dyn AudioBackend>) -> (Self, NoticeReceiver) {
        let (notices, receiver) = crate::backend::notice_channel();
        let engine = Self {
            backend,
            state: PlayerState::Idle,
            current: None,
            generation: 0,
            released: false,
            notices,
        };
        (engine, receiver)
    }

    /// Current lifecycle state
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Track currently bound, if any
    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Generation of the most recent load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `release` has been called
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Elapsed time of the bound track
    pub fn position(&self) -> Duration {
        if self.current.is_some() {
            self.backend.position()
        } else {
            Duration::ZERO
        }
    }

    /// Total time of the bound track
    ///
    /// Falls back to the track's nominal duration when the backend can't tell.
    pub fn duration(&self) -> Duration {
        match &self.current {
            Some(track) => self.backend.duration().unwrap_or(track.duration),
            None => Duration::ZERO,
        }
    }

    /// Bind a new track
    ///
    /// Supersedes any previous load. A backend failure moves the engine to
    /// Idle, posts a failure notice and returns `EngineFailure`.
    pub fn load(&mut self, track: &Track) -> Result<()> {
        self.ensure_alive()?;

        self.generation += 1;
        let notifier = EngineNotifier::new(self.notices.clone(), self.generation);
        self.current = Some(track.clone());

        match self.backend.bind(track, notifier.clone()) {
            Ok(()) => {
                debug!(track_id = %track.id, generation = self.generation, "Track bound");
                self.state = PlayerState::Initialized;
                Ok(())
            }
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Failed to bind track");
                self.state = PlayerState::Idle;
                notifier.failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Begin or resume output
    pub fn start(&mut self) -> Result<()> {
        self.ensure_bound(EngineOperation::Start)?;
        match self.state {
            PlayerState::Initialized
            | PlayerState::Paused
            | PlayerState::Stopped
            | PlayerState::Completed => {}
            from => return Err(illegal(from, EngineOperation::Start)),
        }

        if let Err(e) = self.backend.start() {
            return Err(self.fail(e.to_string()));
        }
        self.state = PlayerState::Started;
        Ok(())
    }

    /// Pause output
    pub fn pause(&mut self) -> Result<()> {
        self.ensure_bound(EngineOperation::Pause)?;
        if self.state != PlayerState::Started {
            return Err(illegal(self.state, EngineOperation::Pause));
        }

        if let Err(e) = self.backend.pause() {
            return Err(self.fail(e.to_string()));
        }
        self.state = PlayerState::Paused;
        Ok(())
    }

    /// Stop output, keeping the track bound
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_bound(EngineOperation::Stop)?;

        if let Err(e) = self.backend.stop() {
            return Err(self.fail(e.to_string()));
        }
        self.state = PlayerState::Stopped;
        Ok(())
    }

    /// Drop the bound track and return to Idle
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.backend.reset();
        self.current = None;
        self.state = PlayerState::Idle;
        Ok(())
    }

    /// Release the backend; the engine is unusable afterwards
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.backend.release();
        self.current = None;
        self.state = PlayerState::Idle;
        self.released = true;
        debug!("Player engine released");
    }

    /// Apply an asynchronous notice
    ///
    /// Returns the notice kind when it belongs to the current load and changed
    /// the engine, or `None` when it is stale and has been discarded.
    pub fn accept(&mut self, notice: EngineNotice) -> Option<NoticeKind> {
        if self.released || notice.generation != self.generation {
            debug!(
                generation = notice.generation,
                current = self.generation,
                "Discarding stale engine notice"
            );
            return None;
        }

        match notice.kind {
            NoticeKind::Completed => match self.state {
                PlayerState::Started | PlayerState::Paused | PlayerState::Stopped => {
                    self.state = PlayerState::Completed;
                    Some(NoticeKind::Completed)
                }
                from => {
                    debug!(%from, "Ignoring completion outside playback");
                    None
                }
            },
            NoticeKind::Failed(message) => {
                self.backend.reset();
                self.state = PlayerState::Idle;
                Some(NoticeKind::Failed(message))
            }
        }
    }

    fn fail(&mut self, message: String) -> PlaybackError {
        warn!(error = %message, "Audio backend failed");
        self.backend.reset();
        self.state = PlayerState::Idle;
        EngineNotifier::new(self.notices.clone(), self.generation).failed(message.clone());
        PlaybackError::EngineFailure(message)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.released {
            Err(PlaybackError::EngineReleased)
        } else {
            Ok(())
        }
    }

    fn ensure_bound(&self, operation: EngineOperation) -> Result<()> {
        self.ensure_alive()?;
        if self.current.is_none() || self.state == PlayerState::Idle {
            return Err(illegal(self.state, operation));
        }
        Ok(())
    }
}

fn illegal(from: PlayerState, operation: EngineOperation) -> PlaybackError {
    PlaybackError::IllegalStateTransition { from, operation }
}
