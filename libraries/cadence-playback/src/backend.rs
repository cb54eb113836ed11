//! Audio backend contract
//!
//! Abstracts the decode/render engine the player drives. Backends only have
//! to honor simple lifecycle commands; the [`PlayerEngine`](crate::PlayerEngine)
//! owns the state machine on top of them.

use crate::error::BackendError;
use crate::types::Track;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Asynchronous report from a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineNotice {
    /// Load generation the notice belongs to
    pub generation: u64,

    /// What happened
    pub kind: NoticeKind,
}

/// Kind of asynchronous backend report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// Natural end of track
    Completed,

    /// Playback failed; the backend gives up on this source
    Failed(String),
}

/// Receiving side of the engine notice channel
pub type NoticeReceiver = mpsc::UnboundedReceiver<EngineNotice>;

/// Create the channel engine notices travel on
pub fn notice_channel() -> (mpsc::UnboundedSender<EngineNotice>, NoticeReceiver) {
    mpsc::unbounded_channel()
}

/// Handle a backend uses to report completion or failure
///
/// Each notifier is stamped with the load generation it was issued for, so
/// reports from a superseded source are recognized as stale downstream.
/// Safe to clone and move to any thread.
#[derive(Debug, Clone)]
pub struct EngineNotifier {
    sender: mpsc::UnboundedSender<EngineNotice>,
    generation: u64,
}

impl EngineNotifier {
    pub(crate) fn new(sender: mpsc::UnboundedSender<EngineNotice>, generation: u64) -> Self {
        Self { sender, generation }
    }

    /// Generation this notifier reports for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report natural end of track
    pub fn completed(&self) {
        self.send(NoticeKind::Completed);
    }

    /// Report a playback failure
    pub fn failed(&self, message: impl Into<String>) {
        self.send(NoticeKind::Failed(message.into()));
    }

    fn send(&self, kind: NoticeKind) {
        // Receiver gone means the controller shut down
        let _ = self.sender.send(EngineNotice {
            generation: self.generation,
            kind,
        });
    }
}

/// Platform decode/render engine
///
/// Implementors bind one source at a time. A new `bind` abandons whatever was
/// bound before. Completion and asynchronous errors are reported through the
/// notifier passed to `bind`, never through return values.
pub trait AudioBackend: Send {
    /// Bind a new source
    ///
    /// # Returns
    /// * `Ok(())` - Source opened, ready to start
    /// * `Err(_)` - Source unplayable (bad locator, IO failure, ...)
    fn bind(&mut self, track: &Track, notifier: EngineNotifier) -> Result<(), BackendError>;

    /// Begin or resume audio output
    fn start(&mut self) -> Result<(), BackendError>;

    /// Pause audio output
    fn pause(&mut self) -> Result<(), BackendError>;

    /// Stop audio output, keeping the source bound
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Drop the bound source
    fn reset(&mut self) {}

    /// Free all resources; no further calls follow
    fn release(&mut self) {}

    /// Elapsed play time of the bound source
    fn position(&self) -> Duration;

    /// Total length of the bound source, if known
    fn duration(&self) -> Option<Duration> {
        None
    }
}

/// Backend that plays silence on the tokio clock
///
/// A started track "finishes" after its nominal duration and reports
/// completion through its notifier. Pausing, stopping or rebinding cancels
/// the pending completion. Sources with an empty locator refuse to bind.
///
/// Must be started from within a tokio runtime.
#[derive(Debug, Default)]
pub struct ClockBackend {
    duration: Option<Duration>,
    notifier: Option<EngineNotifier>,
    elapsed: Duration,
    started_at: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl ClockBackend {
    /// Create an idle clock backend
    pub fn new() -> Self {
        Self::default()
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn settle_elapsed(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.elapsed += started_at.elapsed();
        }
    }
}

impl AudioBackend for ClockBackend {
    fn bind(&mut self, track: &Track, notifier: EngineNotifier) -> Result<(), BackendError> {
        self.reset();
        if track.source.trim().is_empty() {
            return Err(BackendError::Unplayable(format!(
                "track {} has no source",
                track.id
            )));
        }
        self.duration = Some(track.duration);
        self.notifier = Some(notifier);
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        let (Some(duration), Some(notifier)) = (self.duration, self.notifier.clone()) else {
            return Err(BackendError::Unavailable("no source bound".to_string()));
        };
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        self.cancel_timer();
        let remaining = duration.saturating_sub(self.elapsed);
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(remaining).await;
            notifier.completed();
        }));
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.cancel_timer();
        self.settle_elapsed();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.cancel_timer();
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        Ok(())
    }

    fn reset(&mut self) {
        self.cancel_timer();
        self.duration = None;
        self.notifier = None;
        self.elapsed = Duration::ZERO;
        self.started_at = None;
    }

    fn release(&mut self) {
        self.reset();
    }

    fn position(&self) -> Duration {
        let running = self
            .started_at
            .map(|started_at| started_at.elapsed())
            .unwrap_or_default();
        let position = self.elapsed + running;
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

impl Drop for ClockBackend {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
