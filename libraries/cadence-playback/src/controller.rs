//! Queue controller - core orchestration
//!
//! Owns the queue, the cursor and the play mode, decides what plays now, next
//! and previous, and drives the [`PlayerEngine`]. All methods take `&mut self`:
//! the controller is a single-writer value. Concurrent callers go through the
//! [`PlaybackService`](crate::PlaybackService), which serializes commands and
//! engine notices onto one task.

use crate::{
    backend::{AudioBackend, EngineNotice, NoticeKind, NoticeReceiver},
    config::PlaybackConfig,
    engine::PlayerEngine,
    error::{PlaybackError, Result},
    events::{EventSink, PlaybackEvent},
    favorites::FavoritesStore,
    types::{PlayMode, PlayerState, Track},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Central queue and playback orchestration
pub struct QueueController {
    queue: Vec<Track>,
    cursor: usize,
    play_mode: PlayMode,

    engine: PlayerEngine,
    notices: Option<NoticeReceiver>,

    favorites: Arc<dyn FavoritesStore>,
    events: Arc<dyn EventSink>,

    rng: StdRng,
}

impl QueueController {
    /// Create a controller driving `backend`
    pub fn new(
        config: &PlaybackConfig,
        backend: Box<dyn AudioBackend>,
        favorites: Arc<dyn FavoritesStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let (engine, notices) = PlayerEngine::new(backend);
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            queue: Vec::new(),
            cursor: 0,
            play_mode: config.play_mode,
            engine,
            notices: Some(notices),
            favorites,
            events,
            rng,
        }
    }

    // ===== Queue Management =====

    /// Append tracks to the queue and move the cursor to `start_index`
    ///
    /// The existing queue is kept; tracks already present (by id) are
    /// skipped. Does not start playback. Fails without touching anything if
    /// `start_index` is not a position in the resulting queue.
    pub fn replace_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        let mut fresh: Vec<Track> = Vec::with_capacity(tracks.len());
        for track in tracks {
            if self.position_of(&track.id).is_none() && !fresh.contains(&track) {
                fresh.push(track);
            }
        }

        let new_len = self.queue.len() + fresh.len();
        let valid = if new_len == 0 {
            start_index == 0
        } else {
            start_index < new_len
        };
        if !valid {
            return Err(PlaybackError::IndexOutOfRange {
                index: start_index,
                len: new_len,
            });
        }

        let added = fresh.len();
        self.queue.extend(fresh);
        self.cursor = start_index;
        debug!(added, len = new_len, cursor = start_index, "Queue extended");

        if added > 0 {
            self.emit(PlaybackEvent::QueueChanged { length: new_len });
        }
        Ok(())
    }

    /// Insert a track (unless present) and play it
    ///
    /// - Absent: inserted at `at_index`, cursor moves there, playback starts.
    /// - Present elsewhere: cursor moves to it, playback starts.
    /// - Already the current track: nothing happens.
    pub fn enqueue_and_play(&mut self, track: Track, at_index: usize) -> Result<()> {
        self.ensure_active()?;
        if self.queue.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }

        match self.position_of(&track.id) {
            None => {
                if at_index > self.queue.len() {
                    return Err(PlaybackError::IndexOutOfRange {
                        index: at_index,
                        len: self.queue.len(),
                    });
                }
                self.queue.insert(at_index, track);
                self.cursor = at_index;
                self.emit(PlaybackEvent::QueueChanged {
                    length: self.queue.len(),
                });
                self.play_current()
            }
            Some(position) if position == self.cursor => {
                debug!(track_id = %track.id, "Track already current, nothing to do");
                Ok(())
            }
            Some(position) => {
                self.cursor = position;
                self.play_current()
            }
        }
    }

    // ===== Playback Control =====

    /// Play the track at the cursor
    pub fn play(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.play_current()
    }

    /// Move the cursor to `index` and play that track
    pub fn play_at(&mut self, index: usize) -> Result<()> {
        self.ensure_active()?;
        self.check_index(index)?;
        self.cursor = index;
        self.play_current()
    }

    /// Play the next track according to the play mode
    pub fn advance(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.cursor = self.next_index()?;
        self.play_current()
    }

    /// Play the previous track according to the play mode
    pub fn retreat(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.cursor = self.previous_index()?;
        self.play_current()
    }

    /// Pause when playing, resume when paused, otherwise do nothing
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.engine.state() {
            PlayerState::Started => self.pause(),
            PlayerState::Paused => self.resume(),
            _ => Ok(()),
        }
    }

    /// Pause output
    pub fn pause(&mut self) -> Result<()> {
        match self.engine.pause() {
            Ok(()) => {
                self.emit(PlaybackEvent::PlaybackPaused);
                Ok(())
            }
            Err(e) => absorb_engine_failure(e),
        }
    }

    /// Resume output
    pub fn resume(&mut self) -> Result<()> {
        match self.engine.start() {
            Ok(()) => {
                self.emit(PlaybackEvent::PlaybackStarted);
                Ok(())
            }
            Err(e) => absorb_engine_failure(e),
        }
    }

    // ===== Play Mode =====

    /// Change the play mode; cursor and playback are untouched
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        info!(?mode, "Play mode changed");
        self.play_mode = mode;
        self.emit(PlaybackEvent::PlayModeChanged { mode });
    }

    /// Current play mode
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    // ===== Favorites =====

    /// Flip the favorite mark of the current track
    ///
    /// Returns the mark after the change. Read-then-write against the store,
    /// not atomic. The returned future does not borrow the controller, so it
    /// can be awaited without holding the single-writer position.
    pub fn toggle_favorite(&self) -> impl Future<Output = Result<bool>> + Send + 'static {
        let target = self.current_track().cloned();
        let favorites = Arc::clone(&self.favorites);
        let events = Arc::clone(&self.events);

        async move {
            let track = target?;
            let is_favorite = if favorites.exists(&track.id).await? {
                favorites.remove(&track.id).await?;
                false
            } else {
                favorites.add(&track).await?;
                true
            };

            info!(track_id = %track.id, is_favorite, "Favorite toggled");
            events.publish(PlaybackEvent::FavoriteChanged { is_favorite });
            Ok(is_favorite)
        }
    }

    /// Whether the current track is marked as favorite
    pub fn is_favorite(&self) -> impl Future<Output = Result<bool>> + Send + 'static {
        let target = self.current_track().map(|track| track.id.clone());
        let favorites = Arc::clone(&self.favorites);

        async move { favorites.exists(&target?).await }
    }

    // ===== State Queries =====

    /// Track at the cursor
    pub fn current_track(&self) -> Result<&Track> {
        if self.queue.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        self.queue
            .get(self.cursor)
            .ok_or(PlaybackError::IndexOutOfRange {
                index: self.cursor,
                len: self.queue.len(),
            })
    }

    /// All queued tracks in order
    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    /// Cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Engine lifecycle state
    pub fn player_state(&self) -> PlayerState {
        self.engine.state()
    }

    /// Whether audio is being produced
    pub fn is_playing(&self) -> bool {
        self.engine.state() == PlayerState::Started
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.engine.state() == PlayerState::Paused
    }

    /// Elapsed time of the loaded track
    pub fn position(&self) -> Duration {
        self.engine.position()
    }

    /// Total time of the loaded track
    pub fn duration(&self) -> Duration {
        self.engine.duration()
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.engine.is_released()
    }

    // ===== Engine Notices =====

    /// Hand the notice receiver to an external event loop
    ///
    /// After this, notices must be fed back through [`Self::handle_notice`].
    pub fn take_notices(&mut self) -> Option<NoticeReceiver> {
        self.notices.take()
    }

    /// React to an asynchronous engine notice
    ///
    /// Completion and failure of the loaded track both advance exactly once,
    /// even when the whole queue is unplayable. Stale notices from superseded
    /// loads are dropped.
    pub fn handle_notice(&mut self, notice: EngineNotice) -> Result<()> {
        match self.engine.accept(notice) {
            None => Ok(()),
            Some(NoticeKind::Completed) => {
                debug!("Track completed, advancing");
                self.advance()
            }
            Some(NoticeKind::Failed(message)) => {
                let track_id = self.engine.current().map(|track| track.id.clone());
                warn!(?track_id, error = %message, "Track failed, skipping");
                self.emit(PlaybackEvent::EngineFailure { track_id, message });
                self.advance()
            }
        }
    }

    /// Handle every notice delivered before this call
    ///
    /// For callers driving the controller without the playback service.
    /// Notices posted while handling (a failed load during auto-advance) stay
    /// queued for the next call. Returns the number of notices handled.
    pub fn process_pending_notices(&mut self) -> Result<usize> {
        let Some(receiver) = self.notices.as_mut() else {
            return Ok(0);
        };
        let pending: Vec<EngineNotice> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();

        let handled = pending.len();
        for notice in pending {
            self.handle_notice(notice)?;
        }
        Ok(handled)
    }

    // ===== Lifecycle =====

    /// Release the engine and detach from its notices
    ///
    /// Idempotent. Playback operations fail with `EngineReleased` afterwards.
    pub fn shutdown(&mut self) {
        if self.engine.is_released() {
            return;
        }
        self.engine.release();
        self.notices = None;
        info!("Playback controller shut down");
        self.emit(PlaybackEvent::EngineReleased);
    }

    // ===== Internal =====

    /// Load and start the track at the cursor
    ///
    /// Engine failures are not returned: the engine has already posted a
    /// failure notice, and handling it skips forward.
    fn play_current(&mut self) -> Result<()> {
        let track = self.current_track()?.clone();
        info!(track_id = %track.id, index = self.cursor, "Loading track");
        self.emit(PlaybackEvent::TrackLoading {
            track: track.clone(),
        });

        match self.engine.load(&track).and_then(|()| self.engine.start()) {
            Ok(()) => {
                self.emit(PlaybackEvent::PlaybackStarted);
                Ok(())
            }
            Err(e) => absorb_engine_failure(e),
        }
    }

    fn next_index(&mut self) -> Result<usize> {
        let len = self.queue.len();
        if len == 0 {
            return Err(PlaybackError::EmptyQueue);
        }
        Ok(match self.play_mode {
            PlayMode::Loop => (self.cursor + 1) % len,
            PlayMode::Random => self.rng.gen_range(0..len),
            PlayMode::Repeat => self.cursor,
        })
    }

    fn previous_index(&mut self) -> Result<usize> {
        let len = self.queue.len();
        if len == 0 {
            return Err(PlaybackError::EmptyQueue);
        }
        Ok(match self.play_mode {
            PlayMode::Loop => (self.cursor + len - 1) % len,
            PlayMode::Random => self.rng.gen_range(0..len),
            PlayMode::Repeat => self.cursor,
        })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.queue.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if index >= self.queue.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.queue.len(),
            });
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.engine.is_released() {
            Err(PlaybackError::EngineReleased)
        } else {
            Ok(())
        }
    }

    fn position_of(&self, track_id: &str) -> Option<usize> {
        self.queue.iter().position(|t| t.id == track_id)
    }

    fn emit(&self, event: PlaybackEvent) {
        self.events.publish(event);
    }
}

fn absorb_engine_failure(err: PlaybackError) -> Result<()> {
    match err {
        PlaybackError::EngineFailure(message) => {
            debug!(error = %message, "Engine failure deferred to auto-advance");
            Ok(())
        }
        other => Err(other),
    }
}
