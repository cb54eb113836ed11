//! Playback service
//!
//! Moves a [`QueueController`] onto its own tokio task. Callers talk to it
//! through a cloneable [`PlaybackHandle`]; every request is a command on a
//! bounded channel with a oneshot reply. Engine notices are delivered to the
//! same task and take priority over pending commands, so an auto-advance
//! always finishes before the next caller command is looked at.

use crate::{
    backend::{EngineNotice, NoticeReceiver},
    controller::QueueController,
    error::{PlaybackError, Result},
    types::{PlayMode, PlayerState, Track},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Commands processed by the service task
enum Command {
    ReplaceQueue {
        tracks: Vec<Track>,
        start_index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    EnqueueAndPlay {
        track: Track,
        at_index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    StartSession {
        tracks: Vec<Track>,
        reply: oneshot::Sender<Result<()>>,
    },
    Play {
        reply: oneshot::Sender<Result<()>>,
    },
    PlayAt {
        index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    Advance {
        reply: oneshot::Sender<Result<()>>,
    },
    Retreat {
        reply: oneshot::Sender<Result<()>>,
    },
    TogglePlayPause {
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<Result<()>>,
    },
    Resume {
        reply: oneshot::Sender<Result<()>>,
    },
    SetPlayMode {
        mode: PlayMode,
        reply: oneshot::Sender<()>,
    },
    ToggleFavorite {
        reply: oneshot::Sender<Result<bool>>,
    },
    IsFavorite {
        reply: oneshot::Sender<Result<bool>>,
    },
    Snapshot {
        reply: oneshot::Sender<PlaybackSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Queued tracks in order
    pub queue: Vec<Track>,
    /// Cursor position
    pub cursor: usize,
    /// Track at the cursor, if the queue is non-empty
    pub current_track: Option<Track>,
    /// Active play mode
    pub play_mode: PlayMode,
    /// Engine lifecycle state
    pub state: PlayerState,
    /// Elapsed time of the loaded track
    pub position: Duration,
    /// Total time of the loaded track
    pub duration: Duration,
}

impl PlaybackSnapshot {
    fn capture(controller: &QueueController) -> Self {
        Self {
            queue: controller.queue().to_vec(),
            cursor: controller.cursor(),
            current_track: controller.current_track().ok().cloned(),
            play_mode: controller.play_mode(),
            state: controller.player_state(),
            position: controller.position(),
            duration: controller.duration(),
        }
    }

    /// Whether audio is being produced
    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Started
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.state == PlayerState::Paused
    }
}

/// Spawns the playback service task
pub struct PlaybackService;

impl PlaybackService {
    /// Move `controller` onto a new task and return a handle to it
    ///
    /// Must be called from within a tokio runtime. The task ends when
    /// [`PlaybackHandle::shutdown`] is called or every handle is dropped;
    /// either way the controller is shut down on exit.
    pub fn spawn(mut controller: QueueController, command_buffer: usize) -> PlaybackHandle {
        let (commands, receiver) = mpsc::channel(command_buffer.max(1));
        let notices = controller.take_notices();
        tokio::spawn(run(controller, receiver, notices));
        PlaybackHandle { commands }
    }
}

async fn run(
    mut controller: QueueController,
    mut commands: mpsc::Receiver<Command>,
    mut notices: Option<NoticeReceiver>,
) {
    info!("Playback service started");
    loop {
        tokio::select! {
            biased;

            Some(notice) = next_notice(&mut notices) => {
                if let Err(e) = controller.handle_notice(notice) {
                    warn!(error = %e, "Auto-advance failed");
                }
                // An unplayable queue produces notices forever; let one
                // waiting command through after each of them
                if let Ok(command) = commands.try_recv() {
                    if !dispatch(&mut controller, command) {
                        break;
                    }
                }
            }

            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("All playback handles dropped");
                    break;
                };
                if !dispatch(&mut controller, command) {
                    break;
                }
            }
        }
    }
    controller.shutdown();
    info!("Playback service stopped");
}

async fn next_notice(notices: &mut Option<NoticeReceiver>) -> Option<EngineNotice> {
    match notices {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Apply one command; returns `false` when the loop should stop
fn dispatch(controller: &mut QueueController, command: Command) -> bool {
    // A dropped reply receiver only means the caller stopped waiting
    match command {
        Command::ReplaceQueue {
            tracks,
            start_index,
            reply,
        } => {
            let _ = reply.send(controller.replace_queue(tracks, start_index));
        }
        Command::EnqueueAndPlay {
            track,
            at_index,
            reply,
        } => {
            let _ = reply.send(controller.enqueue_and_play(track, at_index));
        }
        Command::StartSession { tracks, reply } => {
            let result = controller
                .replace_queue(tracks, 0)
                .and_then(|()| controller.play());
            let _ = reply.send(result);
        }
        Command::Play { reply } => {
            let _ = reply.send(controller.play());
        }
        Command::PlayAt { index, reply } => {
            let _ = reply.send(controller.play_at(index));
        }
        Command::Advance { reply } => {
            let _ = reply.send(controller.advance());
        }
        Command::Retreat { reply } => {
            let _ = reply.send(controller.retreat());
        }
        Command::TogglePlayPause { reply } => {
            let _ = reply.send(controller.toggle_play_pause());
        }
        Command::Pause { reply } => {
            let _ = reply.send(controller.pause());
        }
        Command::Resume { reply } => {
            let _ = reply.send(controller.resume());
        }
        Command::SetPlayMode { mode, reply } => {
            controller.set_play_mode(mode);
            let _ = reply.send(());
        }
        Command::ToggleFavorite { reply } => {
            // Store round-trips run off the loop; see FavoritesStore on races
            let toggle = controller.toggle_favorite();
            tokio::spawn(async move {
                let _ = reply.send(toggle.await);
            });
        }
        Command::IsFavorite { reply } => {
            let query = controller.is_favorite();
            tokio::spawn(async move {
                let _ = reply.send(query.await);
            });
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(PlaybackSnapshot::capture(controller));
        }
        Command::Shutdown { reply } => {
            controller.shutdown();
            let _ = reply.send(());
            return false;
        }
    }
    true
}

/// Cloneable handle to a running playback service
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::Sender<Command>,
}

impl PlaybackHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| PlaybackError::ServiceStopped)?;
        response.await.map_err(|_| PlaybackError::ServiceStopped)
    }

    /// Append tracks and move the cursor (see [`QueueController::replace_queue`])
    pub async fn replace_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.request(|reply| Command::ReplaceQueue {
            tracks,
            start_index,
            reply,
        })
        .await?
    }

    /// Insert a track unless present and play it
    pub async fn enqueue_and_play(&self, track: Track, at_index: usize) -> Result<()> {
        self.request(|reply| Command::EnqueueAndPlay {
            track,
            at_index,
            reply,
        })
        .await?
    }

    /// Append tracks and start playing from the head of the queue
    pub async fn start_session(&self, tracks: Vec<Track>) -> Result<()> {
        self.request(|reply| Command::StartSession { tracks, reply })
            .await?
    }

    /// Play the track at the cursor
    pub async fn play(&self) -> Result<()> {
        self.request(|reply| Command::Play { reply }).await?
    }

    /// Play the track at `index`
    pub async fn play_at(&self, index: usize) -> Result<()> {
        self.request(|reply| Command::PlayAt { index, reply }).await?
    }

    /// Play the next track
    pub async fn advance(&self) -> Result<()> {
        self.request(|reply| Command::Advance { reply }).await?
    }

    /// Play the previous track
    pub async fn retreat(&self) -> Result<()> {
        self.request(|reply| Command::Retreat { reply }).await?
    }

    /// Toggle between playing and paused
    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.request(|reply| Command::TogglePlayPause { reply })
            .await?
    }

    /// Pause output
    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    /// Resume output
    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    /// Change the play mode
    pub async fn set_play_mode(&self, mode: PlayMode) -> Result<()> {
        self.request(|reply| Command::SetPlayMode { mode, reply })
            .await
    }

    /// Flip the favorite mark of the current track
    pub async fn toggle_favorite(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleFavorite { reply })
            .await?
    }

    /// Whether the current track is a favorite
    pub async fn is_favorite(&self) -> Result<bool> {
        self.request(|reply| Command::IsFavorite { reply }).await?
    }

    /// Current queue, cursor, mode, state and position
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Release the engine and stop the service
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
