//! Core types for playback orchestration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A playable queue entry
///
/// Tracks are immutable values. Two tracks are the same track when their
/// identifiers match, regardless of metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier (favorites and queue dedupe are keyed on this)
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Artwork reference (URL or path)
    pub artwork: Option<String>,

    /// Playable source locator handed to the audio backend
    pub source: String,

    /// Nominal duration from metadata
    pub duration: Duration,
}

impl Track {
    /// Create a track with the required fields; optional metadata starts empty
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: String::new(),
            album: None,
            artwork: None,
            source: source.into(),
            duration,
        }
    }

    /// Set the artist name
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the album name
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the artwork reference
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

/// Policy used by advance/retreat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Walk the queue in order, wrapping at both ends
    #[default]
    Loop,

    /// Pick any index uniformly (the current one included)
    Random,

    /// Reload the current track
    Repeat,
}

/// Lifecycle state of the player engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// Nothing bound
    Idle,

    /// Source bound, not yet playing
    Initialized,

    /// Producing audio
    Started,

    /// Paused mid-track
    Paused,

    /// Stopped with a source still bound
    Stopped,

    /// Reached the natural end of the track
    Completed,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerState::Idle => "idle",
            PlayerState::Initialized => "initialized",
            PlayerState::Started => "started",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
            PlayerState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Engine lifecycle operation, used in transition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineOperation {
    Start,
    Pause,
    Stop,
}

impl fmt::Display for EngineOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineOperation::Start => "start",
            EngineOperation::Pause => "pause",
            EngineOperation::Stop => "stop",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_identity_is_by_id() {
        let a = Track::new("1", "First", "/music/1.mp3", Duration::from_secs(180));
        let b = Track::new("1", "Renamed", "/other/1.flac", Duration::from_secs(10))
            .with_artist("Someone");
        let c = Track::new("2", "First", "/music/1.mp3", Duration::from_secs(180));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn default_play_mode_is_loop() {
        assert_eq!(PlayMode::default(), PlayMode::Loop);
    }

    #[test]
    fn play_mode_serializes_lowercase() {
        let json = serde_json::to_string(&PlayMode::Random).unwrap();
        assert_eq!(json, "\"random\"");
    }

    #[test]
    fn track_builder_sets_metadata() {
        let track = Track::new("t", "Title", "/music/t.mp3", Duration::from_secs(60))
            .with_artist("Artist")
            .with_album("Album")
            .with_artwork("https://img/cover.jpg");

        assert_eq!(track.artist, "Artist");
        assert_eq!(track.album.as_deref(), Some("Album"));
        assert_eq!(track.artwork.as_deref(), Some("https://img/cover.jpg"));
    }
}
