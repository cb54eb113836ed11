//! Favorites store contract
//!
//! Persistent favorites live outside this crate. The controller only needs
//! to ask whether a track is marked and to flip the mark.

use crate::{error::Result, types::Track};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Storage for favorite tracks, keyed by track identifier
///
/// `add` and `remove` must be idempotent: the controller's toggle is a
/// read-then-write, so two overlapping toggles can both try to add the same
/// track.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Whether the track is marked as favorite
    async fn exists(&self, track_id: &str) -> Result<bool>;

    /// Mark a track as favorite
    async fn add(&self, track: &Track) -> Result<()>;

    /// Clear the favorite mark
    async fn remove(&self, track_id: &str) -> Result<()>;
}

/// Favorites kept in memory for the process lifetime
#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    tracks: Mutex<HashMap<String, Track>>,
}

impl InMemoryFavorites {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of marked tracks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no track is marked
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Track>> {
        // A poisoned map is still a valid map
        self.tracks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl FavoritesStore for InMemoryFavorites {
    async fn exists(&self, track_id: &str) -> Result<bool> {
        Ok(self.lock().contains_key(track_id))
    }

    async fn add(&self, track: &Track) -> Result<()> {
        self.lock()
            .entry(track.id.clone())
            .or_insert_with(|| track.clone());
        Ok(())
    }

    async fn remove(&self, track_id: &str) -> Result<()> {
        self.lock().remove(track_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn track(id: &str) -> Track {
        Track::new(id, id, format!("/music/{}.mp3", id), Duration::from_secs(90))
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = InMemoryFavorites::new();
        store.add(&track("a")).await.unwrap();
        store.add(&track("a")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.exists("a").await.unwrap());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = InMemoryFavorites::new();
        store.add(&track("a")).await.unwrap();
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();

        assert!(store.is_empty());
        assert!(!store.exists("a").await.unwrap());
    }
}
