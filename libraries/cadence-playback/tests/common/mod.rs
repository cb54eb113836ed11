//! Shared fixtures for integration tests

#![allow(dead_code)]

use cadence_playback::{
    AudioBackend, BackendError, EngineNotifier, EventSink, InMemoryFavorites, PlaybackConfig,
    PlaybackEvent, QueueController, Track,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn create_track(id: &str) -> Track {
    Track::new(
        id,
        format!("Track {}", id),
        format!("/music/{}.mp3", id),
        Duration::from_secs(180),
    )
    .with_artist("Test Artist")
}

pub fn create_tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| create_track(id)).collect()
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<String>,
    notifier: Option<EngineNotifier>,
    unplayable: HashSet<String>,
}

/// Test-side view into a [`ScriptedBackend`]
#[derive(Clone, Default)]
pub struct BackendProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl BackendProbe {
    /// Make binding `source` fail
    pub fn refuse(&self, source: &str) {
        self.state
            .lock()
            .unwrap()
            .unplayable
            .insert(source.to_string());
    }

    /// Commands the backend received, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Notifier handed over by the most recent bind
    pub fn notifier(&self) -> EngineNotifier {
        self.state
            .lock()
            .unwrap()
            .notifier
            .clone()
            .expect("nothing bound yet")
    }

    /// Report natural end of the bound track
    pub fn complete(&self) {
        self.notifier().completed();
    }

    /// Report an asynchronous failure of the bound track
    pub fn fail(&self, message: &str) {
        self.notifier().failed(message);
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

/// Backend that records commands and fails on request
pub struct ScriptedBackend {
    probe: BackendProbe,
}

impl ScriptedBackend {
    pub fn new() -> (Self, BackendProbe) {
        let probe = BackendProbe::default();
        (
            Self {
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl AudioBackend for ScriptedBackend {
    fn bind(&mut self, track: &Track, notifier: EngineNotifier) -> Result<(), BackendError> {
        self.probe.record(format!("bind:{}", track.id));
        let mut state = self.probe.state.lock().unwrap();
        state.notifier = Some(notifier);
        if state.unplayable.contains(&track.source) {
            return Err(BackendError::Unplayable(track.source.clone()));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        self.probe.record("start".to_string());
        Ok(())
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.probe.record("pause".to_string());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.probe.record("stop".to_string());
        Ok(())
    }

    fn reset(&mut self) {
        self.probe.record("reset".to_string());
    }

    fn release(&mut self) {
        self.probe.record("release".to_string());
    }

    fn position(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// Event sink that keeps everything it is given
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PlaybackEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: PlaybackEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub controller: QueueController,
    pub probe: BackendProbe,
    pub events: Arc<RecordingSink>,
    pub favorites: Arc<InMemoryFavorites>,
}

/// Controller over a scripted backend with `ids` already queued
pub fn harness(ids: &[&str]) -> Harness {
    harness_with(&PlaybackConfig::default(), ids)
}

pub fn harness_with(config: &PlaybackConfig, ids: &[&str]) -> Harness {
    init_tracing();
    let (backend, probe) = ScriptedBackend::new();
    let events = Arc::new(RecordingSink::default());
    let favorites = Arc::new(InMemoryFavorites::new());
    let mut controller =
        QueueController::new(config, Box::new(backend), favorites.clone(), events.clone());

    if !ids.is_empty() {
        controller
            .replace_queue(create_tracks(ids), 0)
            .expect("queue setup");
    }
    events.take();

    Harness {
        controller,
        probe,
        events,
        favorites,
    }
}
