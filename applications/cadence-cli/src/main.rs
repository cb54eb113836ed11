/// Cadence - plays a queue on the tokio clock and logs what happens
use cadence_playback::{
    ClockBackend, EventBus, InMemoryFavorites, PlayMode, PlaybackConfig, PlaybackEvent,
    PlaybackService, QueueController, Track,
};
use clap::{Parser, ValueEnum};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Drive a Cadence play queue against a simulated backend", long_about = None)]
struct Cli {
    /// Tracks to queue, as `id:title:seconds`
    #[arg(required = true, value_parser = parse_track_spec)]
    tracks: Vec<Track>,

    /// Configuration file path
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Play mode (overrides configuration)
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Seed for random mode (overrides configuration)
    #[arg(long)]
    seed: Option<u64>,

    /// How long to run before shutting down, in seconds
    #[arg(short, long, default_value_t = 30)]
    run_for: u64,

    /// Toggle the favorite mark of the current track right after the session
    /// starts; an unplayable head track may already have been skipped
    #[arg(long)]
    favorite: bool,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Loop,
    Random,
    Repeat,
}

impl From<ModeArg> for PlayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Loop => PlayMode::Loop,
            ModeArg::Random => PlayMode::Random,
            ModeArg::Repeat => PlayMode::Repeat,
        }
    }
}

/// Parse `id:title:seconds` into a track with a synthetic source
///
/// The title may itself contain colons.
fn parse_track_spec(spec: &str) -> Result<Track, String> {
    let malformed = || format!("expected id:title:seconds, got '{}'", spec);
    let (id, rest) = spec.split_once(':').ok_or_else(malformed)?;
    let (title, seconds) = rest.rsplit_once(':').ok_or_else(malformed)?;
    if id.is_empty() {
        return Err("track id must not be empty".to_string());
    }
    let seconds: u64 = seconds
        .trim()
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", seconds, e))?;

    Ok(Track::new(
        id,
        title,
        format!("memory://{}", id),
        Duration::from_secs(seconds),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = PlaybackConfig::load(cli.config.as_deref())?;
    if let Some(mode) = cli.mode {
        config.play_mode = mode.into();
    }
    if cli.seed.is_some() {
        config.random_seed = cli.seed;
    }

    run(cli, config).await
}

async fn run(cli: Cli, config: PlaybackConfig) -> anyhow::Result<()> {
    let bus = EventBus::new(config.event_capacity);
    let mut events = bus.subscribe();

    let controller = QueueController::new(
        &config,
        Box::new(ClockBackend::new()),
        Arc::new(InMemoryFavorites::new()),
        Arc::new(bus),
    );
    let handle = PlaybackService::spawn(controller, config.command_buffer);

    tracing::info!(
        tracks = cli.tracks.len(),
        mode = ?config.play_mode,
        run_for = cli.run_for,
        "Starting session"
    );
    handle.start_session(cli.tracks).await?;
    if cli.favorite {
        handle.toggle_favorite().await?;
    }

    let deadline = tokio::time::sleep(Duration::from_secs(cli.run_for));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => {
                tracing::info!("Run time elapsed");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Interrupted");
                break;
            }
            event = events.recv() => match event {
                Some(event) => log_event(&event),
                None => break,
            },
        }
    }

    let snapshot = handle.snapshot().await?;
    tracing::info!(
        cursor = snapshot.cursor,
        state = %snapshot.state,
        position_ms = snapshot.position.as_millis() as u64,
        "Final state"
    );
    handle.shutdown().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn log_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::TrackLoading { track } => {
            tracing::info!(track_id = %track.id, title = %track.title, "Loading");
        }
        PlaybackEvent::EngineFailure { track_id, message } => {
            tracing::warn!(?track_id, %message, "Playback failed");
        }
        other => tracing::info!(event = ?other, "Event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_spec() {
        let track = parse_track_spec("a1:Morning Song:95").unwrap();
        assert_eq!(track.id, "a1");
        assert_eq!(track.title, "Morning Song");
        assert_eq!(track.duration, Duration::from_secs(95));
        assert_eq!(track.source, "memory://a1");
    }

    #[test]
    fn title_may_contain_colons() {
        let track = parse_track_spec("x:Live: Part 2:60").unwrap();
        assert_eq!(track.id, "x");
        assert_eq!(track.title, "Live: Part 2");
        assert_eq!(track.duration, Duration::from_secs(60));
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(parse_track_spec("only-id").is_err());
        assert!(parse_track_spec(":title:10").is_err());
        assert!(parse_track_spec("a:title:ten").is_err());
    }

    #[test]
    fn cli_accepts_mode_and_tracks() {
        let cli = Cli::try_parse_from(["cadence", "--mode", "repeat", "a:A:5", "b:B:7"]).unwrap();
        assert_eq!(cli.tracks.len(), 2);
        assert!(matches!(cli.mode, Some(ModeArg::Repeat)));
        assert_eq!(cli.run_for, 30);
    }
}
