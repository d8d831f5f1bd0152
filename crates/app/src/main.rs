use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use clap::{Parser, Subcommand};
use fretcoach_core::{
    fretboard, AppConfig, BuiltinCatalog, EchoCoach, FeedbackClient, FrameSample, JsonCatalog,
    MarkerDetector, MarkerRegistry, PracticeSession, SongCatalog, TickOutcome,
};
use tracing_subscriber::EnvFilter;

fn main() -> fretcoach_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Songs { catalog } => run_songs(catalog.as_deref()),
        Commands::Detect {
            input,
            width,
            height,
            channels,
            marker,
        } => run_detect(&config, &input, width, height, channels, &marker),
        Commands::Simulate {
            song,
            catalog,
            miss_every,
            timing_error_ms,
            ask,
        } => run_simulate(
            &config,
            &song,
            catalog.as_deref(),
            miss_every,
            timing_error_ms,
            ask.as_deref(),
        ),
    }
}

fn load_catalog(path: Option<&Path>) -> fretcoach_core::Result<Box<dyn SongCatalog>> {
    Ok(match path {
        Some(path) => Box::new(JsonCatalog::from_path(path)?),
        None => Box::new(BuiltinCatalog::new()),
    })
}

fn run_songs(catalog: Option<&Path>) -> fretcoach_core::Result<()> {
    let songs = load_catalog(catalog)?.list_songs()?;
    if songs.is_empty() {
        println!("no songs available");
        return Ok(());
    }

    for song in songs {
        println!(
            "{:<8} {:<24} {:<16} {:<12} {:>5} bpm {:>3} notes",
            song.id,
            song.title,
            song.artist,
            song.difficulty,
            song.bpm,
            song.notes.len()
        );
    }
    Ok(())
}

fn run_detect(
    config: &AppConfig,
    input: &Path,
    width: usize,
    height: usize,
    channels: usize,
    marker: &str,
) -> fretcoach_core::Result<()> {
    tracing::info!(?input, width, height, channels, marker, "running marker detection");

    let pixels = std::fs::read(input)?;
    let frame = FrameSample::new(width, height, channels, pixels);
    let detector = MarkerDetector::new(config.detector, MarkerRegistry::builtin());

    let grid = detector.brightness_grid(&frame)?;
    let visible = detector.detect(&frame, marker)?;
    println!(
        "min {:.2} max {:.2} contrast {:.2} threshold {:.2}",
        grid.min(),
        grid.max(),
        grid.contrast(),
        detector.contrast_threshold()
    );
    println!("marker `{marker}` {}", if visible { "found" } else { "not found" });
    Ok(())
}

fn run_simulate(
    config: &AppConfig,
    song_id: &str,
    catalog: Option<&Path>,
    miss_every: Option<u32>,
    timing_error_ms: f64,
    ask: Option<&str>,
) -> fretcoach_core::Result<()> {
    let song = Arc::new(load_catalog(catalog)?.require_song(song_id)?);
    let interval = song.beat_interval();
    tracing::info!(song = %song.id, ?interval, "simulating practice run");

    // Playback is driven by a simulated clock, so the run never sleeps.
    let mut session = PracticeSession::new(config);
    let start = Instant::now();
    let mut now = start;
    if !session.play(song.clone(), now) {
        return Err(fretcoach_core::FretCoachError::msg(format!(
            "song `{song_id}` could not be started"
        )));
    }

    let mut beat = 1u32;
    loop {
        let pitch_hz = session
            .scheduler()
            .current_note()
            .and_then(|note| fretboard::note_frequency(note.string, note.fret));
        let missed = miss_every.is_some_and(|n| n > 0 && beat % n == 0);
        let metrics = session.record_attempt(!missed, timing_error_ms);
        tracing::debug!(beat, ?pitch_hz, ?metrics, "beat scored");

        now += interval;
        if session.tick(now) == TickOutcome::Finished {
            break;
        }
        beat += 1;
    }

    let request = session.feedback_request(ask.unwrap_or_default());
    let snapshot = session.finish(now);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if ask.is_some() {
        println!("{}", EchoCoach.request_feedback(&request)?);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Augmented-reality guitar practice aid", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the songs in the catalog.
    Songs {
        /// JSON song list to use instead of the bundled songs.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Check a raw pixel dump for a fretboard marker.
    Detect {
        /// Interleaved 8-bit pixel data, row-major.
        input: PathBuf,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        height: usize,
        #[arg(long, default_value_t = 4)]
        channels: usize,
        #[arg(long, default_value = "guitar-head")]
        marker: String,
    },
    /// Play a song against a simulated clock and print the session result.
    Simulate {
        /// Song id, e.g. `song1`.
        song: String,
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Mark every Nth note as missed.
        #[arg(long)]
        miss_every: Option<u32>,
        /// Timing error applied to every note, in milliseconds.
        #[arg(long, default_value_t = 0.0)]
        timing_error_ms: f64,
        /// Question for the coach; prints the prompt that would be sent.
        #[arg(long)]
        ask: Option<String>,
    },
}
