//! # MeloMoods
//!
//! Command-line front end for the mood-driven recommender. The interactive
//! player lives elsewhere; this binary manages the track catalog, answers
//! recommendation queries and replays recorded detector sessions.
//!
//! ## Usage
//!
//! ```bash
//! # Create and fill the catalog
//! melomoods init-db
//! melomoods import catalog.json
//!
//! # Ask for recommendations
//! melomoods recommend happy --quantity 8
//!
//! # Replay a recorded webcam session, with two tracks queued up front
//! melomoods simulate session.json --queue 4uLU6hMCjMI75M1A2tKUQC --queue 7GhIk7Il098yCjg4BQjzvb
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use melomoods::cli::{self, Command};
use melomoods::config::RuntimeConfig;
use melomoods::db::{self, SqliteFetcher};
use melomoods::emotion::Emotion;
use melomoods::fetcher::RecommendationFetcher;
use melomoods::replay;
use melomoods::session::MoodSession;
use melomoods::{completion, track::Track};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::Instant;

/// Main entry point for MeloMoods.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug melomoods simulate session.json`
/// - `RUST_LOG=melomoods::selector=debug melomoods simulate session.json`
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::load()?,
    };
    if let Some(db) = args.db {
        config.db_path = db;
    }
    debug!("Using track database {}", config.db_path.display());

    match args.command {
        Command::InitDb { force } => {
            db::init_database(&config.db_path, force)?;
            println!("Created track database at {}", config.db_path.display());
        }
        Command::Import { file } => {
            let mut conn = db::connect(&config.db_path)?;
            db::create_schema(&conn)?;
            let imported = db::import_json(&mut conn, &file)?;
            let total = db::count_tracks(&conn)?;
            println!("Imported {imported} tracks ({total} in catalog)");
        }
        Command::Recommend { emotion, quantity } => {
            let fetcher = SqliteFetcher::new(&config.db_path);
            let tracks = fetcher.fetch(&emotion, quantity)?;
            if tracks.is_empty() {
                println!("No tracks match `{emotion}'");
            }
            for (i, track) in tracks.iter().enumerate() {
                println!("{:>2}. {track}", i + 1);
            }
        }
        Command::Simulate {
            recording,
            queued,
            seed,
        } => simulate(&config, &recording, &queued, seed)?,
        Command::Emotions => {
            for emotion in Emotion::ALL {
                println!("{:<10} {}", emotion, emotion.profile());
            }
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
    }

    Ok(())
}

fn simulate(config: &RuntimeConfig, recording: &Path, queued: &[String], seed: Option<u64>) -> Result<()> {
    let ticks = replay::load_ticks(recording, config.tick())?;
    let fetcher = SqliteFetcher::new(&config.db_path);

    let start = Instant::now();
    let mut session = MoodSession::new(config.session_options(), start);

    if !queued.is_empty() {
        let conn = db::connect(&config.db_path)?;
        for id in queued {
            let track: Track = db::find_track(&conn, id)?
                .with_context(|| format!("Track {id} is not in the catalog"))?;
            session.enqueue(track);
        }
    }

    // Start from neutral recommendations until the first mood block closes.
    session.select_emotion(&fetcher, Emotion::Neutral);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let events = replay::replay(&mut session, &fetcher, &ticks, start, &mut rng);
    info!("Simulation finished after {} blocks", events.len());

    for event in &events {
        let mood = match event.block.dominant() {
            Some(dominant) => format!("{} ({:.2})", dominant.label, dominant.confidence),
            None => "no face".to_string(),
        };
        println!("[{:>6.1}s] mood: {mood}", event.at.as_secs_f64());
        for track in &event.recommendations {
            println!("           - {track}");
        }
        match &event.played {
            Some(selection) => println!("           > {} ({:?})", selection.track, selection.source),
            None => println!("           > nothing to play"),
        }
    }

    if events.is_empty() {
        println!("Recording was shorter than one mood block");
    }
    Ok(())
}
