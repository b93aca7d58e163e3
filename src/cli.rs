//! # Command-Line Interface Module
//!
//! Clap definitions for the `melomoods` binary.
//!
//! ## Commands
//!
//! - `init-db`: create the track catalog
//! - `import`: load catalog tracks from a JSON file
//! - `recommend`: print recommendations for an emotion
//! - `simulate`: replay recorded detector output through a listening session
//! - `emotions`: list emotion labels and their catalog filters
//! - `completion`: generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! melomoods init-db
//! melomoods import catalog.json
//! melomoods recommend happy --quantity 10
//! melomoods simulate webcam-session.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
#[command(name = "melomoods")]
#[command(about = "MeloMoods: mood-driven music recommendations")]
#[command(version)]
pub struct Args {
    /// Track database to use instead of the configured one
    #[arg(long, global = true, env = "MELOMOODS_DB")]
    pub db: Option<PathBuf>,

    /// Configuration file to use instead of `<data dir>/melomoods/config.json`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the track database
    InitDb {
        /// Delete and recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Import tracks from a JSON file
    ///
    /// The file holds an array of objects with `id`, `tempo` and optionally
    /// `name`, `label` (0 sad, 1 happy, 2 energetic, 3 calm), `valence` and
    /// `energy`. Existing tracks with the same id are replaced.
    Import {
        /// JSON file to import
        file: PathBuf,
    },

    /// Print recommendations for an emotion
    Recommend {
        /// One of: neutral, happy, sad, angry, fearful, disgusted, surprised
        emotion: String,

        /// Number of tracks to return (1-50)
        #[arg(short, long, default_value_t = crate::fetcher::DEFAULT_QUANTITY)]
        quantity: u32,
    },

    /// Replay recorded detector ticks through a listening session
    ///
    /// Prints every mood block, the recommendations it produced and the track
    /// that would play next.
    Simulate {
        /// JSON array of ticks (`at_ms` plus `expressions` or `logits`)
        recording: PathBuf,

        /// Tracks to queue up front, by id
        #[arg(long = "queue", value_name = "TRACK_ID")]
        queued: Vec<String>,

        /// Seed for track selection, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List emotion labels and the catalog filters they use
    Emotions,

    /// Generate shell completions
    ///
    /// Usage: melomoods completion bash > ~/.local/share/bash-completion/completions/melomoods
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
