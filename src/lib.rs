//! Mood-driven music recommendations with a play queue.
//!
//! Core modules:
//! - [`aggregator`] - Time-windowed averaging of facial-expression samples
//! - [`recent`] - Recent-play history for repeat avoidance
//! - [`queue`] - User-managed FIFO play queue
//! - [`selector`] - Next-track policy (queue, fresh recommendation, repeat)
//! - [`recommendations`] - The five recommendation slots and stale-fetch handling
//! - [`session`] - Per-listener state tying the pieces together
//! - [`db`] - SQLite track catalog and the catalog-backed fetcher
//!
//! ### Supporting Modules
//!
//! - [`emotion`] - Emotion vocabulary, catalog filters and classifier output
//! - [`fetcher`] - The recommendation fetch contract
//! - [`track`] - Track records
//! - [`replay`] - Feeding recorded detector output through a session
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use melomoods::db::SqliteFetcher;
//! use melomoods::emotion::{Emotion, EmotionSample, Expression};
//! use melomoods::session::{Mode, MoodSession, SessionOptions};
//! use std::time::{Duration, Instant};
//!
//! let db_path = melomoods::config::get_db_path()?;
//! let fetcher = SqliteFetcher::new(&db_path);
//!
//! let start = Instant::now();
//! let mut session = MoodSession::new(SessionOptions::default(), start);
//! session.select_emotion(&fetcher, Emotion::Neutral);
//!
//! // Detector ticks every 200 ms; every 10 s a block closes and
//! // recommendations follow the dominant expression.
//! session.set_mode(Mode::Detector, start);
//! for i in 1..=50 {
//!     let now = start + Duration::from_millis(200 * i);
//!     let sample = EmotionSample::new(now, vec![Expression::new("happiness", 0.8)]);
//!     session.detection_tick_with(&fetcher, Some(sample), now);
//! }
//!
//! let mut rng = rand::thread_rng();
//! if let Some(next) = session.play_next(&mut rng) {
//!     println!("Now playing {} ({:?})", next.track, next.source);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Next-Track Policy
//!
//! 1. A non-empty user queue always wins; its head is dequeued.
//! 2. Otherwise a random recommendation not among the recent plays.
//! 3. Otherwise, when every recommendation is recent, any recommendation.
//!
//! Every pick is recorded in the recent-play history, whatever its source.
//!
//! ## Error Handling
//!
//! Fetching reports a typed [`fetcher::FetchError`]; everything touching the
//! filesystem or SQLite returns `anyhow::Result` with context attached.
//! Session operations never fail: a failed fetch leaves the recommendation
//! slots empty.

pub mod aggregator;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod emotion;
pub mod fetcher;
pub mod queue;
pub mod recent;
pub mod recommendations;
pub mod replay;
pub mod selector;
pub mod session;
pub mod track;
