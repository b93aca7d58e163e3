//! # MeloMoods Performance Benchmarks
//!
//! Benchmarks for the per-tick and per-track hot paths.
//!
//! ## Benchmark Categories
//!
//! - **Aggregation**: closing a mood block over a full window of samples
//! - **Selection**: picking the next track against the recent-play history
//! - **Catalog**: recommendation queries against SQLite
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench aggregation
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use melomoods::aggregator::{EmotionSampleAggregator, DEFAULT_WINDOW};
use melomoods::db::{self, CatalogTrack, SqliteFetcher};
use melomoods::emotion::{Emotion, EmotionSample, MoodClass, CLASSIFIER_LABELS};
use melomoods::fetcher::{FetchError, RecommendationFetcher};
use melomoods::session::{MoodSession, SessionOptions};
use melomoods::track::Track;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Logit-derived samples, one per tick, spread over one window.
fn create_samples(start: Instant, count: u32) -> Vec<EmotionSample> {
    let tick = DEFAULT_WINDOW / count.max(1);
    (0..count)
        .map(|i| {
            let logits: Vec<f64> = (0..CLASSIFIER_LABELS.len())
                .map(|j| f64::from((i + j as u32) % 5) * 0.4)
                .collect();
            EmotionSample::from_logits(start + tick * i, &CLASSIFIER_LABELS, &logits)
        })
        .collect()
}

struct CannedFetcher;

impl RecommendationFetcher for CannedFetcher {
    fn fetch(&self, emotion: &str, quantity: u32) -> Result<Vec<Track>, FetchError> {
        Ok((0..quantity)
            .map(|i| Track::new(format!("{emotion}-{i}"), format!("Track {i}"), 100.0))
            .collect())
    }
}

fn create_benchmark_database() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("benchmark_tracks.db");

    let mut conn = db::init_database(&db_path, false).expect("Failed to create catalog");
    let classes = [MoodClass::Sad, MoodClass::Happy, MoodClass::Energetic, MoodClass::Calm];
    let tracks: Vec<CatalogTrack> = (0..5000)
        .map(|i| CatalogTrack {
            id: format!("track-{i}"),
            name: Some(format!("Track {i}")),
            tempo: 60.0 + f64::from(i % 120),
            label: Some(classes[i as usize % classes.len()] as i64),
            valence: Some(f64::from(i % 100) / 100.0),
            energy: Some(f64::from((i * 7) % 100) / 100.0),
        })
        .collect();
    db::insert_tracks(&mut conn, &tracks).expect("Failed to seed catalog");

    (temp_dir, db_path)
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let start = Instant::now();

    // 50 samples is a 10 s window at the default 200 ms tick.
    for count in [10u32, 50, 250] {
        let samples = create_samples(start, count);
        group.bench_with_input(BenchmarkId::new("flush_block", count), &samples, |b, samples| {
            b.iter_batched(
                || {
                    let mut aggregator = EmotionSampleAggregator::new(DEFAULT_WINDOW, start);
                    for sample in samples {
                        aggregator.add_sample(sample.clone());
                    }
                    aggregator
                },
                |mut aggregator| black_box(aggregator.maybe_flush(start + DEFAULT_WINDOW)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    group.bench_function("play_next_with_history", |b| {
        let mut session = MoodSession::new(SessionOptions::default(), Instant::now());
        session.select_emotion(&CannedFetcher, Emotion::Happy);
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| black_box(session.play_next(&mut rng)))
    });

    group.bench_function("end_of_track_updates", |b| {
        let mut session = MoodSession::new(SessionOptions::default(), Instant::now());
        session.select_emotion(&CannedFetcher, Emotion::Sad);
        let mut rng = StdRng::seed_from_u64(42);
        let duration = Duration::from_secs(180);
        b.iter(|| {
            session.on_playback_update(Duration::from_secs(10), duration, &mut rng);
            black_box(session.on_playback_update(duration, duration, &mut rng))
        })
    });

    group.finish();
}

fn benchmark_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");
    let (_temp_dir, db_path) = create_benchmark_database();
    let fetcher = SqliteFetcher::new(&db_path);

    for emotion in ["happy", "sad", "neutral"] {
        group.bench_with_input(BenchmarkId::new("fetch", emotion), &emotion, |b, emotion| {
            b.iter(|| black_box(fetcher.fetch(emotion, 5).expect("fetch failed")))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_aggregation, benchmark_selection, benchmark_catalog);

criterion_main!(benches);
