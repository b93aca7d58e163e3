//! # Integration Tests for MeloMoods
//!
//! End-to-end tests that drive a listening session against a real SQLite
//! catalog, and run the `melomoods` binary the way a user would.

use anyhow::Result;
use melomoods::db::{self, CatalogTrack, SqliteFetcher};
use melomoods::emotion::MoodClass;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn catalog_track(id: &str, label: MoodClass, valence: f64) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        name: Some(format!("Song {id}")),
        tempo: 110.0,
        label: Some(label as i64),
        valence: Some(valence),
        energy: Some(0.5),
    }
}

/// Test helper to create a temporary catalog with sample data
fn create_test_database() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("tracks.db");

    let mut conn = db::init_database(&db_path, false)?;
    let mut tracks = Vec::new();
    for i in 0..6 {
        tracks.push(catalog_track(&format!("happy-{i}"), MoodClass::Happy, 0.9));
        tracks.push(catalog_track(&format!("sad-{i}"), MoodClass::Sad, 0.1));
    }
    tracks.push(catalog_track("gloomy-happy", MoodClass::Happy, 0.3));
    tracks.push(catalog_track("calm-0", MoodClass::Calm, 0.5));
    db::insert_tracks(&mut conn, &tracks)?;

    Ok((temp_dir, db_path))
}

fn fetcher_for(db_path: &Path) -> SqliteFetcher {
    SqliteFetcher::new(db_path)
}

#[cfg(test)]
mod session_integration_tests {
    use super::*;
    use melomoods::emotion::{Emotion, EmotionSample, Expression};
    use melomoods::selector::SelectionSource;
    use melomoods::session::{Mode, MoodSession, SessionOptions};
    use melomoods::track::Track;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::{Duration, Instant};

    #[test]
    fn test_manual_selection_fills_slots_from_catalog() -> Result<()> {
        let (_dir, db_path) = create_test_database()?;
        let fetcher = fetcher_for(&db_path);
        let mut session = MoodSession::new(SessionOptions::default(), Instant::now());

        assert!(session.select_emotion(&fetcher, Emotion::Happy));

        let recs = session.recommendations();
        assert_eq!(recs.filled().count(), 5);
        assert_eq!(recs.current_emotion(), Some(Emotion::Happy));
        // Low-valence happy tracks are filtered out.
        assert!(recs.filled().all(|t| t.id.starts_with("happy-")));
        Ok(())
    }

    #[test]
    fn test_queue_wins_over_recommendations() -> Result<()> {
        let (_dir, db_path) = create_test_database()?;
        let fetcher = fetcher_for(&db_path);
        let mut session = MoodSession::new(SessionOptions::default(), Instant::now());
        let mut rng = StdRng::seed_from_u64(11);

        session.select_emotion(&fetcher, Emotion::Sad);
        let conn = db::connect(&db_path)?;
        let queued = db::find_track(&conn, "calm-0")?.expect("calm-0 is seeded");
        session.enqueue(queued.clone());

        let first = session.play_next(&mut rng).expect("queue is not empty");
        assert_eq!(first.track, queued);
        assert_eq!(first.source, SelectionSource::Queued);
        assert!(session.queue().is_empty());

        let second = session.play_next(&mut rng).expect("recommendations are loaded");
        assert!(second.track.id.starts_with("sad-"));
        assert_eq!(second.source, SelectionSource::Fresh);
        assert!(session.recent().is_recent("calm-0"));
        Ok(())
    }

    #[test]
    fn test_detector_blocks_drive_recommendations() -> Result<()> {
        let (_dir, db_path) = create_test_database()?;
        let fetcher = fetcher_for(&db_path);
        let start = Instant::now();
        let mut session = MoodSession::new(SessionOptions::default(), start);
        session.set_mode(Mode::Detector, start);

        let mut blocks = Vec::new();
        for i in 1..=100u64 {
            let now = start + Duration::from_millis(200 * i);
            let label = if i < 50 { "sadness" } else { "happiness" };
            let sample = EmotionSample::new(now, vec![Expression::new(label, 0.8)]);
            if let Some(block) = session.detection_tick_with(&fetcher, Some(sample), now) {
                blocks.push((block, session.recommendations().current_emotion()));
            }
        }

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].1, Some(Emotion::Sad));
        assert_eq!(blocks[1].1, Some(Emotion::Happy));
        Ok(())
    }

    #[test]
    fn test_faceless_block_keeps_recommendations() -> Result<()> {
        let (_dir, db_path) = create_test_database()?;
        let fetcher = fetcher_for(&db_path);
        let start = Instant::now();
        let mut session = MoodSession::new(SessionOptions::default(), start);
        session.select_emotion(&fetcher, Emotion::Sad);
        session.set_mode(Mode::Detector, start);

        let end = start + Duration::from_secs(10);
        let block = session.detection_tick_with(&fetcher, None, end).expect("block closes");

        assert!(block.is_empty());
        assert_eq!(session.recommendations().current_emotion(), Some(Emotion::Sad));
        Ok(())
    }

    #[test]
    fn test_repeat_fallback_when_catalog_is_exhausted() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("small.db");
        let mut conn = db::init_database(&db_path, false)?;
        db::insert_tracks(&mut conn, &[catalog_track("only", MoodClass::Calm, 0.5)])?;

        let fetcher = fetcher_for(&db_path);
        let mut session = MoodSession::new(SessionOptions::default(), Instant::now());
        let mut rng = StdRng::seed_from_u64(3);
        session.select_emotion(&fetcher, Emotion::Neutral);

        let first = session.play_next(&mut rng).expect("one track available");
        let second = session.play_next(&mut rng).expect("repeat allowed");
        assert_eq!(first.source, SelectionSource::Fresh);
        assert_eq!(second.source, SelectionSource::Repeat);
        assert_eq!(second.track, Track::new("only", "Song only", 110.0));
        assert_eq!(session.recent().count("only"), 2);
        Ok(())
    }

    #[test]
    fn test_missing_catalog_clears_slots() -> Result<()> {
        let (_dir, db_path) = create_test_database()?;
        let mut session = MoodSession::new(SessionOptions::default(), Instant::now());
        session.select_emotion(&fetcher_for(&db_path), Emotion::Happy);
        assert!(session.recommendations().has_any());

        let broken = fetcher_for(&db_path.with_file_name("missing.db"));
        session.select_emotion(&broken, Emotion::Sad);

        assert!(!session.recommendations().has_any());
        assert_eq!(session.recommendations().current_emotion(), None);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(session.play_next(&mut rng).is_none());
        Ok(())
    }
}

#[cfg(test)]
mod configuration_tests {
    use melomoods::config::{self, RuntimeConfig};
    use std::path::PathBuf;

    #[test]
    fn test_database_path_generation() -> anyhow::Result<()> {
        let db_path = config::get_db_path()?;
        assert!(db_path.to_string_lossy().contains("melomoods"));
        assert!(db_path.to_string_lossy().ends_with("tracks.db"));
        Ok(())
    }

    #[test]
    fn test_runtime_config_creation() {
        let config = RuntimeConfig::with_db_path(PathBuf::from("/tmp/test.db"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.tick(), std::time::Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use std::fs;

    fn melomoods(config_dir: &Path) -> Command {
        let config = config_dir.join("config.json");
        if !config.exists() {
            fs::write(&config, "{}").expect("Failed to write config");
        }
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_melomoods"));
        cmd.arg("--config").arg(config);
        cmd
    }

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = Command::new(env!("CARGO_BIN_EXE_melomoods"))
            .arg("--help")
            .output()
            .expect("Failed to run help command");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("melomoods"));
        assert!(stdout.contains("recommend"));
        assert!(stdout.contains("simulate"));
        assert!(stdout.contains("init-db"));
    }

    #[test]
    fn test_completion_generation() {
        let output = Command::new(env!("CARGO_BIN_EXE_melomoods"))
            .args(["completion", "bash"])
            .output()
            .expect("Failed to run completion command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("_melomoods"));
        assert!(stdout.contains("complete"));
    }

    #[test]
    fn test_emotions_lists_every_label() {
        let dir = TempDir::new().unwrap();
        let output = melomoods(dir.path())
            .arg("emotions")
            .output()
            .expect("Failed to run emotions command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        for label in ["neutral", "happy", "sad", "angry", "fearful", "disgusted", "surprised"] {
            assert!(stdout.contains(label), "missing {label}");
        }
    }

    #[test]
    fn test_init_import_recommend_workflow() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("tracks.db");
        let catalog = dir.path().join("catalog.json");
        fs::write(
            &catalog,
            r#"[{"id": "sunny", "name": "Sunny Day", "tempo": 120.0, "label": 1, "valence": 0.9},
                {"id": "rainy", "name": "Rainy Day", "tempo": 70.0, "label": 0, "valence": 0.1}]"#,
        )
        .unwrap();

        let init = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .arg("init-db")
            .output()
            .unwrap();
        assert!(init.status.success());

        let import = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .arg("import")
            .arg(&catalog)
            .output()
            .unwrap();
        assert!(import.status.success());
        assert!(String::from_utf8_lossy(&import.stdout).contains("Imported 2 tracks"));

        let recommend = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .args(["recommend", "happy"])
            .output()
            .unwrap();
        assert!(recommend.status.success());
        let stdout = String::from_utf8_lossy(&recommend.stdout);
        assert!(stdout.contains("Sunny Day"));
        assert!(!stdout.contains("Rainy Day"));

        let invalid = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .args(["recommend", "elated"])
            .output()
            .unwrap();
        assert!(!invalid.status.success());
    }

    #[test]
    fn test_init_db_refuses_to_overwrite() -> Result<()> {
        let (dir, db_path) = create_test_database()?;
        let output = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .arg("init-db")
            .output()?;

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
        Ok(())
    }

    #[test]
    fn test_simulate_replays_recording() -> Result<()> {
        let (dir, db_path) = create_test_database()?;
        let recording = dir.path().join("session.json");
        let ticks: Vec<String> = (1..=60)
            .map(|i| {
                format!(
                    r#"{{"at_ms": {}, "expressions": [{{"expression": "sadness", "confidence": 0.9}}]}}"#,
                    i * 200
                )
            })
            .collect();
        fs::write(&recording, format!("[{}]", ticks.join(",")))?;

        let output = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .arg("simulate")
            .arg(&recording)
            .args(["--queue", "calm-0", "--seed", "7"])
            .output()?;

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("mood: sadness"));
        assert!(stdout.contains("calm-0"));
        assert!(stdout.contains("Queued"));
        Ok(())
    }

    #[test]
    fn test_simulate_stamps_untimed_ticks_with_tick_interval() -> Result<()> {
        let (dir, db_path) = create_test_database()?;
        let recording = dir.path().join("untimed.json");
        let tick = r#"{"expressions": [{"expression": "happiness", "confidence": 0.9}]}"#;
        fs::write(&recording, format!("[{}]", vec![tick; 25].join(",")))?;

        // 25 ticks at 500 ms span 12.5 s, enough for one block.
        let slow = TempDir::new()?;
        fs::write(slow.path().join("config.json"), r#"{"tick_ms": 500}"#)?;
        let output = melomoods(slow.path())
            .arg("--db")
            .arg(&db_path)
            .arg("simulate")
            .arg(&recording)
            .output()?;
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("mood: happiness"));

        // At the default 200 ms they span 5 s, shorter than a block.
        let output = melomoods(dir.path())
            .arg("--db")
            .arg(&db_path)
            .arg("simulate")
            .arg(&recording)
            .output()?;
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("shorter than one mood block"));
        Ok(())
    }
}
