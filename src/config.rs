//! # Configuration Module
//!
//! Data directory handling and runtime settings for MeloMoods.
//!
//! ## Data Storage
//!
//! The track catalog and the optional `config.json` live in the
//! platform-standard data directory:
//! - Linux: `~/.local/share/melomoods/`
//! - macOS: `~/Library/Application Support/melomoods/`
//! - Windows: `%APPDATA%\melomoods\`
//!
//! Every field of `config.json` is optional; missing fields take their
//! defaults.

use crate::aggregator::DEFAULT_WINDOW;
use crate::fetcher::{DEFAULT_QUANTITY, QUANTITY_RANGE};
use crate::recent::DEFAULT_CAPACITY;
use crate::session::SessionOptions;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "melomoods";
const DB_FILE: &str = "tracks.db";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate data directory, creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The melomoods subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create MeloMoods data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// `<data dir>/melomoods` without creating it.
fn app_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}

/// Returns the default track catalog path, `<data dir>/melomoods/tracks.db`.
///
/// # Errors
///
/// See [`get_data_dir`].
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Settings for a run of the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the track catalog
    pub db_path: PathBuf,
    /// Length of a mood block in seconds
    pub window_secs: u64,
    /// Detector tick interval in milliseconds, used to stamp recorded ticks
    /// that carry no timestamp
    pub tick_ms: u64,
    /// Plays remembered for repeat avoidance
    pub recent_capacity: usize,
    /// Tracks requested per recommendation fetch
    pub recommendation_quantity: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: app_dir().map_or_else(|| PathBuf::from(DB_FILE), |dir| dir.join(DB_FILE)),
            window_secs: DEFAULT_WINDOW.as_secs(),
            tick_ms: 200,
            recent_capacity: DEFAULT_CAPACITY,
            recommendation_quantity: DEFAULT_QUANTITY,
        }
    }
}

impl RuntimeConfig {
    /// Load `config.json` from the data directory, or defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        let Some(path) = app_dir().map(|dir| dir.join(CONFIG_FILE)) else {
            debug!("No data directory on this platform, using defaults");
            return Ok(Self::default());
        };
        if path.exists() {
            Self::from_file(&path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Read settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, parsed, or holds invalid values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Create configuration with explicit database path
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Fails when a value is outside the range the recommender accepts.
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            anyhow::bail!("window_secs must be at least 1");
        }
        if self.tick_ms == 0 {
            anyhow::bail!("tick_ms must be at least 1");
        }
        if self.recent_capacity == 0 {
            anyhow::bail!("recent_capacity must be at least 1");
        }
        if !QUANTITY_RANGE.contains(&self.recommendation_quantity) {
            anyhow::bail!(
                "recommendation_quantity must be between {} and {}, got {}",
                QUANTITY_RANGE.start(),
                QUANTITY_RANGE.end(),
                self.recommendation_quantity
            );
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            window: self.window(),
            recent_capacity: self.recent_capacity,
            quantity: self.recommendation_quantity,
        }
    }
}
