//! SQLite track catalog.
//!
//! Each row is a track with the audio features recommendations filter on:
//!
//! ```text
//! tracks(id TEXT PRIMARY KEY, name TEXT, tempo REAL, label INTEGER,
//!        valence REAL, energy REAL)
//! ```
//!
//! `label` is a [`MoodClass`](crate::emotion::MoodClass) discriminant,
//! `valence` and `energy` are in `[0, 1]`. `name` may be missing, in which
//! case the fetcher asks a [`NameResolver`] for it.

use crate::emotion::{Emotion, EmotionProfile};
use crate::fetcher::{self, FetchError, RecommendationFetcher};
use crate::track::Track;
use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tracks (
    id      TEXT PRIMARY KEY,
    name    TEXT,
    tempo   REAL NOT NULL,
    label   INTEGER,
    valence REAL,
    energy  REAL
);
CREATE INDEX IF NOT EXISTS idx_tracks_label ON tracks(label);";

/// A catalog row, as imported from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub tempo: f64,
    #[serde(default)]
    pub label: Option<i64>,
    #[serde(default)]
    pub valence: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
}

/// Open the catalog at `path`, creating its parent directory if needed.
///
/// # Errors
///
/// Fails if the directory cannot be created or the file cannot be opened as
/// a SQLite database.
pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Connection::open(path)
        .with_context(|| format!("Failed to open track database at {}", path.display()))
}

/// Create the catalog schema. With `force`, an existing database is removed first.
///
/// # Errors
///
/// Fails if the database exists and `force` is not set, or on any SQLite error.
pub fn init_database(path: &Path, force: bool) -> Result<Connection> {
    if path.exists() {
        if !force {
            anyhow::bail!(
                "Database already exists at {}. Use --force to recreate it.",
                path.display()
            );
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing database {}", path.display()))?;
        info!("Removed existing database at {}", path.display());
    }

    let conn = connect(path)?;
    create_schema(&conn)?;
    info!("Initialized track database at {}", path.display());
    Ok(conn)
}

/// Create the `tracks` table on an open connection if it is missing.
///
/// # Errors
///
/// Fails on any SQLite error.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create tracks table")
}

/// Insert or replace `tracks` in one transaction. Returns the number written.
///
/// # Errors
///
/// Fails on any SQLite error; nothing is written in that case.
pub fn insert_tracks(conn: &mut Connection, tracks: &[CatalogTrack]) -> Result<usize> {
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO tracks (id, name, tempo, label, valence, energy)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for track in tracks {
            stmt.execute(params![
                track.id,
                track.name,
                track.tempo,
                track.label,
                track.valence,
                track.energy
            ])
            .with_context(|| format!("Failed to insert track {track:?}"))?;
        }
    }

    tx.commit().context("Committing track import failed")?;
    debug!("Inserted {} tracks", tracks.len());
    Ok(tracks.len())
}

/// Load a JSON array of [`CatalogTrack`] from `file` into the catalog.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or on any SQLite error.
pub fn import_json(conn: &mut Connection, file: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let tracks: Vec<CatalogTrack> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of tracks", file.display()))?;

    for track in &tracks {
        if track.valence.is_some_and(|v| !(0.0..=1.0).contains(&v))
            || track.energy.is_some_and(|e| !(0.0..=1.0).contains(&e))
        {
            warn!("Track {} has audio features outside [0, 1]", track.id);
        }
    }

    insert_tracks(conn, &tracks)
}

/// Number of tracks in the catalog.
///
/// # Errors
///
/// Fails on any SQLite error.
pub fn count_tracks(conn: &Connection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))
        .context("Could not count tracks")
}

/// Look up a single track by id. The stored name, or the id, is used as its name.
///
/// # Errors
///
/// Fails on any SQLite error.
pub fn find_track(conn: &Connection, id: &str) -> Result<Option<Track>> {
    conn.query_row(
        "SELECT id, name, tempo FROM tracks WHERE id = ?1",
        [id],
        |row| {
            let id: String = row.get(0)?;
            let name: Option<String> = row.get(1)?;
            Ok(Track {
                name: name.unwrap_or_else(|| id.clone()),
                id,
                tempo: row.get(2)?,
            })
        },
    )
    .optional()
    .with_context(|| format!("Failed to look up track {id}"))
}

/// Build the WHERE clause and parameters for an emotion profile.
fn profile_filter(profile: &EmotionProfile) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(label) = profile.label {
        clauses.push("label = ?");
        values.push(Value::Integer(label as i64));
    }
    if let Some(range) = profile.valence {
        clauses.push("valence BETWEEN ? AND ?");
        values.push(Value::Real(range.min));
        values.push(Value::Real(range.max));
    }
    if let Some(range) = profile.energy {
        clauses.push("energy BETWEEN ? AND ?");
        values.push(Value::Real(range.min));
        values.push(Value::Real(range.max));
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

/// Pick up to `quantity` random tracks matching `emotion`.
///
/// Returns rows with the stored name, which may be missing.
///
/// # Errors
///
/// Fails on any SQLite error.
pub fn random_tracks_for(
    conn: &Connection,
    emotion: Emotion,
    quantity: u32,
) -> Result<Vec<(String, Option<String>, f64)>> {
    let (clause, mut values) = profile_filter(&emotion.profile());
    let sql = format!("SELECT id, name, tempo FROM tracks{clause} ORDER BY RANDOM() LIMIT ?");
    values.push(Value::Integer(i64::from(quantity)));
    trace!("Recommendation query for `{emotion}': {sql}");

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Invalid recommendation query: {sql}"))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .context("Cannot query tracks")?;

    let mut tracks = Vec::new();
    for row in rows {
        tracks.push(row.context("Queried track row is malformed")?);
    }
    Ok(tracks)
}

/// Resolves a human-readable name for a track id.
pub trait NameResolver {
    /// # Errors
    ///
    /// Implementations report lookup failures; the fetcher then falls back
    /// to the id.
    fn resolve(&self, id: &str) -> Result<Option<String>>;
}

/// Resolver that never knows a name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl NameResolver for NoLookup {
    fn resolve(&self, _id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

impl<F> NameResolver for F
where
    F: Fn(&str) -> Result<Option<String>>,
{
    fn resolve(&self, id: &str) -> Result<Option<String>> {
        self(id)
    }
}

/// [`RecommendationFetcher`] over the SQLite catalog.
pub struct SqliteFetcher<N = NoLookup> {
    db_path: PathBuf,
    resolver: N,
}

impl SqliteFetcher<NoLookup> {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            resolver: NoLookup,
        }
    }
}

impl<N: NameResolver> SqliteFetcher<N> {
    pub fn with_resolver<M: NameResolver>(self, resolver: M) -> SqliteFetcher<M> {
        SqliteFetcher {
            db_path: self.db_path,
            resolver,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn resolve_name(&self, id: &str, stored: Option<String>) -> String {
        if let Some(name) = stored.filter(|n| !n.trim().is_empty()) {
            return name;
        }
        match self.resolver.resolve(id) {
            Ok(Some(name)) => name,
            Ok(None) => id.to_string(),
            Err(err) => {
                warn!("Name lookup for {id} failed: {err:#}");
                id.to_string()
            }
        }
    }

    fn query(&self, emotion: Emotion, quantity: u32) -> Result<Vec<Track>> {
        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open track database at {}", self.db_path.display()))?;

        let rows = random_tracks_for(&conn, emotion, quantity)?;
        Ok(rows
            .into_iter()
            .map(|(id, name, tempo)| {
                let name = self.resolve_name(&id, name);
                Track { id, name, tempo }
            })
            .collect())
    }
}

impl<N: NameResolver> RecommendationFetcher for SqliteFetcher<N> {
    fn fetch(&self, emotion: &str, quantity: u32) -> Result<Vec<Track>, FetchError> {
        let emotion = fetcher::validate_request(emotion, quantity)?;
        self.query(emotion, quantity)
            .map_err(|err| FetchError::FetchFailure(format!("{err:#}")))
    }
}
