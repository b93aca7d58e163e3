//! Track representation shared by the queue, the recent-play tracker and the
//! recommendation set.

use serde::{Deserialize, Serialize};

/// A playable track as returned by a recommendation fetch.
///
/// Identity is the `id` alone: two tracks with the same id are the same track
/// even if their resolved names differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Player-facing identifier (e.g. a streaming service track id).
    pub id: String,
    /// Human-readable name, resolved by the fetcher.
    pub name: String,
    /// Tempo in beats per minute.
    pub tempo: f64,
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tempo: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tempo,
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl std::hash::Hash for Track {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] ({:.0} bpm)", self.name, self.id, self.tempo)
    }
}
