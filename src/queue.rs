//! User play queue.
//!
//! Tracks the user explicitly lined up. The selector drains this before it
//! falls back to recommendations. Order is FIFO except that the user may
//! delete any entry by position.

use crate::track::Track;
use log::debug;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    tracks: VecDeque<Track>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, track: Track) {
        debug!("Queued `{}' at position {}", track.name, self.tracks.len());
        self.tracks.push_back(track);
    }

    pub fn dequeue(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Remove the entry at `index`. Out-of-range indices leave the queue as is.
    pub fn remove_at(&mut self, index: usize) -> Option<Track> {
        self.tracks.remove(index)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn size(&self) -> usize {
        self.tracks.len()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn front(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Copy of the queue in play order, for display.
    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }
}
