//! Bounded history of recently played tracks.
//!
//! Keeps the ids of the last `capacity` plays in order, plus a per-id play
//! count and a membership set so "was this played recently?" is O(1). A
//! track played twice inside the window stays recent until *both* plays have
//! aged out.

use crate::track::Track;
use log::trace;
use std::collections::{HashMap, HashSet, VecDeque};

/// Number of plays remembered by default.
pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct RecentPlayTracker {
    capacity: usize,
    history: VecDeque<String>,
    counts: HashMap<String, usize>,
    members: HashSet<String>,
}

impl Default for RecentPlayTracker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RecentPlayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            history: VecDeque::with_capacity(capacity + 1),
            counts: HashMap::new(),
            members: HashSet::new(),
        }
    }

    pub fn record_play(&mut self, track: &Track) {
        self.history.push_back(track.id.clone());
        *self.counts.entry(track.id.clone()).or_insert(0) += 1;
        self.members.insert(track.id.clone());

        while self.history.len() > self.capacity {
            let Some(evicted) = self.history.pop_front() else {
                break;
            };
            self.forget_one(&evicted);
        }
    }

    fn forget_one(&mut self, id: &str) {
        let remaining = match self.counts.get_mut(id) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };

        if remaining == 0 {
            self.counts.remove(id);
            self.members.remove(id);
            trace!("Track `{id}' is no longer recent");
        }
    }

    pub fn is_recent(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// How many of the remembered plays were of `id`.
    pub fn count(&self, id: &str) -> usize {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remembered ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }
}
