//! The five recommendation slots shown to the user.
//!
//! Slots are replaced wholesale whenever a fetch completes. Every fetch is
//! tagged with a [`RequestId`]; only the response to the most recently issued
//! request is applied, so a slow response that arrives after a newer request
//! was made is dropped.

use crate::emotion::Emotion;
use crate::fetcher::FetchError;
use crate::track::Track;
use log::{debug, error, info};

/// Number of recommendation slots.
pub const SLOT_COUNT: usize = 5;

/// Sequence number of an issued fetch. Strictly increasing per set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, Default)]
pub struct RecommendationSet {
    slots: [Option<Track>; SLOT_COUNT],
    emotion: Option<Emotion>,
    last_issued: u64,
    pending: Option<(RequestId, Emotion)>,
}

impl RecommendationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request id. Any earlier request becomes stale.
    pub fn begin_request(&mut self, emotion: Emotion) -> RequestId {
        self.last_issued += 1;
        let id = RequestId(self.last_issued);
        self.pending = Some((id, emotion));
        debug!("Issued recommendation request #{} for `{emotion}'", id.0);
        id
    }

    /// Apply the outcome of request `id`.
    ///
    /// Returns `false` when `id` is not the latest issued request, in which
    /// case nothing changes. A failed fetch empties every slot.
    pub fn complete(&mut self, id: RequestId, outcome: Result<Vec<Track>, FetchError>) -> bool {
        let emotion = match self.pending {
            Some((pending, emotion)) if pending == id => emotion,
            _ => {
                debug!("Discarding stale recommendation response #{}", id.0);
                return false;
            }
        };
        self.pending = None;

        match outcome {
            Ok(tracks) => {
                info!("Received {} recommendations for `{emotion}'", tracks.len());
                self.replace(tracks);
                self.emotion = Some(emotion);
            }
            Err(err) => {
                error!("Error fetching recommendations for `{emotion}': {err}");
                self.clear();
            }
        }
        true
    }

    fn replace(&mut self, tracks: Vec<Track>) {
        let mut incoming = tracks.into_iter();
        for slot in &mut self.slots {
            *slot = incoming.next();
        }
    }

    /// Empty every slot and forget the current emotion.
    pub fn clear(&mut self) {
        self.slots = Default::default();
        self.emotion = None;
    }

    pub fn slots(&self) -> &[Option<Track>] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Filled slots, in slot order.
    pub fn filled(&self) -> impl Iterator<Item = &Track> {
        self.slots.iter().flatten()
    }

    pub fn has_any(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Emotion the displayed slots were fetched for.
    pub fn current_emotion(&self) -> Option<Emotion> {
        self.emotion
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}
