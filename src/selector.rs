//! Play-next policy.
//!
//! Decides what plays when the current track ends or the user skips:
//!
//! 1. the front of the user queue, if any;
//! 2. otherwise a random recommendation that was not played recently;
//! 3. otherwise a random recommendation, even a recent one, so playback
//!    never stalls just because every candidate is a repeat;
//! 4. otherwise nothing.
//!
//! Whatever is chosen is recorded in the [`RecentPlayTracker`].

use crate::queue::PlaybackQueue;
use crate::recent::RecentPlayTracker;
use crate::recommendations::RecommendationSet;
use crate::track::Track;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

/// Which tier of the policy produced a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Dequeued from the user queue.
    Queued,
    /// A recommendation outside the recent-play window.
    Fresh,
    /// A recommendation picked even though every candidate was recent.
    Repeat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub track: Track,
    pub source: SelectionSource,
}

/// Pick the next track and record it as played.
///
/// Returns `None` without touching any state when the queue and the
/// recommendation set are both empty.
pub fn select_next<R: Rng + ?Sized>(
    queue: &mut PlaybackQueue,
    recent: &mut RecentPlayTracker,
    recommendations: &RecommendationSet,
    rng: &mut R,
) -> Option<Selection> {
    let selection = if let Some(track) = queue.dequeue() {
        Selection {
            track,
            source: SelectionSource::Queued,
        }
    } else {
        pick_recommendation(recent, recommendations, rng)?
    };

    recent.record_play(&selection.track);
    info!("Next track ({:?}): {}", selection.source, selection.track);
    Some(selection)
}

fn pick_recommendation<R: Rng + ?Sized>(
    recent: &RecentPlayTracker,
    recommendations: &RecommendationSet,
    rng: &mut R,
) -> Option<Selection> {
    let candidates: Vec<&Track> = recommendations.filled().collect();
    if candidates.is_empty() {
        debug!("Nothing queued and no recommendations; playback unchanged");
        return None;
    }

    let fresh: Vec<&Track> = candidates
        .iter()
        .copied()
        .filter(|track| !recent.is_recent(&track.id))
        .collect();

    let (pool, source) = if fresh.is_empty() {
        debug!("All {} recommendations played recently, allowing a repeat", candidates.len());
        (candidates, SelectionSource::Repeat)
    } else {
        (fresh, SelectionSource::Fresh)
    };

    pool.choose(rng).map(|track| Selection {
        track: (*track).clone(),
        source,
    })
}
