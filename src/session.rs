//! Per-listener session state.
//!
//! A [`MoodSession`] owns everything that changes while someone listens: the
//! mood aggregator, the user queue, the recent-play history, the current
//! recommendations and the now-playing track. Nothing here is global; create
//! one session per listener.
//!
//! All methods take `&mut self` and run synchronously. A host with real
//! parallelism must keep the session behind one `Mutex` or inside a single
//! task. Fetching is split into [`MoodSession::request_recommendations`] and
//! [`MoodSession::complete_recommendations`] so an asynchronous host can run
//! the fetch itself; late responses to superseded requests are ignored.

use crate::aggregator::{EmotionBlockResult, EmotionSampleAggregator, DEFAULT_WINDOW};
use crate::emotion::{Emotion, EmotionSample};
use crate::fetcher::{FetchError, RecommendationFetcher, DEFAULT_QUANTITY};
use crate::queue::PlaybackQueue;
use crate::recent::{RecentPlayTracker, DEFAULT_CAPACITY};
use crate::recommendations::{RecommendationSet, RequestId};
use crate::selector::{self, Selection};
use crate::track::Track;
use log::{debug, info};
use rand::Rng;
use std::time::{Duration, Instant};

/// How close to the end of a track a playback update must be to advance.
pub const END_OF_TRACK_THRESHOLD: Duration = Duration::from_millis(150);

/// Where mood input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The user picks emotions by hand; detector ticks are ignored.
    #[default]
    Manual,
    /// Mood blocks from the detector drive recommendations.
    Detector,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub window: Duration,
    pub recent_capacity: usize,
    pub quantity: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            recent_capacity: DEFAULT_CAPACITY,
            quantity: DEFAULT_QUANTITY,
        }
    }
}

/// A fetch the host has to perform and report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFetch {
    pub id: RequestId,
    pub emotion: Emotion,
    pub quantity: u32,
}

/// A completed mood block, plus the fetch it triggered, if any.
#[derive(Debug, Clone)]
pub struct MoodBlock {
    pub result: EmotionBlockResult,
    pub fetch: Option<PendingFetch>,
}

#[derive(Debug)]
pub struct MoodSession {
    options: SessionOptions,
    mode: Mode,
    aggregator: EmotionSampleAggregator,
    queue: PlaybackQueue,
    recent: RecentPlayTracker,
    recommendations: RecommendationSet,
    now_playing: Option<Track>,
    end_handled: bool,
}

impl MoodSession {
    pub fn new(options: SessionOptions, now: Instant) -> Self {
        Self {
            aggregator: EmotionSampleAggregator::new(options.window, now),
            recent: RecentPlayTracker::with_capacity(options.recent_capacity),
            queue: PlaybackQueue::new(),
            recommendations: RecommendationSet::new(),
            mode: Mode::default(),
            now_playing: None,
            end_handled: false,
            options,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch input mode. Entering detector mode starts a fresh block at `now`.
    pub fn set_mode(&mut self, mode: Mode, now: Instant) {
        if mode == self.mode {
            return;
        }
        info!("Switching mood input from {:?} to {:?}", self.mode, mode);
        self.mode = mode;
        self.aggregator.reset(now);
    }

    // --- Recommendations ---

    /// Start a fetch for `emotion`. Any fetch still outstanding becomes stale.
    pub fn request_recommendations(&mut self, emotion: Emotion) -> PendingFetch {
        PendingFetch {
            id: self.recommendations.begin_request(emotion),
            emotion,
            quantity: self.options.quantity,
        }
    }

    /// Report the outcome of `pending`. Returns `false` if it was superseded.
    pub fn complete_recommendations(
        &mut self,
        pending: PendingFetch,
        outcome: Result<Vec<Track>, FetchError>,
    ) -> bool {
        self.recommendations.complete(pending.id, outcome)
    }

    /// Fetch and apply recommendations for `emotion` in one step.
    pub fn refresh<F: RecommendationFetcher + ?Sized>(&mut self, fetcher: &F, emotion: Emotion) -> bool {
        let pending = self.request_recommendations(emotion);
        let outcome = fetcher.fetch(pending.emotion.as_str(), pending.quantity);
        self.complete_recommendations(pending, outcome)
    }

    /// Manual emotion pick.
    pub fn select_emotion<F: RecommendationFetcher + ?Sized>(&mut self, fetcher: &F, emotion: Emotion) -> bool {
        info!("Emotion `{emotion}' selected");
        self.refresh(fetcher, emotion)
    }

    // --- Detector ---

    /// Feed one detector tick.
    ///
    /// `sample` is `None` when no face was found. The block is checked before
    /// the sample is buffered, so a sample taken at the moment a block closes
    /// opens the next one. Ignored entirely in manual mode.
    pub fn detection_tick(&mut self, sample: Option<EmotionSample>, now: Instant) -> Option<MoodBlock> {
        if self.mode == Mode::Manual {
            return None;
        }

        let block = self.aggregator.maybe_flush(now);
        if let Some(sample) = sample {
            self.aggregator.add_sample(sample);
        }

        block.map(|result| {
            let fetch = match result.dominant_emotion() {
                Some(emotion) => {
                    info!("Detected emotion: {emotion}");
                    Some(self.request_recommendations(emotion))
                }
                None => {
                    debug!("No usable mood signal in this block");
                    None
                }
            };
            MoodBlock { result, fetch }
        })
    }

    /// [`Self::detection_tick`] with the fetch performed synchronously.
    pub fn detection_tick_with<F: RecommendationFetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        sample: Option<EmotionSample>,
        now: Instant,
    ) -> Option<EmotionBlockResult> {
        let block = self.detection_tick(sample, now)?;
        if let Some(pending) = block.fetch {
            let outcome = fetcher.fetch(pending.emotion.as_str(), pending.quantity);
            self.complete_recommendations(pending, outcome);
        }
        Some(block.result)
    }

    // --- Queue ---

    pub fn enqueue(&mut self, track: Track) {
        self.queue.enqueue(track);
    }

    /// Queue the recommendation in `slot`. Returns `false` for an empty slot.
    pub fn enqueue_recommended(&mut self, slot: usize) -> bool {
        match self.recommendations.get(slot) {
            Some(track) => {
                let track = track.clone();
                self.queue.enqueue(track);
                true
            }
            None => false,
        }
    }

    pub fn remove_from_queue(&mut self, index: usize) -> Option<Track> {
        self.queue.remove_at(index)
    }

    pub fn queue_snapshot(&self) -> Vec<Track> {
        self.queue.snapshot()
    }

    /// Empty both the user queue and the recommendation slots.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.recommendations.clear();
    }

    // --- Playback ---

    /// Advance to the next track. `None` leaves playback unchanged.
    pub fn play_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Selection> {
        let selection = selector::select_next(
            &mut self.queue,
            &mut self.recent,
            &self.recommendations,
            rng,
        )?;
        self.now_playing = Some(selection.track.clone());
        Some(selection)
    }

    /// Handle a position update from the player.
    ///
    /// Advances once when `position` comes within
    /// [`END_OF_TRACK_THRESHOLD`] of `duration`. Once a track was chosen,
    /// further near-end updates are ignored until an update shows playback
    /// away from the end again. With nothing to play, every near-end update
    /// tries again.
    pub fn on_playback_update<R: Rng + ?Sized>(
        &mut self,
        position: Duration,
        duration: Duration,
        rng: &mut R,
    ) -> Option<Selection> {
        if position < duration.saturating_sub(END_OF_TRACK_THRESHOLD) {
            self.end_handled = false;
            return None;
        }
        if self.end_handled {
            return None;
        }
        debug!("Track near its end ({position:?} of {duration:?})");
        // Stay armed while there is nothing to play.
        let next = self.play_next(rng);
        self.end_handled = next.is_some();
        next
    }

    // --- Accessors ---

    pub fn now_playing(&self) -> Option<&Track> {
        self.now_playing.as_ref()
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn recent(&self) -> &RecentPlayTracker {
        &self.recent
    }

    pub fn recommendations(&self) -> &RecommendationSet {
        &self.recommendations
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}
