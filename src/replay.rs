//! Replay of recorded detector output through a session.
//!
//! A recording is a JSON array of ticks, each stamped in milliseconds from the
//! start of the recording:
//!
//! ```json
//! [
//!   {"at_ms": 200,  "expressions": [{"label": "happiness", "confidence": 0.71}]},
//!   {"at_ms": 400,  "expressions": null},
//!   {"at_ms": 600,  "logits": [0.1, 2.3, 0.0, 0.4, -1.0, 0.2, 0.0, -2.0]}
//! ]
//! ```
//!
//! `expressions: null` (or an empty tick) means no face was detected. Raw
//! `logits` are converted with [`EmotionSample::from_logits`]. A tick without
//! `at_ms` is stamped one detector tick after the tick before it.

use crate::aggregator::EmotionBlockResult;
use crate::emotion::{EmotionSample, Expression, CLASSIFIER_LABELS};
use crate::fetcher::RecommendationFetcher;
use crate::selector::Selection;
use crate::session::{Mode, MoodSession};
use crate::track::Track;
use anyhow::{Context, Result};
use log::{debug, info};
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// One recorded detector tick.
#[derive(Debug, Clone, Default)]
pub struct RecordedTick {
    pub at_ms: u64,
    pub expressions: Option<Vec<Expression>>,
    pub logits: Option<Vec<f64>>,
}

/// A tick as written in a recording file, possibly without a timestamp.
#[derive(Deserialize)]
struct RawTick {
    #[serde(default)]
    at_ms: Option<u64>,
    #[serde(default)]
    expressions: Option<Vec<Expression>>,
    #[serde(default)]
    logits: Option<Vec<f64>>,
}

impl RecordedTick {
    /// The sample this tick represents, or `None` for a tick without a face.
    pub fn to_sample(&self, start: Instant) -> Option<EmotionSample> {
        let timestamp = start + Duration::from_millis(self.at_ms);
        if let Some(expressions) = self.expressions.as_ref().filter(|e| !e.is_empty()) {
            return Some(EmotionSample::new(timestamp, expressions.clone()));
        }
        self.logits
            .as_ref()
            .filter(|l| !l.is_empty())
            .map(|logits| EmotionSample::from_logits(timestamp, &CLASSIFIER_LABELS, logits))
    }
}

/// Parse a recording, stamping ticks that lack `at_ms` `tick` after their
/// predecessor. The result is ordered by time.
///
/// # Errors
///
/// Fails if `raw` is not a JSON array of ticks.
pub fn parse_ticks(raw: &str, tick: Duration) -> Result<Vec<RecordedTick>> {
    let raw_ticks: Vec<RawTick> =
        serde_json::from_str(raw).context("Recording is not a JSON array of detector ticks")?;
    let step = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);

    let mut previous: u64 = 0;
    let mut ticks: Vec<RecordedTick> = raw_ticks
        .into_iter()
        .map(|t| {
            let at_ms = t.at_ms.unwrap_or_else(|| previous.saturating_add(step));
            previous = at_ms;
            RecordedTick {
                at_ms,
                expressions: t.expressions,
                logits: t.logits,
            }
        })
        .collect();
    ticks.sort_by_key(|t| t.at_ms);
    Ok(ticks)
}

/// Read a recording from `path`. See [`parse_ticks`].
///
/// # Errors
///
/// Fails if the file cannot be read or is not a JSON array of ticks.
pub fn load_ticks(path: &Path, tick: Duration) -> Result<Vec<RecordedTick>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    let ticks = parse_ticks(&raw, tick).with_context(|| format!("Invalid recording {}", path.display()))?;
    debug!("Loaded {} ticks from {}", ticks.len(), path.display());
    Ok(ticks)
}

/// What happened when a mood block closed during a replay.
#[derive(Debug, Clone)]
pub struct ReplayEvent {
    pub at: Duration,
    pub block: EmotionBlockResult,
    /// Recommendation slots right after the block, in slot order.
    pub recommendations: Vec<Track>,
    pub played: Option<Selection>,
}

/// Feed `ticks` through `session` in detector mode.
///
/// After every closed block the session advances one track, as a listener
/// pressing "next" once per block would. Returns one event per block.
pub fn replay<F, R>(
    session: &mut MoodSession,
    fetcher: &F,
    ticks: &[RecordedTick],
    start: Instant,
    rng: &mut R,
) -> Vec<ReplayEvent>
where
    F: RecommendationFetcher + ?Sized,
    R: Rng + ?Sized,
{
    session.set_mode(Mode::Detector, start);

    let mut events = Vec::new();
    for tick in ticks {
        let now = start + Duration::from_millis(tick.at_ms);
        if let Some(block) = session.detection_tick_with(fetcher, tick.to_sample(start), now) {
            let recommendations = session.recommendations().filled().cloned().collect();
            let played = session.play_next(rng);
            events.push(ReplayEvent {
                at: now - start,
                block,
                recommendations,
                played,
            });
        }
    }

    info!("Replayed {} ticks into {} mood blocks", ticks.len(), events.len());
    events
}
