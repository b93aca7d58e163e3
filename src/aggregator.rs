//! Time-weighted aggregation of classifier samples into mood blocks.
//!
//! The detector produces a noisy sample roughly every 200 ms. Rather than
//! reacting to each one, samples are collected into fixed-length blocks
//! (10 s by default). When a block completes, every expression label seen in
//! it is averaged with a linear ramp weight: a sample taken at the start of
//! the block counts for nothing and one taken at the end counts fully, so the
//! result tracks the mood at the *end* of the block.
//!
//! ```text
//! weight(t)  = clamp((t - block_start) / (block_end - block_start), 0, 1)
//! avg(label) = Σ confidence·weight / Σ weight      (0 when Σ weight == 0)
//! ```
//!
//! The aggregator never schedules anything itself. The caller polls
//! [`EmotionSampleAggregator::maybe_flush`] on whatever clock it has.

use crate::emotion::{Emotion, EmotionSample, Expression};
use log::{debug, trace};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default block length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Weighted average for one completed block, sorted by descending confidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionBlockResult {
    pub expressions: Vec<Expression>,
}

impl EmotionBlockResult {
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Highest-confidence expression of the block.
    pub fn dominant(&self) -> Option<&Expression> {
        self.expressions.first()
    }

    /// Highest-confidence expression that maps onto a known [`Emotion`].
    ///
    /// Classifier-only labels such as `contempt` are skipped.
    pub fn dominant_emotion(&self) -> Option<Emotion> {
        self.expressions
            .iter()
            .find_map(|e| Emotion::from_classifier_label(&e.label))
    }
}

/// Collects samples for the in-progress block.
#[derive(Debug, Clone)]
pub struct EmotionSampleAggregator {
    window: Duration,
    block_start: Instant,
    buffer: Vec<EmotionSample>,
}

impl EmotionSampleAggregator {
    pub fn new(window: Duration, start: Instant) -> Self {
        Self {
            window,
            block_start: start,
            buffer: Vec::new(),
        }
    }

    pub fn add_sample(&mut self, sample: EmotionSample) {
        trace!("Buffered sample with {} expressions", sample.expressions.len());
        self.buffer.push(sample);
    }

    /// Close the current block if `window` has elapsed since it started.
    ///
    /// Returns `None` and leaves all state untouched when the block is still
    /// open. An elapsed block with no samples yields an empty result.
    pub fn maybe_flush(&mut self, now: Instant) -> Option<EmotionBlockResult> {
        if now.saturating_duration_since(self.block_start) < self.window {
            return None;
        }

        let result = weighted_average(&self.buffer, self.block_start, now);
        debug!(
            "Closed mood block of {} samples, dominant: {:?}",
            self.buffer.len(),
            result.dominant().map(|e| e.label.as_str())
        );

        self.buffer.clear();
        self.block_start = now;
        Some(result)
    }

    /// Drop buffered samples and start a fresh block at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.buffer.clear();
        self.block_start = now;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn block_start(&self) -> Instant {
        self.block_start
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

fn ramp_weight(timestamp: Instant, start: Instant, span: Duration) -> f64 {
    if span.is_zero() {
        return 1.0;
    }
    // Samples stamped before the block start clamp to zero.
    let offset = timestamp.saturating_duration_since(start);
    (offset.as_secs_f64() / span.as_secs_f64()).clamp(0.0, 1.0)
}

fn weighted_average(samples: &[EmotionSample], start: Instant, end: Instant) -> EmotionBlockResult {
    let span = end.saturating_duration_since(start);

    // label -> (Σ confidence·weight, Σ weight); `order` keeps first occurrence.
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for sample in samples {
        let weight = ramp_weight(sample.timestamp, start, span);
        for expr in &sample.expressions {
            let entry = totals.entry(expr.label.as_str()).or_insert_with(|| {
                order.push(expr.label.as_str());
                (0.0, 0.0)
            });
            entry.0 += expr.confidence * weight;
            entry.1 += weight;
        }
    }

    let mut expressions: Vec<Expression> = order
        .into_iter()
        .map(|label| {
            let (total, weight_sum) = totals[label];
            let confidence = if weight_sum > 0.0 { total / weight_sum } else { 0.0 };
            Expression::new(label, confidence)
        })
        .collect();

    // `sort_by` is stable, so ties keep first-occurrence order.
    expressions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    EmotionBlockResult { expressions }
}
