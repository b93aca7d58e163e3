//! Emotion labels and the audio-feature criteria each one maps to.
//!
//! The recommender works on a small fixed set of emotion labels. Each label
//! carries an [`EmotionProfile`] describing which catalog tracks match it:
//! a mood class plus optional valence and energy ranges. A filter that is
//! `None` is ignored when querying the catalog.
//!
//! The facial-expression classifier speaks a slightly different vocabulary
//! (`happiness`, `sadness`, `contempt`, ...), so this module also normalizes
//! classifier labels and turns raw classifier logits into an
//! [`EmotionSample`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;

/// Output order of the FER+ style classifier the detector runs.
pub const CLASSIFIER_LABELS: [&str; 8] = [
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];

/// Softmax temperature applied to classifier logits.
pub const CLASSIFIER_TEMPERATURE: f64 = 0.5;

/// One of the emotion labels recommendations can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

/// Mood class stored in the catalog's `label` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoodClass {
    Sad = 0,
    Happy = 1,
    Energetic = 2,
    Calm = 3,
}

/// Inclusive range over an audio feature in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Catalog filter criteria for an emotion. `None` disables a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionProfile {
    pub label: Option<MoodClass>,
    pub valence: Option<FeatureRange>,
    pub energy: Option<FeatureRange>,
}

impl EmotionProfile {
    const UNFILTERED: Self = Self {
        label: None,
        valence: None,
        energy: None,
    };

    /// True when the profile filters nothing and any track matches.
    pub fn is_unfiltered(&self) -> bool {
        self.label.is_none() && self.valence.is_none() && self.energy.is_none()
    }
}

impl std::fmt::Display for EmotionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unfiltered() {
            return write!(f, "any track");
        }

        let mut parts = Vec::new();
        if let Some(label) = self.label {
            parts.push(format!("label={label:?}"));
        }
        if let Some(range) = self.valence {
            parts.push(format!("valence={:.2}..={:.2}", range.min, range.max));
        }
        if let Some(range) = self.energy {
            parts.push(format!("energy={:.2}..={:.2}", range.min, range.max));
        }
        write!(f, "{}", parts.join(", "))
    }
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgusted,
        Emotion::Surprised,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
            Emotion::Surprised => "surprised",
        }
    }

    #[must_use]
    pub const fn profile(self) -> EmotionProfile {
        match self {
            Emotion::Happy => EmotionProfile {
                label: Some(MoodClass::Happy),
                valence: Some(FeatureRange::new(0.7, 1.0)),
                energy: None,
            },
            Emotion::Sad => EmotionProfile {
                label: Some(MoodClass::Sad),
                valence: None,
                energy: None,
            },
            Emotion::Neutral
            | Emotion::Angry
            | Emotion::Fearful
            | Emotion::Disgusted
            | Emotion::Surprised => EmotionProfile::UNFILTERED,
        }
    }

    /// Map a classifier label onto an emotion.
    ///
    /// Accepts both the classifier vocabulary (`happiness`, `fear`, ...) and
    /// the canonical names. `contempt` has no counterpart and yields `None`.
    #[must_use]
    pub fn from_classifier_label(label: &str) -> Option<Self> {
        CLASSIFIER_ALIASES
            .get(label.trim().to_ascii_lowercase().as_str())
            .copied()
    }
}

lazy_static::lazy_static! {
    static ref CLASSIFIER_ALIASES: HashMap<&'static str, Emotion> = {
        let mut aliases: HashMap<&'static str, Emotion> =
            Emotion::ALL.iter().map(|e| (e.as_str(), *e)).collect();
        aliases.insert("happiness", Emotion::Happy);
        aliases.insert("sadness", Emotion::Sad);
        aliases.insert("anger", Emotion::Angry);
        aliases.insert("fear", Emotion::Fearful);
        aliases.insert("disgust", Emotion::Disgusted);
        aliases.insert("surprise", Emotion::Surprised);
        aliases
    };
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the enumerated emotion labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion `{0}`")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Emotion::ALL
            .iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// A single label/confidence pair from the classifier or from a block average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(alias = "expression")]
    pub label: String,
    pub confidence: f64,
}

impl Expression {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Classifier output for one detection tick.
#[derive(Debug, Clone)]
pub struct EmotionSample {
    pub timestamp: Instant,
    pub expressions: Vec<Expression>,
}

impl EmotionSample {
    pub fn new(timestamp: Instant, expressions: Vec<Expression>) -> Self {
        Self {
            timestamp,
            expressions,
        }
    }

    /// Build a sample from raw classifier logits.
    ///
    /// Logits are softmaxed at [`CLASSIFIER_TEMPERATURE`] and paired with
    /// `labels` by position, then sorted by descending confidence. Extra
    /// logits or labels beyond the shorter of the two are dropped.
    #[must_use]
    pub fn from_logits(timestamp: Instant, labels: &[&str], logits: &[f64]) -> Self {
        let probs = softmax(logits, CLASSIFIER_TEMPERATURE);
        let mut expressions: Vec<Expression> = labels
            .iter()
            .zip(probs)
            .map(|(label, p)| Expression::new(*label, p))
            .collect();
        expressions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            timestamp,
            expressions,
        }
    }
}

/// Temperature-scaled softmax. Empty input gives empty output.
#[must_use]
pub fn softmax(logits: &[f64], temperature: f64) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
