//! Boundary to whatever supplies candidate tracks for an emotion.

use crate::emotion::Emotion;
use crate::track::Track;
use std::ops::RangeInclusive;

/// Accepted values for the `quantity` argument of a fetch.
pub const QUANTITY_RANGE: RangeInclusive<u32> = 1..=50;

/// Number of tracks requested when the caller does not say otherwise.
pub const DEFAULT_QUANTITY: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid emotion `{0}`; expected one of neutral, happy, sad, angry, fearful, disgusted, surprised")]
    InvalidEmotion(String),
    #[error("quantity must be between 1 and 50, got {0}")]
    InvalidQuantity(u32),
    #[error("failed to fetch recommendations: {0}")]
    FetchFailure(String),
}

/// Source of recommendation candidates.
pub trait RecommendationFetcher {
    /// Return up to `quantity` tracks matching `emotion`, in random order.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidEmotion`] for an unknown label,
    /// [`FetchError::InvalidQuantity`] outside [`QUANTITY_RANGE`], and
    /// [`FetchError::FetchFailure`] when the backing store fails.
    fn fetch(&self, emotion: &str, quantity: u32) -> Result<Vec<Track>, FetchError>;
}

impl<F: RecommendationFetcher + ?Sized> RecommendationFetcher for &F {
    fn fetch(&self, emotion: &str, quantity: u32) -> Result<Vec<Track>, FetchError> {
        (**self).fetch(emotion, quantity)
    }
}

/// Validate fetch arguments the way every fetcher must.
///
/// # Errors
///
/// See [`RecommendationFetcher::fetch`].
pub fn validate_request(emotion: &str, quantity: u32) -> Result<Emotion, FetchError> {
    let emotion = emotion
        .parse::<Emotion>()
        .map_err(|_| FetchError::InvalidEmotion(emotion.to_string()))?;

    if !QUANTITY_RANGE.contains(&quantity) {
        return Err(FetchError::InvalidQuantity(quantity));
    }

    Ok(emotion)
}
