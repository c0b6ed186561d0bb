use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemId, UserId};
use crate::error::{AppError, AppResult};

/// A single user's score for a movie. At most one exists per (movie, user).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub movie_id: ItemId,
    pub user_id: UserId,
    pub value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rating score accepted from a caller.
///
/// Scores are not range checked; they only have to be finite numbers so that
/// sums and means stay meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingValue(f64);

impl RatingValue {
    pub fn new(value: f64) -> AppResult<Self> {
        if !value.is_finite() {
            return Err(AppError::InvalidArgument(format!(
                "Invalid rating value: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Accepts a raw JSON value, rejecting anything that is not a number
    pub fn from_json(value: &serde_json::Value) -> AppResult<Self> {
        match value.as_f64() {
            Some(v) => Self::new(v),
            None => Err(AppError::InvalidArgument(format!(
                "Rating value must be a number, got {}",
                value
            ))),
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Ratings of a movie after a write, with their recomputed mean
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub ratings: Vec<Rating>,
    pub average_rating: Option<f64>,
}

impl AggregateResult {
    pub fn from_ratings(ratings: Vec<Rating>) -> Self {
        let average_rating = average_rating(&ratings);
        Self {
            ratings,
            average_rating,
        }
    }
}

/// Arithmetic mean of the rating values, or `None` for an empty slice
pub fn average_rating(ratings: &[Rating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let total: f64 = ratings.iter().map(|r| r.value).sum();
    Some(total / ratings.len() as f64)
}
