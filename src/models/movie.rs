use serde::{Deserialize, Serialize};

use super::{ItemId, Rating};

/// A catalog entry. Owned by the data store; never created or deleted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub genre: String,
    pub duration: String,
}

/// A movie together with its ratings and their mean
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    pub ratings: Vec<Rating>,
    /// `None` when nobody has rated the movie yet
    pub average_rating: Option<f64>,
}
