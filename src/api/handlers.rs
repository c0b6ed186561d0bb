use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::{CurrentUser, RequestId},
    models::{ItemId, Movie, MovieDetails, Rating, RatingValue},
};

use super::extract::JsonBody;
use super::state::RelatedDepth;
use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub depth: Option<String>,
}

/// Fields are kept raw so that wrong types surface as invalid arguments
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRatingRequest {
    #[serde(default, alias = "movie_id")]
    pub movie_id: Value,
    #[serde(default, alias = "rating_value")]
    pub rating_value: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub movie_id: ItemId,
    pub ratings: Vec<Rating>,
    pub average_rating: Option<f64>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// A movie with its ratings and average
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<MovieDetails>> {
    let movie_id = ItemId::parse(movie_id)?;

    let movie = state
        .catalog
        .get_movie(&movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {}", movie_id)))?;

    Ok(Json(state.ratings.summarize(movie).await?))
}

/// Movies related to `movie_id` within the requested number of hops
pub async fn get_related(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(movie_id): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movie_id = ItemId::parse(movie_id)?;
    let depth = parse_depth(query.depth.as_deref(), state.related_depth)?;

    let related = state.resolver.resolve_id(&movie_id, depth).await?;
    let movies = state.catalog.hydrate(&related).await?;

    tracing::info!(
        request_id = %request_id,
        movie_id = %movie_id,
        depth,
        related = related.len(),
        hydrated = movies.len(),
        "Resolved related movies"
    );

    Ok(Json(movies))
}

/// Creates or replaces the caller's rating of a movie
pub async fn upsert_rating(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(request): JsonBody<UpsertRatingRequest>,
) -> AppResult<Json<RatingResponse>> {
    let movie_id = match request.movie_id {
        Value::String(raw) => ItemId::parse(raw)?,
        Value::Null => return Err(AppError::InvalidArgument("Missing movie id".to_string())),
        other => {
            return Err(AppError::InvalidArgument(format!(
                "Movie id must be a string, got {}",
                other
            )))
        }
    };
    let value = RatingValue::from_json(&request.rating_value)?;

    tracing::info!(
        request_id = %request_id,
        movie_id = %movie_id,
        user_id = %user_id,
        "Processing rating upsert"
    );

    let result = state
        .ratings
        .upsert_rating(movie_id.as_str(), &user_id, value.get())
        .await?;

    Ok(Json(RatingResponse {
        movie_id,
        ratings: result.ratings,
        average_rating: result.average_rating,
    }))
}

fn parse_depth(raw: Option<&str>, bounds: RelatedDepth) -> AppResult<u32> {
    let Some(raw) = raw else {
        return Ok(bounds.default);
    };

    let depth: u32 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidArgument(format!("Invalid depth: {}", raw)))?;

    if depth > bounds.limit {
        return Err(AppError::InvalidArgument(format!(
            "Depth {} exceeds the limit of {}",
            depth, bounds.limit
        )));
    }

    Ok(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: RelatedDepth = RelatedDepth {
        default: 3,
        limit: 5,
    };

    #[test]
    fn test_parse_depth_defaults() {
        assert_eq!(parse_depth(None, BOUNDS).unwrap(), 3);
    }

    #[test]
    fn test_parse_depth_accepts_range() {
        assert_eq!(parse_depth(Some("0"), BOUNDS).unwrap(), 0);
        assert_eq!(parse_depth(Some("5"), BOUNDS).unwrap(), 5);
    }

    #[test]
    fn test_parse_depth_rejects_bad_values() {
        for raw in ["-1", "six", "6", ""] {
            assert!(parse_depth(Some(raw), BOUNDS).is_err(), "accepted {:?}", raw);
        }
    }
}
