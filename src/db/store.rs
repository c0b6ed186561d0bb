use crate::{
    error::AppResult,
    models::{ItemId, Movie, Rating, RelationEdge, UserId},
};

/// Query capabilities the resolver and aggregator need from storage
///
/// Every failure to reach or query the backend is reported as an error whose
/// kind is `DependencyFailure`. Implementations must never answer with an
/// empty result in place of a failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// All relation edges whose primary id is one of `ids`
    async fn find_edges_by_primary_ids(&self, ids: &[ItemId]) -> AppResult<Vec<RelationEdge>>;

    async fn find_movie_by_id(&self, id: &ItemId) -> AppResult<Option<Movie>>;

    /// Bulk lookup for hydration. Unknown ids are skipped and order is unspecified.
    async fn find_movies_by_ids(&self, ids: &[ItemId]) -> AppResult<Vec<Movie>>;

    async fn find_ratings_by_movie_id(&self, id: &ItemId) -> AppResult<Vec<Rating>>;

    /// Creates the rating for `(movie_id, user_id)`.
    ///
    /// Backends enforce at most one rating per pair. If a concurrent writer
    /// created it first, that record is updated with `value` instead.
    async fn create_rating(
        &self,
        movie_id: &ItemId,
        user_id: &UserId,
        value: f64,
    ) -> AppResult<Rating>;

    async fn update_rating_value(&self, rating_id: &str, value: f64) -> AppResult<Rating>;
}
