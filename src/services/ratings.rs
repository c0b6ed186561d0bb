//! Per-user rating upserts and the running mean.

use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{AggregateResult, ItemId, Movie, MovieDetails, RatingValue, UserId},
};

/// Applies rating writes and recomputes the movie's average
///
/// Holds no state between calls. The find-then-write sequence is not atomic
/// here: at most one rating per (movie, user) is guaranteed by the store's
/// own uniqueness rule on `create_rating`.
pub struct RatingAggregator {
    store: Arc<dyn CatalogStore>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Sets `user_id`'s rating of `movie_id` to `value`
    ///
    /// Updates the user's existing rating in place, or creates one. The
    /// returned ratings and average are read back from the store after the
    /// write. All arguments are validated before the store is contacted.
    #[instrument(skip(self, value))]
    pub async fn upsert_rating(
        &self,
        movie_id: &str,
        user_id: &str,
        value: f64,
    ) -> AppResult<AggregateResult> {
        let movie_id = ItemId::parse(movie_id)?;
        let user_id = UserId::parse(user_id)?;
        let value = RatingValue::new(value)?;

        if self.store.find_movie_by_id(&movie_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Movie {}", movie_id)));
        }

        let current = self.store.find_ratings_by_movie_id(&movie_id).await?;
        let existing = current.iter().find(|rating| rating.user_id == user_id);

        match existing {
            Some(rating) => {
                self.store
                    .update_rating_value(&rating.id, value.get())
                    .await?;
                tracing::info!(
                    movie_id = %movie_id,
                    rating_id = %rating.id,
                    previous = rating.value,
                    value = value.get(),
                    "Updated rating"
                );
            }
            None => {
                let rating = self
                    .store
                    .create_rating(&movie_id, &user_id, value.get())
                    .await?;
                tracing::info!(
                    movie_id = %movie_id,
                    rating_id = %rating.id,
                    value = value.get(),
                    "Created rating"
                );
            }
        }

        let ratings = self.store.find_ratings_by_movie_id(&movie_id).await?;
        let result = AggregateResult::from_ratings(ratings);

        tracing::debug!(
            movie_id = %movie_id,
            count = result.ratings.len(),
            average = ?result.average_rating,
            "Recomputed average rating"
        );

        Ok(result)
    }

    /// Attaches the current ratings and their mean to `movie`
    pub async fn summarize(&self, movie: Movie) -> AppResult<MovieDetails> {
        let ratings = self.store.find_ratings_by_movie_id(&movie.id).await?;
        let AggregateResult {
            ratings,
            average_rating,
        } = AggregateResult::from_ratings(ratings);

        Ok(MovieDetails {
            movie,
            ratings,
            average_rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, MockCatalogStore};
    use crate::error::ErrorKind;
    use tokio_test::{assert_err, assert_ok};

    fn movie(id: &str) -> Movie {
        Movie {
            id: ItemId::parse(id).unwrap(),
            title: "Arrival".to_string(),
            description: "Linguist meets heptapods".to_string(),
            video_url: "https://cdn.example.com/arrival.mp4".to_string(),
            thumbnail_url: "https://cdn.example.com/arrival.jpg".to_string(),
            genre: "Sci-Fi".to_string(),
            duration: "116 minutes".to_string(),
        }
    }

    async fn rated_movie(values: &[f64]) -> (RatingAggregator, InMemoryStore) {
        let store = InMemoryStore::new();
        store.insert_movie(movie("m1")).await;
        let aggregator = RatingAggregator::new(Arc::new(store.clone()));
        for (i, value) in values.iter().enumerate() {
            aggregator
                .upsert_rating("m1", &format!("seed-{}", i), *value)
                .await
                .unwrap();
        }
        (aggregator, store)
    }

    fn values(result: &AggregateResult) -> Vec<f64> {
        result.ratings.iter().map(|r| r.value).collect()
    }

    #[tokio::test]
    async fn test_first_rating_sets_average() {
        let (aggregator, _store) = rated_movie(&[]).await;
        let result = assert_ok!(aggregator.upsert_rating("m1", "u1", 4.0).await);
        assert_eq!(values(&result), vec![4.0]);
        assert_eq!(result.average_rating, Some(4.0));
    }

    #[tokio::test]
    async fn test_insert_then_update_same_user() {
        let (aggregator, store) = rated_movie(&[3.0, 5.0]).await;

        let inserted = aggregator.upsert_rating("m1", "U", 4.0).await.unwrap();
        assert_eq!(values(&inserted), vec![3.0, 5.0, 4.0]);
        assert_eq!(inserted.average_rating, Some(4.0));

        let updated = aggregator.upsert_rating("m1", "U", 1.0).await.unwrap();
        assert_eq!(values(&updated), vec![3.0, 5.0, 1.0]);
        assert_eq!(updated.average_rating, Some(3.0));
        assert_eq!(store.rating_count().await, 3);
    }

    #[tokio::test]
    async fn test_update_keeps_rating_identity() {
        let (aggregator, _store) = rated_movie(&[]).await;
        let first = aggregator.upsert_rating("m1", "u1", 2.0).await.unwrap();
        let second = aggregator.upsert_rating("m1", "u1", 9.0).await.unwrap();
        assert_eq!(first.ratings[0].id, second.ratings[0].id);
        assert_eq!(second.ratings.len(), 1);
    }

    #[tokio::test]
    async fn test_mean_follows_insert_and_replace_formulas() {
        let seed = [2.0, 7.0, 6.0];
        let (aggregator, _store) = rated_movie(&seed).await;
        let old_sum: f64 = seed.iter().sum();
        let old_count = seed.len() as f64;

        let inserted = aggregator.upsert_rating("m1", "new", 10.0).await.unwrap();
        assert_eq!(inserted.ratings.len(), seed.len() + 1);
        assert_eq!(
            inserted.average_rating,
            Some((old_sum + 10.0) / (old_count + 1.0))
        );

        let replaced = aggregator.upsert_rating("m1", "seed-1", 1.0).await.unwrap();
        assert_eq!(replaced.ratings.len(), seed.len() + 1);
        assert_eq!(
            replaced.average_rating,
            Some((old_sum + 10.0 - 7.0 + 1.0) / (old_count + 1.0))
        );
    }

    #[tokio::test]
    async fn test_unknown_movie_is_not_found_without_write() {
        let (aggregator, store) = rated_movie(&[]).await;
        let err = assert_err!(aggregator.upsert_rating("missing", "u1", 3.0).await);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.rating_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_store() {
        let mut mock = MockCatalogStore::new();
        mock.expect_find_movie_by_id().never();
        mock.expect_create_rating().never();
        mock.expect_update_rating_value().never();
        let aggregator = RatingAggregator::new(Arc::new(mock));

        for (movie_id, user_id, value) in [
            ("", "u1", 3.0),
            ("m1", " ", 3.0),
            ("m1", "u1", f64::NAN),
            ("m1", "u1", f64::NEG_INFINITY),
        ] {
            let err = aggregator
                .upsert_rating(movie_id, user_id, value)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let mut mock = MockCatalogStore::new();
        mock.expect_find_movie_by_id()
            .returning(|id| Ok(Some(movie(id.as_str()))));
        mock.expect_find_ratings_by_movie_id()
            .times(1)
            .returning(|_| Ok(vec![]));
        mock.expect_create_rating()
            .returning(|_, _, _| Err(AppError::Database(sqlx::Error::PoolClosed)));

        let aggregator = RatingAggregator::new(Arc::new(mock));
        let err = aggregator.upsert_rating("m1", "u1", 3.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
    }

    #[tokio::test]
    async fn test_read_failure_is_reported() {
        let mut mock = MockCatalogStore::new();
        mock.expect_find_movie_by_id()
            .returning(|_| Err(AppError::Dependency("connection reset".to_string())));
        mock.expect_create_rating().never();

        let aggregator = RatingAggregator::new(Arc::new(mock));
        let err = aggregator.upsert_rating("m1", "u1", 3.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
    }

    #[tokio::test]
    async fn test_summarize_without_ratings_has_no_average() {
        let (aggregator, _store) = rated_movie(&[]).await;
        let details = aggregator.summarize(movie("m1")).await.unwrap();
        assert!(details.ratings.is_empty());
        assert_eq!(details.average_rating, None);
    }

    #[tokio::test]
    async fn test_summarize_with_ratings() {
        let (aggregator, _store) = rated_movie(&[1.0, 2.0]).await;
        let details = aggregator.summarize(movie("m1")).await.unwrap();
        assert_eq!(details.ratings.len(), 2);
        assert_eq!(details.average_rating, Some(1.5));
    }
}
