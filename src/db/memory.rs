use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{ItemId, Movie, Rating, RelationEdge, UserId},
};

/// Catalog store held in process memory
///
/// Used by the test suites and for running the service without PostgreSQL.
/// Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<InMemoryInner>>,
}

#[derive(Default)]
struct InMemoryInner {
    movies: HashMap<ItemId, Movie>,
    edges: Vec<RelationEdge>,
    ratings: Vec<Rating>,
}

/// Initial contents for an [`InMemoryStore`], read from JSON
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    #[serde(default)]
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub relations: Vec<SeedRelation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRelation {
    pub primary_movie_id: ItemId,
    #[serde(default)]
    pub secondary_movie_id: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let inner = InMemoryInner {
            movies: seed
                .movies
                .into_iter()
                .map(|movie| (movie.id.clone(), movie))
                .collect(),
            edges: seed
                .relations
                .into_iter()
                .map(|rel| {
                    RelationEdge::new(
                        Uuid::new_v4().to_string(),
                        rel.primary_movie_id,
                        rel.secondary_movie_id,
                    )
                })
                .collect(),
            ratings: Vec::new(),
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Loads a [`CatalogSeed`] JSON file
    pub fn from_seed_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let seed: CatalogSeed = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            movies = seed.movies.len(),
            relations = seed.relations.len(),
            "Loaded catalog seed"
        );
        Ok(Self::from_seed(seed))
    }

    pub async fn insert_movie(&self, movie: Movie) {
        let mut inner = self.inner.write().await;
        inner.movies.insert(movie.id.clone(), movie);
    }

    /// Records the edge `primary -> secondary`. A `None` target stores a malformed edge.
    pub async fn insert_relation(&self, primary: &ItemId, secondary: Option<&str>) {
        let mut inner = self.inner.write().await;
        let edge = RelationEdge::new(
            Uuid::new_v4().to_string(),
            primary.clone(),
            secondary.map(str::to_string),
        );
        inner.edges.push(edge);
    }

    pub async fn rating_count(&self) -> usize {
        self.inner.read().await.ratings.len()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn find_edges_by_primary_ids(&self, ids: &[ItemId]) -> AppResult<Vec<RelationEdge>> {
        let inner = self.inner.read().await;
        Ok(inner
            .edges
            .iter()
            .filter(|edge| ids.contains(&edge.primary_movie_id))
            .cloned()
            .collect())
    }

    async fn find_movie_by_id(&self, id: &ItemId) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.get(id).cloned())
    }

    async fn find_movies_by_ids(&self, ids: &[ItemId]) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.movies.get(id))
            .cloned()
            .collect())
    }

    async fn find_ratings_by_movie_id(&self, id: &ItemId) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|rating| &rating.movie_id == id)
            .cloned()
            .collect())
    }

    async fn create_rating(
        &self,
        movie_id: &ItemId,
        user_id: &UserId,
        value: f64,
    ) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;
        if !inner.movies.contains_key(movie_id) {
            return Err(AppError::NotFound(format!("Movie {}", movie_id)));
        }

        let now = Utc::now();

        // Same uniqueness rule as the ratings table
        if let Some(existing) = inner
            .ratings
            .iter_mut()
            .find(|r| &r.movie_id == movie_id && &r.user_id == user_id)
        {
            existing.value = value;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let rating = Rating {
            id: Uuid::new_v4().to_string(),
            movie_id: movie_id.clone(),
            user_id: user_id.clone(),
            value,
            created_at: now,
            updated_at: now,
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn update_rating_value(&self, rating_id: &str, value: f64) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;
        let rating = inner
            .ratings
            .iter_mut()
            .find(|r| r.id == rating_id)
            .ok_or_else(|| AppError::NotFound(format!("Rating {}", rating_id)))?;

        rating.value = value;
        rating.updated_at = Utc::now();
        Ok(rating.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str) -> Movie {
        Movie {
            id: ItemId::parse(id).unwrap(),
            title: format!("Movie {}", id),
            description: String::new(),
            video_url: String::new(),
            thumbnail_url: String::new(),
            genre: "Drama".to_string(),
            duration: "90 minutes".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_rating_is_unique_per_user() {
        let store = InMemoryStore::new();
        store.insert_movie(movie("m1")).await;
        let id = ItemId::parse("m1").unwrap();
        let user = UserId::parse("u1").unwrap();

        let first = store.create_rating(&id, &user, 2.0).await.unwrap();
        let second = store.create_rating(&id, &user, 5.0).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, 5.0);
        assert_eq!(store.rating_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_rating_for_unknown_movie() {
        let store = InMemoryStore::new();
        let err = store
            .create_rating(
                &ItemId::parse("missing").unwrap(),
                &UserId::parse("u1").unwrap(),
                3.0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.rating_count().await, 0);
    }

    #[tokio::test]
    async fn test_find_edges_matches_any_primary() {
        let store = InMemoryStore::new();
        let a = ItemId::parse("a").unwrap();
        let b = ItemId::parse("b").unwrap();
        store.insert_relation(&a, Some("b")).await;
        store.insert_relation(&b, Some("c")).await;
        store.insert_relation(&ItemId::parse("x").unwrap(), Some("y")).await;

        let edges = store.find_edges_by_primary_ids(&[a, b]).await.unwrap();
        assert_eq!(edges.len(), 2);
    }

    #[tokio::test]
    async fn test_seed_keeps_malformed_relations() {
        let seed: CatalogSeed = serde_json::from_value(serde_json::json!({
            "movies": [{
                "id": "a", "title": "A", "description": "", "videoUrl": "",
                "thumbnailUrl": "", "genre": "Drama", "duration": "1h"
            }],
            "relations": [
                { "primaryMovieId": "a", "secondaryMovieId": "b" },
                { "primaryMovieId": "a", "secondaryMovieId": null }
            ]
        }))
        .unwrap();
        let store = InMemoryStore::from_seed(seed);

        let a = ItemId::parse("a").unwrap();
        assert!(store.find_movie_by_id(&a).await.unwrap().is_some());
        let edges = store.find_edges_by_primary_ids(&[a]).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges.iter().filter_map(RelationEdge::target).count(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_rating() {
        let store = InMemoryStore::new();
        let err = store.update_rating_value("nope", 1.0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
