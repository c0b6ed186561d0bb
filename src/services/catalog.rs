use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey, CatalogStore},
    error::AppResult,
    models::{ItemId, Movie},
};

/// Turns movie ids into full movie records, reading through the optional cache
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    cache: Option<Cache>,
    ttl: u64,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>, cache: Option<Cache>, ttl: u64) -> Self {
        Self { store, cache, ttl }
    }

    pub async fn get_movie(&self, id: &ItemId) -> AppResult<Option<Movie>> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::Movie(id.clone()),
                self.ttl,
                self.store.find_movie_by_id(id)
            ),
            None => self.store.find_movie_by_id(id).await,
        }
    }

    /// Movies for `ids`, in the same order, skipping ids the store does not have
    pub async fn hydrate(&self, ids: &[ItemId]) -> AppResult<Vec<Movie>> {
        let mut found: HashMap<ItemId, Movie> = HashMap::with_capacity(ids.len());

        if let Some(cache) = &self.cache {
            let keys: Vec<CacheKey> = ids.iter().cloned().map(CacheKey::Movie).collect();
            match cache.get_many_from_cache::<Movie>(&keys).await {
                Ok(entries) => {
                    found.extend(entries.into_iter().flatten().map(|m| (m.id.clone(), m)));
                }
                Err(e) => tracing::warn!(error = %e, "Cache read failed; hydrating from store"),
            }
        }

        let misses: Vec<ItemId> = ids
            .iter()
            .filter(|id| !found.contains_key(*id))
            .cloned()
            .collect();

        if !misses.is_empty() {
            let movies = self.store.find_movies_by_ids(&misses).await?;
            tracing::debug!(
                requested = ids.len(),
                cached = ids.len() - misses.len(),
                loaded = movies.len(),
                "Hydrated movies"
            );
            for movie in movies {
                if let Some(cache) = &self.cache {
                    cache.set_in_background(&CacheKey::Movie(movie.id.clone()), &movie, self.ttl);
                }
                found.insert(movie.id.clone(), movie);
            }
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }
}
