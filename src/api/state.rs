use std::sync::Arc;

use crate::config::Config;
use crate::db::{Cache, CatalogStore};
use crate::services::{Catalog, RatingAggregator, RelationGraphResolver};

/// Depth bounds for related-movie lookups
#[derive(Debug, Clone, Copy)]
pub struct RelatedDepth {
    pub default: u32,
    pub limit: u32,
}

/// Shared application state
///
/// Holds no mutable data of its own; every request goes to the store.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RelationGraphResolver>,
    pub ratings: Arc<RatingAggregator>,
    pub catalog: Catalog,
    pub related_depth: RelatedDepth,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, cache: Option<Cache>, config: &Config) -> Self {
        Self {
            resolver: Arc::new(RelationGraphResolver::new(store.clone())),
            ratings: Arc::new(RatingAggregator::new(store.clone())),
            catalog: Catalog::new(store, cache, config.movie_cache_ttl_secs),
            related_depth: RelatedDepth {
                default: config.related_default_depth,
                limit: config.related_depth_limit,
            },
        }
    }
}
