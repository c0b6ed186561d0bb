//! Bounded-depth expansion of the movie relation graph.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::ItemId,
};

/// Finds movies reachable from an origin within a fixed number of hops
///
/// Hops follow `primary -> secondary` edges: the secondary ids matched at one
/// hop are the primary ids looked up at the next. Each hop is a single batched
/// edge lookup for the whole frontier.
///
/// Nodes are not memoized across hops. A movie first reached at hop 2 is looked
/// up again if it reappears in the hop 3 frontier, so cycles cost extra lookups
/// but never extra hops. Termination comes from the depth bound alone.
pub struct RelationGraphResolver {
    store: Arc<dyn CatalogStore>,
}

impl RelationGraphResolver {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Validates `origin` and returns the distinct related ids in discovery order
    ///
    /// A malformed origin fails with `InvalidArgument` before the store is
    /// touched. An origin with no edges, or one the store does not know,
    /// yields an empty list.
    pub async fn resolve(&self, origin: &str, max_depth: u32) -> AppResult<Vec<ItemId>> {
        let origin = ItemId::parse(origin)?;
        self.resolve_id(&origin, max_depth).await
    }

    #[instrument(skip(self, origin), fields(origin = %origin))]
    pub async fn resolve_id(&self, origin: &ItemId, max_depth: u32) -> AppResult<Vec<ItemId>> {
        let mut related = Vec::new();
        let mut reached = HashSet::new();
        let mut frontier = vec![origin.clone()];

        for hop in 1..=max_depth {
            if frontier.is_empty() {
                break;
            }

            let edges = self.store.find_edges_by_primary_ids(&frontier).await?;

            let mut next = Vec::new();
            let mut in_next = HashSet::new();
            let mut malformed = 0usize;

            for edge in &edges {
                let Some(target) = edge.target() else {
                    malformed += 1;
                    continue;
                };
                if in_next.insert(target.clone()) {
                    next.push(target.clone());
                }
                if &target != origin && reached.insert(target.clone()) {
                    related.push(target);
                }
            }

            if malformed > 0 {
                tracing::warn!(hop, malformed, "Skipped relation edges without a valid target");
            }

            tracing::debug!(
                hop,
                frontier = frontier.len(),
                edges = edges.len(),
                next_frontier = next.len(),
                "Expanded relation hop"
            );

            frontier = next;
        }

        tracing::debug!(related = related.len(), max_depth, "Resolved related movies");

        Ok(related)
    }
}
