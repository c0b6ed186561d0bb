use serde::{Deserialize, Serialize};

use super::ItemId;

/// Directed fact: `secondary_movie_id` is related to `primary_movie_id`.
///
/// The secondary side is kept as stored. Malformed rows may carry a null or
/// blank target, which [`RelationEdge::target`] filters out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RelationEdge {
    pub id: String,
    pub primary_movie_id: ItemId,
    pub secondary_movie_id: Option<String>,
}

impl RelationEdge {
    pub fn new(
        id: impl Into<String>,
        primary_movie_id: ItemId,
        secondary_movie_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            primary_movie_id,
            secondary_movie_id,
        }
    }

    /// The related movie id, if the stored target is well formed
    pub fn target(&self) -> Option<ItemId> {
        self.secondary_movie_id
            .as_deref()
            .and_then(|raw| ItemId::parse(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(secondary: Option<&str>) -> RelationEdge {
        RelationEdge::new(
            "r1",
            ItemId::parse("a").unwrap(),
            secondary.map(str::to_string),
        )
    }

    #[test]
    fn test_target_present() {
        assert_eq!(edge(Some("b")).target(), Some(ItemId::parse("b").unwrap()));
    }

    #[test]
    fn test_target_null_or_blank_is_dropped() {
        assert_eq!(edge(None).target(), None);
        assert_eq!(edge(Some("")).target(), None);
        assert_eq!(edge(Some("  ")).target(), None);
    }
}
