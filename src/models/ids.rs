use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

const MAX_ID_LEN: usize = 128;

fn check_id(raw: &str, what: &str) -> AppResult<()> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidArgument(format!("Missing {}", what)));
    }
    if raw.chars().count() > MAX_ID_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Invalid {}: longer than {} characters",
            what, MAX_ID_LEN
        )));
    }
    Ok(())
}

/// Opaque identifier of a movie in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Validates a caller-supplied movie id
    pub fn parse(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        check_id(&raw, "movie id")?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = AppError;

    fn try_from(raw: String) -> AppResult<Self> {
        Self::parse(raw)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user submitting a rating
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        check_id(&raw, "user id")?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = AppError;

    fn try_from(raw: String) -> AppResult<Self> {
        Self::parse(raw)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_accepts_opaque_ids() {
        let id = ItemId::parse("6475f1c2a9b8e1d2c3f4a5b6").unwrap();
        assert_eq!(id.as_str(), "6475f1c2a9b8e1d2c3f4a5b6");
        assert_eq!(format!("{}", id), "6475f1c2a9b8e1d2c3f4a5b6");
    }

    #[test]
    fn test_parse_rejects_blank() {
        for raw in ["", "   ", "\t"] {
            let err = ItemId::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(
            UserId::parse("").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_parse_rejects_oversized() {
        let raw = "x".repeat(MAX_ID_LEN + 1);
        assert!(ItemId::parse(raw).is_err());
        assert!(ItemId::parse("é".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let raw = "é".repeat(MAX_ID_LEN);
        assert_eq!(ItemId::parse(raw.clone()).unwrap().as_str(), raw);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ItemId::parse("m1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"m1\"");
    }

    #[test]
    fn test_deserialize_validates() {
        let id: ItemId = serde_json::from_str("\"m1\"").unwrap();
        assert_eq!(id.as_str(), "m1");
        assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
        assert!(serde_json::from_str::<UserId>("\" \"").is_err());
    }
}
