//! Entity identifiers shared by files and notes

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a file or note.
///
/// The backend stores ids verbatim and compares them with JSON equality, so a
/// numeric id must stay a number and a string id must stay a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(serde_json::Number),
    Text(String),
}

impl EntityId {
    /// Generate a new local id from the current time and random bits (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self::Text(Uuid::now_v7().to_string())
    }

    /// Generate a local id with a leading tag, e.g. `free-<uuid>`.
    #[must_use]
    pub fn generate_with_prefix(prefix: &str) -> Self {
        Self::Text(format!("{prefix}-{}", Uuid::now_v7()))
    }

    /// Generate a local id followed by a path-safe slug of `label`.
    ///
    /// Falls back to a bare generated id when the label is blank.
    #[must_use]
    pub fn generate_with_slug(label: &str) -> Self {
        let slug = path_safe_slug(label);
        if slug.is_empty() {
            Self::generate()
        } else {
            Self::Text(format!("{}-{slug}", Uuid::now_v7()))
        }
    }

    /// Whether this id renders exactly as `value`.
    ///
    /// Used to resolve ids typed by a user without guessing their JSON type.
    pub fn matches_str(&self, value: &str) -> bool {
        match self {
            Self::Number(number) => number.to_string() == value.trim(),
            Self::Text(text) => text == value.trim(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Replace path separators so a label can be embedded in an id or URL segment.
pub fn path_safe_slug(label: &str) -> String {
    label.trim().replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn test_prefix_and_slug() {
        let free = EntityId::generate_with_prefix("free");
        assert!(free.to_string().starts_with("free-"));

        let doi = EntityId::generate_with_slug("10.1000/xyz\\123");
        assert!(doi.to_string().ends_with("-10.1000_xyz_123"));

        assert!(!EntityId::generate_with_slug("   ").to_string().ends_with('-'));
    }

    #[test]
    fn test_untagged_json_roundtrip_keeps_type() {
        let number: EntityId = serde_json::from_str("1721000000000.25").unwrap();
        assert!(matches!(number, EntityId::Number(_)));
        assert_eq!(serde_json::to_string(&number).unwrap(), "1721000000000.25");

        let text: EntityId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(text, EntityId::Text("42".to_string()));
        assert_ne!(text, EntityId::from(42));
    }

    #[test]
    fn test_matches_str() {
        assert!(EntityId::from(1).matches_str("1"));
        assert!(EntityId::from("free-abc").matches_str(" free-abc "));
        assert!(!EntityId::from("free-abc").matches_str("free"));
    }
}
