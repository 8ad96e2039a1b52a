//! Similarity search models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::EntityId;
use super::note::NoteKind;

/// Maximum number of hits requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultsLimit {
    Three,
    #[default]
    Five,
    Ten,
    Twenty,
    All,
}

impl ResultsLimit {
    /// Count sent as `resultsPerPage`; `all` is capped at 100.
    pub const fn as_count(self) -> u32 {
        match self {
            Self::Three => 3,
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::All => 100,
        }
    }
}

impl FromStr for ResultsLimit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "3" => Ok(Self::Three),
            "5" => Ok(Self::Five),
            "10" => Ok(Self::Ten),
            "20" => Ok(Self::Twenty),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unsupported results limit '{other}' (expected 3, 5, 10, 20 or all)"
            )),
        }
    }
}

impl fmt::Display for ResultsLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            other => write!(f, "{}", other.as_count()),
        }
    }
}

/// A note returned by similarity search.
///
/// Lower scores are closer matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub file_id: Option<EntityId>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub page: String,
    pub score: f64,
    #[serde(default)]
    pub file_downloadable: bool,
    #[serde(default)]
    pub file_title: Option<String>,
}

impl SearchHit {
    /// The file behind this hit, when the backend marks it downloadable.
    pub fn downloadable_file(&self) -> Option<&EntityId> {
        if self.file_downloadable {
            self.file_id.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}
