//! Error types for newzotero-core

use thiserror::Error;

use crate::models::EntityId;

/// Result type alias using newzotero-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in newzotero-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure (connection refused, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input; the action is aborted before any request is sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entity not present in local state
    #[error("Not found: {0}")]
    NotFound(String),

    /// A confirm request for this entity has not resolved yet
    #[error("A mutation for {0} is still in flight")]
    MutationInFlight(EntityId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` for failures that never reached the backend.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// HTTP status reported by the backend, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
