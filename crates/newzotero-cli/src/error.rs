use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] newzotero_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No content provided")]
    EmptyContent,
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("File not found for id: {0}")]
    FileNotFound(String),
    #[error("Note not found for id: {0}")]
    NoteNotFound(String),
    #[error("The library is empty; add a file first")]
    NoFiles,
    #[error("Not logged in. Run `newzotero login <username>` first.")]
    NotLoggedIn,
    #[error("No documents were uploaded")]
    NothingUploaded,
    #[error("Change was rolled back: {0}")]
    RolledBack(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
