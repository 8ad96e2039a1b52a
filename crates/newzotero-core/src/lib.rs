//! newzotero-core - Core library for NewZotero
//!
//! This crate contains the shared models, the backend client, and the
//! optimistic mutation controller used by the NewZotero front ends (CLI and
//! gateway).

pub mod config;
pub mod controller;
pub mod doi;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod user_check;
pub mod util;

pub use error::{Error, Result};
pub use models::{EntityId, FileKind, FileMeta, LibraryFile, Note, NoteKind, SearchHit};
pub use session::Session;
