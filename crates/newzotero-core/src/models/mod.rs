//! Data models for NewZotero

mod file;
mod id;
mod note;
mod search;

pub use file::{FileKind, FileMeta, LibraryFile};
pub use id::{path_safe_slug, EntityId};
pub use note::{ExcerptDraft, Note, NoteKind};
pub use search::{ResultsLimit, SearchHit, SearchResponse};
