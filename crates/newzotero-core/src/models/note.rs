//! Note model

use serde::{Deserialize, Serialize};

use super::file::LibraryFile;
use super::id::EntityId;
use crate::util::iso_timestamp_now;

/// Whether a note is an excerpt of a file or free writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Excerpt tied to a file, carrying citation fields.
    #[default]
    Abstract,
    /// Unstructured note with no file.
    Free,
}

/// A note in the user's library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    #[serde(rename = "fileId", default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<EntityId>,
    #[serde(default)]
    pub content: String,
    /// ISO-8601 creation timestamp
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

/// Citation fields and content entered for an excerpt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptDraft {
    pub title: String,
    pub author: String,
    pub date: String,
    pub page: String,
    pub content: String,
}

impl ExcerptDraft {
    /// Draft pre-filled from a file's metadata with empty content.
    pub fn for_file(file: &LibraryFile) -> Self {
        Self {
            title: file.meta.title.clone(),
            author: file.meta.author.clone(),
            date: file.meta.date.clone(),
            page: file.meta.page.clone(),
            content: String::new(),
        }
    }
}

impl Note {
    /// Create an excerpt of `file_id` from a draft.
    #[must_use]
    pub fn excerpt(file_id: EntityId, draft: &ExcerptDraft) -> Self {
        Self {
            id: EntityId::generate(),
            file_id: Some(file_id),
            content: draft.content.clone(),
            created_at: iso_timestamp_now(),
            kind: NoteKind::Abstract,
            title: Some(draft.title.clone()),
            author: Some(draft.author.clone()),
            date: Some(draft.date.clone()),
            page: Some(draft.page.clone()),
        }
    }

    /// Create a free note; free notes never reference a file.
    #[must_use]
    pub fn free(content: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate_with_prefix("free"),
            file_id: None,
            content: content.into(),
            created_at: iso_timestamp_now(),
            kind: NoteKind::Free,
            title: None,
            author: None,
            date: None,
            page: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.kind == NoteKind::Free
    }

    /// Whether this is an excerpt of the given file.
    pub fn belongs_to(&self, file_id: &EntityId) -> bool {
        !self.is_free() && self.file_id.as_ref() == Some(file_id)
    }

    /// Get first line as preview, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_free_note_has_no_file() {
        let note = Note::free("thinking out loud");
        assert!(note.is_free());
        assert!(note.file_id.is_none());
        assert!(note.id.to_string().starts_with("free-"));

        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("fileId").is_none());
        assert_eq!(value["type"], "free");
    }

    #[test]
    fn test_excerpt_copies_citation_fields() {
        let draft = ExcerptDraft {
            title: "Zhuangzi".to_string(),
            author: "Zhuang Zhou".to_string(),
            date: "2020".to_string(),
            page: "12".to_string(),
            content: "excerpt text".to_string(),
        };
        let note = Note::excerpt(EntityId::from(1), &draft);
        assert_eq!(note.kind, NoteKind::Abstract);
        assert_eq!(note.file_id, Some(EntityId::from(1)));
        assert_eq!(note.page.as_deref(), Some("12"));
        assert!(note.belongs_to(&EntityId::from(1)));
        assert!(!note.belongs_to(&EntityId::from(2)));
    }

    #[test]
    fn test_backend_note_defaults_to_abstract() {
        let note: Note =
            serde_json::from_str(r#"{"id": 1721.5, "fileId": "f1", "content": "x"}"#).unwrap();
        assert_eq!(note.kind, NoteKind::Abstract);
        assert_eq!(note.created_at, "");
        assert_eq!(note.file_id, Some(EntityId::from("f1")));
    }

    #[test]
    fn test_preview() {
        let note = Note::free("First line\nSecond line");
        assert_eq!(note.preview(50), "First line");
        assert_eq!(note.preview(5), "First");
    }
}
