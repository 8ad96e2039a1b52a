//! Literature file model

use serde::{Deserialize, Serialize};

use super::id::{path_safe_slug, EntityId};

/// How a file entered the library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    #[default]
    Manual,
    Doi,
    /// Stored by the backend's upload endpoint.
    Uploaded,
    #[serde(other)]
    Other,
}

impl FileKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Manual => "manual",
            Self::Doi => "doi",
            Self::Uploaded => "uploaded",
            Self::Other => "other",
        }
    }
}

/// Bibliographic metadata attached to a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub page: String,
    #[serde(rename = "type", default)]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloadable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
}

impl FileMeta {
    /// APA-style citation line: `Author. (YYYY-MM-DD). Title`
    pub fn apa_citation(&self) -> String {
        let date: String = self.date.chars().take(10).collect();
        format!("{}. ({date}). {}", self.author, self.title)
    }
}

/// A file in the user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryFile {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta: FileMeta,
}

impl LibraryFile {
    /// Build a manually entered file; the id embeds a slug of its title.
    #[must_use]
    pub fn manual(title: &str, author: &str, date: &str, page: &str) -> Self {
        let title = title.trim().to_string();
        Self {
            id: EntityId::generate_with_slug(&title),
            meta: FileMeta {
                title: title.clone(),
                author: author.to_string(),
                date: date.to_string(),
                page: page.to_string(),
                kind: FileKind::Manual,
                ..FileMeta::default()
            },
            title,
        }
    }

    /// Build a file from DOI metadata; the id embeds a slug of the DOI.
    #[must_use]
    pub fn from_doi(doi: &str, meta: FileMeta) -> Self {
        let title = if meta.title.trim().is_empty() {
            "DOI literature".to_string()
        } else {
            meta.title.clone()
        };
        Self {
            id: EntityId::generate_with_slug(&path_safe_slug(doi)),
            title,
            meta: FileMeta {
                kind: FileKind::Doi,
                ..meta
            },
        }
    }

    /// Files stored by the backend's upload endpoint can be downloaded and are
    /// deleted through the dedicated file-delete route.
    pub fn is_uploaded(&self) -> bool {
        self.meta.downloadable.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_uploaded_entry() {
        let raw = r#"{
            "id": "3f2a-paper.pdf",
            "title": "paper.pdf",
            "meta": {
                "title": "paper.pdf", "author": "", "date": "", "page": "",
                "type": "uploaded", "downloadable": true,
                "file_size": 1024, "upload_time": 1721000000.5, "file_extension": "pdf"
            }
        }"#;
        let file: LibraryFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.meta.kind, FileKind::Uploaded);
        assert!(file.is_uploaded());
        assert_eq!(file.meta.file_size, Some(1024));
    }

    #[test]
    fn test_unknown_kind_and_missing_fields() {
        let file: LibraryFile =
            serde_json::from_str(r#"{"id": 0, "meta": {"type": "epub"}}"#).unwrap();
        assert_eq!(file.meta.kind, FileKind::Other);
        assert_eq!(file.title, "");
        assert!(!file.is_uploaded());
    }

    #[test]
    fn test_manual_file_serializes_without_upload_fields() {
        let file = LibraryFile::manual(" On Pain ", "Zhuangzi", "2024-01-01", "1-10");
        assert_eq!(file.title, "On Pain");
        assert!(file.id.to_string().ends_with("-On Pain"));

        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["meta"]["type"], "manual");
        assert!(value["meta"].get("downloadable").is_none());
    }

    #[test]
    fn test_doi_file_falls_back_to_placeholder_title() {
        let file = LibraryFile::from_doi("10.1000/abc", FileMeta::default());
        assert_eq!(file.title, "DOI literature");
        assert_eq!(file.meta.kind, FileKind::Doi);
        assert!(file.id.to_string().ends_with("-10.1000_abc"));
    }

    #[test]
    fn test_apa_citation_truncates_date() {
        let meta = FileMeta {
            title: "Deep Notes".to_string(),
            author: "Doe Jane".to_string(),
            date: "2023-05-01T12:00:00Z".to_string(),
            ..FileMeta::default()
        };
        assert_eq!(meta.apa_citation(), "Doe Jane. (2023-05-01). Deep Notes");
    }
}
