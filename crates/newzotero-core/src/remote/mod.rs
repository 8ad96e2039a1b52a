//! Remote store client.
//!
//! Every operation maps to exactly one HTTP request against the backend's
//! `/api/...` resources. There is no retry and no local caching; any
//! non-success status or transport failure is returned to the caller.

mod http;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{EntityId, LibraryFile, Note, ResultsLimit, SearchHit};
use crate::session::Session;

pub use http::{HttpBackend, HttpRemoteStore};

/// Acknowledgement body returned by mutating endpoints.
///
/// A `200` response may still carry `success: false` (for example when the
/// backend refuses a duplicate note); that is reported here rather than as an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

const fn default_success() -> bool {
    true
}

impl Ack {
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
            message: None,
        }
    }
}

/// Which notes a delete request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteSelector {
    /// A single note.
    ById(EntityId),
    /// Every note excerpted from a file.
    ByFile(EntityId),
}

/// A local document to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Response of the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(rename = "fileId", default)]
    pub file_id: Option<EntityId>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A downloaded file body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Username-scoped backend resources.
///
/// Implementations carry the [`Session`] they were built for; every request
/// includes its username.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// The session every request is scoped to.
    fn session(&self) -> &Session;

    async fn list_files(&self) -> Result<Vec<LibraryFile>>;

    async fn create_file(&self, file: &LibraryFile) -> Result<Ack>;

    /// Uploaded files go through the dedicated delete route; other files are
    /// removed from the file list by id.
    async fn delete_file(&self, file: &LibraryFile) -> Result<Ack>;

    async fn upload_file(&self, upload: &FileUpload) -> Result<UploadReceipt>;

    /// All notes, or only those of `file_id`.
    async fn list_notes(&self, file_id: Option<&EntityId>) -> Result<Vec<Note>>;

    async fn create_note(&self, note: &Note) -> Result<Ack>;

    async fn delete_notes(&self, selector: &NoteSelector) -> Result<Ack>;

    async fn search(&self, query: &str, limit: ResultsLimit) -> Result<Vec<SearchHit>>;

    async fn download_file(&self, file_id: &EntityId) -> Result<Download>;
}
