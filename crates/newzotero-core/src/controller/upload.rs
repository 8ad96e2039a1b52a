//! Sequential batch upload.

use crate::error::{Error, Result};
use crate::models::EntityId;
use crate::remote::{FileUpload, RemoteStore};
use crate::util::is_uploadable_document;

use super::driver::OptimisticController;

/// Result of uploading one document of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded {
        file_name: String,
        file_id: Option<EntityId>,
    },
    Failed {
        file_name: String,
        message: String,
    },
}

impl UploadOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Uploaded { file_name, .. } | Self::Failed { file_name, .. } => file_name,
        }
    }

    pub const fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Keep only `.pdf`, `.docx` and `.doc` documents.
pub fn filter_uploadable(uploads: Vec<FileUpload>) -> Vec<FileUpload> {
    uploads
        .into_iter()
        .filter(|upload| {
            let keep = is_uploadable_document(&upload.file_name);
            if !keep {
                tracing::debug!(file = %upload.file_name, "Skipping unsupported document");
            }
            keep
        })
        .collect()
}

impl<S: RemoteStore> OptimisticController<S> {
    /// Upload documents one at a time.
    ///
    /// Unsupported documents are skipped; a batch with nothing left is
    /// rejected. A failed item is reported and the rest still upload. After
    /// each success the file list is reloaded and the new file selected.
    pub async fn upload_batch(&mut self, uploads: Vec<FileUpload>) -> Result<Vec<UploadOutcome>> {
        let uploads = filter_uploadable(uploads);
        if uploads.is_empty() {
            return Err(Error::InvalidInput(
                "Only .pdf, .docx and .doc documents can be uploaded".to_string(),
            ));
        }

        let mut outcomes = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            let file_name = upload.file_name.clone();
            let result = self.store().upload_file(upload).await;
            let outcome = match result {
                Ok(receipt) if receipt.success => {
                    tracing::info!(file = %file_name, "Uploaded document");
                    if let Some(file_id) = &receipt.file_id {
                        if let Err(err) = self.refresh_files_and_select(file_id).await {
                            tracing::warn!(error = %err, "Failed to reload files after upload");
                        }
                    }
                    UploadOutcome::Uploaded {
                        file_name,
                        file_id: receipt.file_id,
                    }
                }
                Ok(receipt) => UploadOutcome::Failed {
                    file_name,
                    message: receipt
                        .error
                        .or(receipt.message)
                        .unwrap_or_else(|| "upload was not accepted".to_string()),
                },
                Err(err) => {
                    tracing::warn!(file = %file_name, error = %err, "Upload failed");
                    UploadOutcome::Failed {
                        file_name,
                        message: err.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upload(name: &str) -> FileUpload {
        FileUpload {
            file_name: name.to_string(),
            content_type: "application/octet-stream".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn filter_keeps_documents_only() {
        let kept = filter_uploadable(vec![
            upload("paper.PDF"),
            upload("notes.txt"),
            upload("draft.docx"),
            upload("old.doc"),
            upload("image.png"),
        ]);
        let names: Vec<_> = kept.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(names, vec!["paper.PDF", "draft.docx", "old.doc"]);
    }
}
