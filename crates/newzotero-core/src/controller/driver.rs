use crate::doi::CrossrefClient;
use crate::error::{Error, Result};
use crate::models::{EntityId, LibraryFile};
use crate::remote::{Download, RemoteStore};

use super::mutation::{
    apply, reconcile, ConfirmRequest, ConfirmStatus, MutationIntent, MutationPhase,
};
use super::state::{select_file, LibraryState};

/// How a mutation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub entity: EntityId,
    pub phase: MutationPhase,
    pub failure: Option<String>,
}

impl MutationReport {
    pub const fn is_confirmed(&self) -> bool {
        matches!(self.phase, MutationPhase::Confirmed)
    }
}

/// Drives optimistic mutations against a [`RemoteStore`].
///
/// Every backend call is awaited before the next one starts.
#[derive(Debug)]
pub struct OptimisticController<S> {
    store: S,
    state: LibraryState,
}

impl<S: RemoteStore> OptimisticController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: LibraryState::default(),
        }
    }

    pub const fn state(&self) -> &LibraryState {
        &self.state
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replace the excerpt draft content.
    pub fn set_excerpt_content(&mut self, content: impl Into<String>) {
        self.state.excerpt_draft.content = content.into();
    }

    /// Edit the citation fields of the excerpt draft.
    pub fn set_excerpt_citation(&mut self, title: &str, author: &str, date: &str, page: &str) {
        let draft = &mut self.state.excerpt_draft;
        draft.title = title.to_string();
        draft.author = author.to_string();
        draft.date = date.to_string();
        draft.page = page.to_string();
    }

    pub fn set_free_draft(&mut self, content: impl Into<String>) {
        self.state.free_draft = content.into();
    }

    /// Load free notes and files, then select the first file.
    pub async fn load(&mut self) -> Result<()> {
        let all_notes = self.store.list_notes(None).await?;
        let files = self.store.list_files().await?;
        let first_notes = match files.first() {
            Some(first) => self.store.list_notes(Some(&first.id)).await?,
            None => Vec::new(),
        };
        self.state = LibraryState::initial(files, all_notes, first_notes);
        tracing::debug!(
            files = self.state.files.len(),
            notes = self.state.notes.len(),
            "Library loaded"
        );
        Ok(())
    }

    /// Select a file and load its excerpts.
    pub async fn select(&mut self, file_id: &EntityId) -> Result<()> {
        if self.state.file(file_id).is_none() {
            return Err(Error::NotFound(format!("file {file_id}")));
        }
        let fetched = self.store.list_notes(Some(file_id)).await?;
        self.state = select_file(&self.state, file_id, fetched)?;
        Ok(())
    }

    pub async fn add_excerpt(&mut self) -> Result<MutationReport> {
        self.run(MutationIntent::AddExcerpt).await
    }

    pub async fn add_free_note(&mut self) -> Result<MutationReport> {
        self.run(MutationIntent::AddFreeNote).await
    }

    pub async fn delete_note(&mut self, note_id: EntityId) -> Result<MutationReport> {
        self.run(MutationIntent::DeleteNote(note_id)).await
    }

    pub async fn add_file(&mut self, file: LibraryFile) -> Result<MutationReport> {
        self.run(MutationIntent::AddFile(file)).await
    }

    pub async fn add_manual_file(&mut self) -> Result<MutationReport> {
        self.run(MutationIntent::AddManualFile).await
    }

    /// Look up `doi` on Crossref and add the resulting file.
    pub async fn import_doi(
        &mut self,
        crossref: &CrossrefClient,
        doi: &str,
    ) -> Result<MutationReport> {
        let file = crossref.lookup(doi).await?;
        self.add_file(file).await
    }

    /// Delete a file; when it was selected, load the excerpts of the file
    /// that took its place.
    pub async fn delete_file(&mut self, file_id: EntityId) -> Result<MutationReport> {
        let was_selected = self.state.selected_file.as_ref() == Some(&file_id);
        let report = self.run(MutationIntent::DeleteFile(file_id)).await?;
        if report.is_confirmed() && was_selected {
            if let Some(next) = self.state.selected_file.clone() {
                if let Err(err) = self.select(&next).await {
                    tracing::warn!(
                        file = %next,
                        error = %err,
                        "Failed to load notes of the next file"
                    );
                }
            }
        }
        Ok(report)
    }

    pub async fn download(&self, file_id: &EntityId) -> Result<Download> {
        self.store.download_file(file_id).await
    }

    /// Apply an intent, send its confirm requests in order and reconcile.
    pub async fn run(&mut self, intent: MutationIntent) -> Result<MutationReport> {
        let (optimistic, pending) = apply(&self.state, intent)?;
        self.state = optimistic;

        let mut outcomes = Vec::with_capacity(pending.requests().len());
        let mut halted = false;
        for request in pending.requests() {
            if halted {
                outcomes.push(ConfirmStatus::Skipped);
                continue;
            }
            let outcome = self.confirm(request).await;
            halted = outcomes.is_empty() && !outcome.is_confirmed();
            outcomes.push(outcome);
        }

        let entity = pending.entity().clone();
        let settled = reconcile(&self.state, pending, &outcomes);
        self.state = settled.state;
        Ok(MutationReport {
            entity,
            phase: settled.phase,
            failure: settled.failure,
        })
    }

    async fn confirm(&self, request: &ConfirmRequest) -> ConfirmStatus {
        let result = match request {
            ConfirmRequest::CreateNote(note) => self.store.create_note(note).await,
            ConfirmRequest::DeleteNotes(selector) => self.store.delete_notes(selector).await,
            ConfirmRequest::CreateFile(file) => self.store.create_file(file).await,
            ConfirmRequest::DeleteFile(file) => self.store.delete_file(file).await,
        };
        ConfirmStatus::from_result(&result)
    }

    /// Reload files and select `file_id`, showing only free notes until its
    /// excerpts exist.
    pub(crate) async fn refresh_files_and_select(&mut self, file_id: &EntityId) -> Result<()> {
        self.state.files = self.store.list_files().await?;
        if self.state.file(file_id).is_some() {
            self.state = select_file(&self.state, file_id, Vec::new())?;
        }
        Ok(())
    }
}
