//! Pure optimistic mutation state machine.
//!
//! [`apply`] turns a user intent into an optimistic state plus the confirm
//! requests still owed to the backend; [`reconcile`] folds the confirm
//! outcome back in. Neither performs I/O.

use crate::error::{Error, Result};
use crate::models::{EntityId, ExcerptDraft, LibraryFile, Note};
use crate::remote::{Ack, NoteSelector};

use super::state::LibraryState;

/// Lifecycle of one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    AppliedLocally,
    Confirmed,
    RolledBack,
}

/// A user action that changes the library.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationIntent {
    /// Add the excerpt draft as a note of the selected file.
    AddExcerpt,
    /// Add the free-note draft.
    AddFreeNote,
    DeleteNote(EntityId),
    /// Add a file built elsewhere (DOI import).
    AddFile(LibraryFile),
    /// Add a manual file from the excerpt draft, plus one excerpt with the
    /// draft content when it is not blank.
    AddManualFile,
    /// Delete a file and every excerpt of it.
    DeleteFile(EntityId),
}

impl MutationIntent {
    const fn name(&self) -> &'static str {
        match self {
            Self::AddExcerpt => "add_excerpt",
            Self::AddFreeNote => "add_free_note",
            Self::DeleteNote(_) => "delete_note",
            Self::AddFile(_) => "add_file",
            Self::AddManualFile => "add_manual_file",
            Self::DeleteFile(_) => "delete_file",
        }
    }
}

/// One backend request owed for an applied mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmRequest {
    CreateNote(Note),
    DeleteNotes(NoteSelector),
    CreateFile(LibraryFile),
    DeleteFile(LibraryFile),
}

/// Outcome of one confirm request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmStatus {
    Confirmed,
    /// The backend refused the request or could not be reached.
    Rejected {
        status: Option<u16>,
        message: String,
    },
    /// Not sent because an earlier request of the same mutation was rejected.
    Skipped,
}

impl ConfirmStatus {
    /// Classify a remote call result. A `200` carrying `success: false`
    /// means nothing was stored, so it counts as a rejection here.
    pub fn from_result(result: &Result<Ack>) -> Self {
        match result {
            Ok(ack) if ack.success => Self::Confirmed,
            Ok(ack) => Self::Rejected {
                status: None,
                message: ack
                    .error
                    .clone()
                    .or_else(|| ack.message.clone())
                    .unwrap_or_else(|| "request was not accepted".to_string()),
            },
            Err(err) => Self::rejected_by(err),
        }
    }

    pub fn rejected_by(err: &Error) -> Self {
        Self::Rejected {
            status: err.status(),
            message: err.to_string(),
        }
    }

    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            Self::Confirmed | Self::Skipped => None,
        }
    }
}

/// The selection context an add or delete replaced.
#[derive(Debug, Clone, PartialEq)]
struct SelectionSnapshot {
    selected_file: Option<EntityId>,
    excerpt_draft: ExcerptDraft,
    hidden_notes: Vec<(usize, Note)>,
}

impl SelectionSnapshot {
    fn take(state: &mut LibraryState) -> Self {
        Self {
            selected_file: state.selected_file.clone(),
            excerpt_draft: state.excerpt_draft.clone(),
            hidden_notes: state.take_excerpts(),
        }
    }

    fn restore(self, state: &mut LibraryState) {
        state.selected_file = self.selected_file;
        state.excerpt_draft = self.excerpt_draft;
        state.restore_notes(self.hidden_notes);
    }
}

/// How to undo an applied mutation.
#[derive(Debug, Clone, PartialEq)]
enum Undo {
    RemoveExcerpt {
        note_id: EntityId,
        content: String,
    },
    RemoveFreeNote {
        note_id: EntityId,
        draft: String,
    },
    ReinsertNote {
        index: usize,
        note: Note,
    },
    RemoveFile {
        file_id: EntityId,
        note_id: Option<EntityId>,
        previous: SelectionSnapshot,
    },
    ReinsertFile {
        index: usize,
        file: LibraryFile,
        notes: Vec<(usize, Note)>,
        selected_file: Option<EntityId>,
        excerpt_draft: ExcerptDraft,
    },
}

/// A mutation applied locally and waiting for its confirm requests.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    entity: EntityId,
    intent: &'static str,
    requests: Vec<ConfirmRequest>,
    undo: Undo,
}

impl PendingMutation {
    /// The entity this mutation holds in flight.
    pub const fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Requests to send, in order. The first decides confirm or rollback;
    /// later ones are follow-ups sent only after it is confirmed.
    pub fn requests(&self) -> &[ConfirmRequest] {
        &self.requests
    }

    pub const fn phase(&self) -> MutationPhase {
        MutationPhase::AppliedLocally
    }
}

/// State after a mutation settled.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub state: LibraryState,
    pub phase: MutationPhase,
    /// Why the primary request failed, for rollbacks.
    pub failure: Option<String>,
}

/// Apply `intent` to `prior` optimistically.
///
/// Fails without touching state when the input is invalid, the target is
/// unknown, or the target still has a mutation in flight.
pub fn apply(
    prior: &LibraryState,
    intent: MutationIntent,
) -> Result<(LibraryState, PendingMutation)> {
    let name = intent.name();
    let mut state = prior.clone();

    let (entity, requests, undo) = match intent {
        MutationIntent::AddExcerpt => {
            let content = state.excerpt_draft.content.clone();
            if content.trim().is_empty() {
                return Err(Error::InvalidInput("Excerpt content is empty".to_string()));
            }
            let file_id = state
                .selected()
                .map(|file| file.id.clone())
                .ok_or_else(|| Error::InvalidInput("No file is selected".to_string()))?;
            ensure_idle(prior, &file_id)?;

            let note = Note::excerpt(file_id, &state.excerpt_draft);
            state.excerpt_draft.content.clear();
            state.notes.push(note.clone());
            let undo = Undo::RemoveExcerpt {
                note_id: note.id.clone(),
                content,
            };
            (note.id.clone(), vec![ConfirmRequest::CreateNote(note)], undo)
        }
        MutationIntent::AddFreeNote => {
            let draft = state.free_draft.clone();
            if draft.trim().is_empty() {
                return Err(Error::InvalidInput("Note content is empty".to_string()));
            }

            let note = Note::free(draft.clone());
            state.free_draft.clear();
            state.notes.push(note.clone());
            let undo = Undo::RemoveFreeNote {
                note_id: note.id.clone(),
                draft,
            };
            (note.id.clone(), vec![ConfirmRequest::CreateNote(note)], undo)
        }
        MutationIntent::DeleteNote(note_id) => {
            let index = state
                .note_index(&note_id)
                .ok_or_else(|| Error::NotFound(format!("note {note_id}")))?;
            ensure_idle(prior, &note_id)?;

            let note = state.notes.remove(index);
            let request = ConfirmRequest::DeleteNotes(NoteSelector::ById(note_id.clone()));
            (note_id, vec![request], Undo::ReinsertNote { index, note })
        }
        MutationIntent::AddFile(file) => {
            if file.title.trim().is_empty() {
                return Err(Error::InvalidInput("File title is empty".to_string()));
            }
            if state.file(&file.id).is_some() {
                return Err(Error::InvalidInput(format!("File {} already exists", file.id)));
            }

            let previous = select_new_file(&mut state, &file);
            let undo = Undo::RemoveFile {
                file_id: file.id.clone(),
                note_id: None,
                previous,
            };
            (file.id.clone(), vec![ConfirmRequest::CreateFile(file)], undo)
        }
        MutationIntent::AddManualFile => {
            let draft = state.excerpt_draft.clone();
            if draft.title.trim().is_empty() {
                return Err(Error::InvalidInput("Title is empty".to_string()));
            }

            let file = LibraryFile::manual(&draft.title, &draft.author, &draft.date, &draft.page);
            let previous = select_new_file(&mut state, &file);
            let mut requests = vec![ConfirmRequest::CreateFile(file.clone())];
            let mut note_id = None;
            if !draft.content.trim().is_empty() {
                let note = Note::excerpt(file.id.clone(), &draft);
                note_id = Some(note.id.clone());
                state.notes.push(note.clone());
                requests.push(ConfirmRequest::CreateNote(note));
            }
            let undo = Undo::RemoveFile {
                file_id: file.id.clone(),
                note_id,
                previous,
            };
            (file.id, requests, undo)
        }
        MutationIntent::DeleteFile(file_id) => {
            let index = state
                .file_index(&file_id)
                .ok_or_else(|| Error::NotFound(format!("file {file_id}")))?;
            ensure_idle(prior, &file_id)?;

            let file = state.files.remove(index);
            let mut notes = Vec::new();
            let mut kept = Vec::with_capacity(state.notes.len());
            for (position, note) in std::mem::take(&mut state.notes).into_iter().enumerate() {
                if note.belongs_to(&file_id) {
                    notes.push((position, note));
                } else {
                    kept.push(note);
                }
            }
            state.notes = kept;

            let selected_file = state.selected_file.clone();
            let excerpt_draft = state.excerpt_draft.clone();
            if selected_file.as_ref() == Some(&file_id) {
                // The next file's excerpts are loaded once the delete confirms.
                match state.files.first() {
                    Some(next) => {
                        state.excerpt_draft = ExcerptDraft::for_file(next);
                        state.selected_file = Some(next.id.clone());
                    }
                    None => {
                        state.excerpt_draft = ExcerptDraft::default();
                        state.selected_file = None;
                    }
                }
            }

            let requests = vec![
                ConfirmRequest::DeleteFile(file.clone()),
                ConfirmRequest::DeleteNotes(NoteSelector::ByFile(file_id.clone())),
            ];
            let undo = Undo::ReinsertFile {
                index,
                file,
                notes,
                selected_file,
                excerpt_draft,
            };
            (file_id, requests, undo)
        }
    };

    state.in_flight.insert(entity.clone());
    tracing::debug!(intent = name, entity = %entity, "Applied mutation locally");
    Ok((
        state,
        PendingMutation {
            entity,
            intent: name,
            requests,
            undo,
        },
    ))
}

/// Fold confirm outcomes into the optimistic state.
///
/// `outcomes` line up with [`PendingMutation::requests`]; missing entries
/// count as skipped. A rejected first request undoes the whole mutation.
pub fn reconcile(
    optimistic: &LibraryState,
    pending: PendingMutation,
    outcomes: &[ConfirmStatus],
) -> Reconciled {
    let mut state = optimistic.clone();
    state.in_flight.remove(&pending.entity);

    let primary = outcomes.first().cloned().unwrap_or(ConfirmStatus::Skipped);
    if !primary.is_confirmed() {
        let failure = primary
            .failure_message()
            .unwrap_or("confirm request was not sent")
            .to_string();
        tracing::warn!(
            intent = pending.intent,
            entity = %pending.entity,
            error = %failure,
            "Rolling back optimistic mutation"
        );
        roll_back(&mut state, pending.undo);
        return Reconciled {
            state,
            phase: MutationPhase::RolledBack,
            failure: Some(failure),
        };
    }

    for (request, outcome) in pending.requests.iter().zip(outcomes).skip(1) {
        let Some(message) = outcome.failure_message() else {
            continue;
        };
        match request {
            ConfirmRequest::DeleteNotes(NoteSelector::ByFile(file_id)) => {
                if matches!(outcome, ConfirmStatus::Rejected { status: Some(404), .. }) {
                    tracing::debug!(file = %file_id, "File had no notes on the server");
                } else {
                    tracing::warn!(
                        file = %file_id,
                        error = %message,
                        "File deleted but its notes were not; they stay orphaned on the server"
                    );
                }
            }
            ConfirmRequest::CreateNote(note) => {
                tracing::warn!(
                    note = %note.id,
                    error = %message,
                    "Dropping note that was not stored"
                );
                if let Some(index) = state.note_index(&note.id) {
                    state.notes.remove(index);
                }
            }
            ConfirmRequest::CreateFile(_)
            | ConfirmRequest::DeleteFile(_)
            | ConfirmRequest::DeleteNotes(_) => {
                tracing::warn!(error = %message, "Follow-up request failed");
            }
        }
    }

    tracing::debug!(intent = pending.intent, entity = %pending.entity, "Mutation confirmed");
    Reconciled {
        state,
        phase: MutationPhase::Confirmed,
        failure: None,
    }
}

fn ensure_idle(state: &LibraryState, id: &EntityId) -> Result<()> {
    if state.is_in_flight(id) {
        return Err(Error::MutationInFlight(id.clone()));
    }
    Ok(())
}

/// Insert `file` and make it the selection with only free notes visible.
fn select_new_file(state: &mut LibraryState, file: &LibraryFile) -> SelectionSnapshot {
    let previous = SelectionSnapshot::take(state);
    state.files.push(file.clone());
    state.selected_file = Some(file.id.clone());
    state.excerpt_draft = ExcerptDraft::for_file(file);
    previous
}

fn roll_back(state: &mut LibraryState, undo: Undo) {
    match undo {
        Undo::RemoveExcerpt { note_id, content } => {
            state.notes.retain(|note| note.id != note_id);
            state.excerpt_draft.content = content;
        }
        Undo::RemoveFreeNote { note_id, draft } => {
            state.notes.retain(|note| note.id != note_id);
            state.free_draft = draft;
        }
        Undo::ReinsertNote { index, note } => {
            state.restore_notes(vec![(index, note)]);
        }
        Undo::RemoveFile {
            file_id,
            note_id,
            previous,
        } => {
            state.files.retain(|file| file.id != file_id);
            if let Some(note_id) = note_id {
                state.notes.retain(|note| note.id != note_id);
            }
            if state.selected_file.as_ref() == Some(&file_id) {
                state.notes.retain(|note| note.is_free());
                previous.restore(state);
            }
        }
        Undo::ReinsertFile {
            index,
            file,
            notes,
            selected_file,
            excerpt_draft,
        } => {
            let index = index.min(state.files.len());
            state.files.insert(index, file);
            if selected_file != state.selected_file {
                state.notes.retain(|note| note.is_free());
                state.selected_file = selected_file;
                state.excerpt_draft = excerpt_draft;
            }
            state.restore_notes(notes);
        }
    }
}
