//! Locally rendered library state and pure selection helpers.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::{EntityId, ExcerptDraft, LibraryFile, Note};

/// Everything a library view renders: files, the visible notes, the current
/// selection and the two input drafts.
///
/// `notes` holds every free note plus the excerpts of the selected file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    pub files: Vec<LibraryFile>,
    pub notes: Vec<Note>,
    pub selected_file: Option<EntityId>,
    pub excerpt_draft: ExcerptDraft,
    pub free_draft: String,
    pub(crate) in_flight: HashSet<EntityId>,
}

impl LibraryState {
    /// Build the initial view: all free notes, the first file selected, and
    /// that file's excerpts.
    pub fn initial(
        files: Vec<LibraryFile>,
        all_notes: Vec<Note>,
        first_file_notes: Vec<Note>,
    ) -> Self {
        let (free, _) = partition_notes(all_notes);
        let mut state = Self {
            files,
            notes: free,
            ..Self::default()
        };
        if let Some(first) = state.files.first().map(|file| file.id.clone()) {
            state = select_file(&state, &first, first_file_notes).unwrap_or(state);
        }
        state
    }

    pub fn selected(&self) -> Option<&LibraryFile> {
        let selected = self.selected_file.as_ref()?;
        self.file(selected)
    }

    pub fn file(&self, id: &EntityId) -> Option<&LibraryFile> {
        self.files.iter().find(|file| &file.id == id)
    }

    pub fn free_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|note| note.is_free())
    }

    /// Excerpts of the selected file.
    pub fn excerpts(&self) -> impl Iterator<Item = &Note> {
        let selected = self.selected_file.clone();
        self.notes.iter().filter(move |note| {
            selected
                .as_ref()
                .is_some_and(|file_id| note.belongs_to(file_id))
        })
    }

    /// Whether a confirm request for `id` has not resolved yet.
    pub fn is_in_flight(&self, id: &EntityId) -> bool {
        self.in_flight.contains(id)
    }

    pub(crate) fn file_index(&self, id: &EntityId) -> Option<usize> {
        self.files.iter().position(|file| &file.id == id)
    }

    pub(crate) fn note_index(&self, id: &EntityId) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }

    /// Remove every excerpt from `notes`, returning them with their positions.
    pub(crate) fn take_excerpts(&mut self) -> Vec<(usize, Note)> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.notes.len());
        for (index, note) in std::mem::take(&mut self.notes).into_iter().enumerate() {
            if note.is_free() {
                kept.push(note);
            } else {
                taken.push((index, note));
            }
        }
        self.notes = kept;
        taken
    }

    /// Re-insert notes captured with [`Self::take_excerpts`] or a delete.
    pub(crate) fn restore_notes(&mut self, captured: Vec<(usize, Note)>) {
        for (index, note) in captured {
            let index = index.min(self.notes.len());
            self.notes.insert(index, note);
        }
    }
}

/// Split notes into `(free, not free)` preserving order.
///
/// Every note lands in exactly one side.
pub fn partition_notes(notes: Vec<Note>) -> (Vec<Note>, Vec<Note>) {
    notes.into_iter().partition(Note::is_free)
}

/// Switch the selection to `file_id`.
///
/// Free notes already loaded are kept as they are; excerpts are replaced by
/// exactly those in `fetched` that belong to the new file. The excerpt draft
/// is reset from the file's metadata.
pub fn select_file(
    state: &LibraryState,
    file_id: &EntityId,
    fetched: Vec<Note>,
) -> Result<LibraryState> {
    let file = state
        .file(file_id)
        .ok_or_else(|| Error::NotFound(format!("file {file_id}")))?;

    let mut next = state.clone();
    next.excerpt_draft = ExcerptDraft::for_file(file);
    next.selected_file = Some(file_id.clone());

    let (free, _) = partition_notes(std::mem::take(&mut next.notes));
    let (_, excerpts) = partition_notes(fetched);
    next.notes = free;
    next.notes
        .extend(excerpts.into_iter().filter(|note| note.belongs_to(file_id)));
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteKind;
    use pretty_assertions::assert_eq;

    fn file(id: i64, title: &str) -> LibraryFile {
        let mut file = LibraryFile::manual(title, "Author", "2024-01-01", "1");
        file.id = EntityId::from(id);
        file
    }

    fn excerpt(file_id: i64, content: &str) -> Note {
        Note::excerpt(
            EntityId::from(file_id),
            &ExcerptDraft {
                content: content.to_string(),
                ..ExcerptDraft::default()
            },
        )
    }

    #[test]
    fn partition_has_no_overlap_and_no_loss() {
        let notes = vec![
            Note::free("a"),
            excerpt(1, "b"),
            Note::free("c"),
            excerpt(2, "d"),
        ];
        let (free, other) = partition_notes(notes.clone());

        assert_eq!(free.len() + other.len(), notes.len());
        assert!(free.iter().all(|note| note.kind == NoteKind::Free));
        assert!(other.iter().all(|note| note.kind != NoteKind::Free));
        for note in &notes {
            let hits = free.iter().chain(other.iter()).filter(|n| n.id == note.id).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn selecting_another_file_keeps_free_notes_and_swaps_excerpts() {
        let free_a = Note::free("free a");
        let free_b = Note::free("free b");
        let a1 = excerpt(1, "a1");
        let b1 = excerpt(2, "b1");
        let b2 = excerpt(2, "b2");

        let state = LibraryState::initial(
            vec![file(1, "A"), file(2, "B")],
            vec![free_a.clone(), a1.clone(), free_b.clone()],
            vec![a1.clone()],
        );
        assert_eq!(state.selected_file, Some(EntityId::from(1)));
        assert_eq!(state.notes, vec![free_a.clone(), free_b.clone(), a1]);

        // The backend may hand back stray notes; only B's excerpts are kept.
        let fetched = vec![b1.clone(), Note::free("stray"), excerpt(1, "stale"), b2.clone()];
        let next = select_file(&state, &EntityId::from(2), fetched).unwrap();

        assert_eq!(next.selected_file, Some(EntityId::from(2)));
        assert_eq!(next.free_notes().cloned().collect::<Vec<_>>(), vec![free_a, free_b]);
        assert_eq!(next.excerpts().cloned().collect::<Vec<_>>(), vec![b1, b2]);
        assert_eq!(next.excerpt_draft.title, "B");
        assert_eq!(next.excerpt_draft.content, "");
    }

    #[test]
    fn selecting_unknown_file_is_not_found() {
        let state = LibraryState::default();
        assert!(matches!(
            select_file(&state, &EntityId::from(9), Vec::new()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn initial_state_without_files_keeps_only_free_notes() {
        let free = Note::free("x");
        let state =
            LibraryState::initial(Vec::new(), vec![free.clone(), excerpt(1, "y")], Vec::new());
        assert_eq!(state.notes, vec![free]);
        assert!(state.selected_file.is_none());
    }

    #[test]
    fn take_and_restore_excerpts_preserves_order() {
        let mut state = LibraryState {
            notes: vec![excerpt(1, "a"), Note::free("b"), excerpt(1, "c")],
            ..LibraryState::default()
        };
        let before = state.notes.clone();
        let taken = state.take_excerpts();
        assert_eq!(state.notes.len(), 1);
        state.restore_notes(taken);
        assert_eq!(state.notes, before);
    }
}
