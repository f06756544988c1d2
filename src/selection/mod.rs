//! Active-note tracking on top of [`NoteStore`].
//!
//! The controller holds ids only; every mutation goes through the store and
//! the selection is recomputed from the collection the store reports back.

use std::time::Instant;

use crate::note::{Note, NoteId};
use crate::notice::{Notice, NoticeKind};
use crate::store::{NoteOrder, NoteStore, StoreError, StoreResult};

mod editor;

pub use editor::{EditorForm, FieldBuffer};

pub const VALIDATION_MESSAGE: &str = "Please fill in both title and description";
pub const NOTHING_TO_DELETE_MESSAGE: &str = "There are no notes to delete.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    None,
    Viewing(NoteId),
    CreatingNew { previous: Option<NoteId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Closed,
    CreatingNew,
    EditingExisting,
}

pub struct SelectionController {
    store: NoteStore,
    selection: Selection,
    search: String,
    order: NoteOrder,
    form: EditorForm,
    pending_delete: Option<NoteId>,
    notice: Notice,
}

impl SelectionController {
    pub fn new(store: NoteStore, notice: Notice) -> Self {
        let mut controller = Self {
            store,
            selection: Selection::None,
            search: String::new(),
            order: NoteOrder::Alphabetical,
            form: EditorForm::blank(),
            pending_delete: None,
            notice,
        };
        controller.ensure_default_selection();
        controller
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn mode(&self) -> EditorMode {
        match self.selection {
            Selection::None => EditorMode::Closed,
            Selection::Viewing(_) => EditorMode::EditingExisting,
            Selection::CreatingNew { .. } => EditorMode::CreatingNew,
        }
    }

    pub fn selected_id(&self) -> Option<NoteId> {
        match self.selection {
            Selection::Viewing(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected_id().and_then(|id| self.store.get(id))
    }

    pub fn form(&self) -> &EditorForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EditorForm {
        &mut self.form
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    pub fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice.show(kind, message);
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_delete_pending(&self) -> bool {
        self.pending_delete.is_some()
    }

    pub fn pending_delete(&self) -> Option<&Note> {
        self.pending_delete.and_then(|id| self.store.get(id))
    }

    pub fn order(&self) -> NoteOrder {
        self.order
    }

    /// Changes how the list pane is sorted. Delete still moves to the
    /// alphabetical neighbour.
    pub fn set_order(&mut self, order: NoteOrder) {
        self.order = order;
    }

    /// Notes shown in the list pane: the current search applied to the
    /// configured ordering.
    pub fn visible_notes(&self) -> Vec<Note> {
        self.store.list_in(self.order, Some(self.search.as_str()))
    }

    /// Filtering only narrows the visible list, the selection is left alone.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    /// With nothing selected, pick the most recently created note.
    pub fn ensure_default_selection(&mut self) {
        if self.selection != Selection::None {
            return;
        }
        if let Some(id) = self.store.most_recent().map(|note| note.id) {
            tracing::debug!(%id, "defaulting selection to most recent note");
            self.view(id);
        }
    }

    pub fn select(&mut self, id: NoteId) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.view(id);
        true
    }

    pub fn select_next(&mut self) -> bool {
        self.step_visible(1)
    }

    pub fn select_previous(&mut self) -> bool {
        self.step_visible(-1)
    }

    pub fn begin_new(&mut self) {
        let previous = match self.selection {
            Selection::Viewing(id) => Some(id),
            Selection::CreatingNew { previous } => previous,
            Selection::None => None,
        };
        self.selection = Selection::CreatingNew { previous };
        self.form = EditorForm::blank();
    }

    /// Leaves the create editor, or reverts unsaved edits of an existing note.
    pub fn cancel(&mut self) {
        match self.selection {
            Selection::CreatingNew { previous } => {
                self.selection = Selection::None;
                self.form = EditorForm::blank();
                if let Some(id) = previous.filter(|id| self.store.contains(*id)) {
                    self.view(id);
                }
            }
            Selection::Viewing(_) => self.form.revert(),
            Selection::None => {}
        }
    }

    /// Saves the editor buffers. Returns `Ok(None)` when no editor is open.
    pub fn save(&mut self) -> StoreResult<Option<Note>> {
        let result = match self.selection {
            Selection::None => return Ok(None),
            Selection::CreatingNew { .. } => {
                self.store.create(self.form.title(), self.form.description())
            }
            Selection::Viewing(id) => {
                self.store
                    .update(id, self.form.title(), self.form.description())
            }
        };
        match result {
            Ok(note) => {
                self.selection = Selection::Viewing(note.id);
                self.form.mark_saved(&note);
                Ok(Some(note))
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Arms a delete confirmation for the selected note.
    pub fn request_delete(&mut self) -> bool {
        match self.selected_id() {
            Some(id) => self.request_delete_of(id),
            None => {
                self.notice.show(NoticeKind::Info, NOTHING_TO_DELETE_MESSAGE);
                false
            }
        }
    }

    pub fn request_delete_of(&mut self, id: NoteId) -> bool {
        self.pending_delete = Some(id);
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Runs the armed delete. When the deleted note was selected, selection
    /// moves to its alphabetical successor, else its predecessor.
    pub fn confirm_delete(&mut self) -> StoreResult<Option<NoteId>> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(None);
        };
        let successor = next_after_delete(&self.store.list(None), id);
        if let Err(err) = self.store.delete(id) {
            self.report(&err);
            return Err(err);
        }
        match self.selection {
            Selection::Viewing(current) if current == id => match successor {
                Some(next) => self.view(next),
                None => {
                    self.selection = Selection::None;
                    self.form = EditorForm::blank();
                }
            },
            Selection::CreatingNew {
                previous: Some(previous),
            } if previous == id => {
                self.selection = Selection::CreatingNew { previous: None };
            }
            _ => {}
        }
        Ok(Some(id))
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.notice.tick(now)
    }

    fn view(&mut self, id: NoteId) {
        self.selection = Selection::Viewing(id);
        self.form = match self.store.get(id) {
            Some(note) => EditorForm::for_note(note),
            None => EditorForm::blank(),
        };
    }

    fn step_visible(&mut self, delta: isize) -> bool {
        let visible = self.visible_notes();
        if visible.is_empty() {
            return false;
        }
        let current = self
            .selected_id()
            .and_then(|id| visible.iter().position(|note| note.id == id));
        let target = match current {
            Some(idx) => {
                let next = idx as isize + delta;
                if next < 0 || next as usize >= visible.len() {
                    return false;
                }
                next as usize
            }
            None if delta < 0 => visible.len() - 1,
            None => 0,
        };
        self.view(visible[target].id);
        true
    }

    fn report(&mut self, err: &StoreError) {
        match err {
            StoreError::Validation(validation) => {
                tracing::debug!(field = %validation.field, "save rejected");
                self.notice.show(NoticeKind::Error, VALIDATION_MESSAGE);
            }
            StoreError::NotFound(id) => {
                tracing::warn!(%id, "note vanished, clearing selection");
                self.selection = Selection::None;
                self.form = EditorForm::blank();
                self.notice.show(NoticeKind::Error, err.to_string());
            }
            StoreError::Io(_) => {
                self.notice.show(NoticeKind::Error, err.to_string());
            }
        }
    }
}

/// Neighbour to select after `deleted` leaves `ordered`: the following
/// entry, else the preceding one.
pub fn next_after_delete(ordered: &[Note], deleted: NoteId) -> Option<NoteId> {
    let idx = ordered.iter().position(|note| note.id == deleted)?;
    ordered
        .get(idx + 1)
        .or_else(|| idx.checked_sub(1).and_then(|prev| ordered.get(prev)))
        .map(|note| note.id)
}
