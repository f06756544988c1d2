use crate::highlight::Highlight;
use crate::note::Note;
use crate::notice::NoticeKind;
use crate::selection::{EditorMode, SelectionController};

pub const EMPTY_PLACEHOLDER: &str = "Add a note";
pub const UNSELECTED_PLACEHOLDER: &str = "Select a note or create a new one";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    List,
    Search,
    Editor,
}

pub struct AppState {
    controller: SelectionController,
    focus: FocusPane,
    highlight: Highlight,
}

impl AppState {
    pub fn new(controller: SelectionController, highlight: Highlight) -> Self {
        Self {
            controller,
            focus: FocusPane::List,
            highlight,
        }
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SelectionController {
        &mut self.controller
    }

    pub fn focus(&self) -> FocusPane {
        self.focus
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    pub fn visible_notes(&self) -> Vec<Note> {
        self.controller.visible_notes()
    }

    /// Row of the selected note in `visible`, if it survived the filter.
    pub fn selected_index(&self, visible: &[Note]) -> Option<usize> {
        let id = self.controller.selected_id()?;
        visible.iter().position(|note| note.id == id)
    }

    pub fn placeholder(&self) -> &'static str {
        if self.controller.store().is_empty() {
            EMPTY_PLACEHOLDER
        } else {
            UNSELECTED_PLACEHOLDER
        }
    }

    pub fn begin_search(&mut self) {
        self.focus = FocusPane::Search;
    }

    pub fn finish_search(&mut self) {
        self.focus = FocusPane::List;
    }

    pub fn cancel_search(&mut self) {
        self.controller.set_search("");
        self.focus = FocusPane::List;
    }

    pub fn push_search_char(&mut self, ch: char) {
        let mut query = self.controller.search().to_string();
        query.push(ch);
        self.controller.set_search(query);
    }

    pub fn pop_search_char(&mut self) {
        let mut query = self.controller.search().to_string();
        if query.pop().is_some() {
            self.controller.set_search(query);
        }
    }

    pub fn begin_new(&mut self) {
        self.controller.begin_new();
        self.focus = FocusPane::Editor;
    }

    pub fn enter_editor(&mut self) -> bool {
        if self.controller.mode() == EditorMode::Closed {
            return false;
        }
        self.focus = FocusPane::Editor;
        true
    }

    /// Esc from the editor: drops a new draft or reverts unsaved edits.
    pub fn leave_editor(&mut self) {
        self.controller.cancel();
        self.focus = FocusPane::List;
    }

    pub fn save(&mut self) -> bool {
        match self.controller.save() {
            Ok(Some(note)) => {
                tracing::info!(id = %note.id, "note saved");
                self.controller
                    .notify(NoticeKind::Info, format!("Saved \"{}\"", note.title));
                self.focus = FocusPane::List;
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(%err, "save failed");
                false
            }
        }
    }

    pub fn request_delete(&mut self) -> bool {
        self.controller.request_delete()
    }

    pub fn confirm_delete(&mut self) {
        match self.controller.confirm_delete() {
            Ok(Some(id)) => {
                tracing::info!(%id, "note deleted");
                self.controller.notify(NoticeKind::Info, "Note deleted");
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "delete failed"),
        }
        self.focus = FocusPane::List;
    }

    pub fn cancel_delete(&mut self) {
        self.controller.cancel_delete();
    }

    pub fn status_hints(&self) -> &'static str {
        if self.controller.is_delete_pending() {
            return "y/Enter delete • n/Esc keep";
        }
        match self.focus {
            FocusPane::List => {
                "j/k move • n new • e/Enter edit • d delete • / search • q quit"
            }
            FocusPane::Search => "type to filter • Enter keep filter • Esc clear",
            FocusPane::Editor if self.controller.form().can_save() => {
                "Tab switch field • Ctrl-s save • Esc cancel"
            }
            FocusPane::Editor => "Tab switch field • fill in both fields to save • Esc cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccentColor;
    use crate::notice::Notice;
    use crate::storage::MemoryBackend;
    use crate::store::NoteStore;

    fn state_with(titles: &[&str]) -> anyhow::Result<AppState> {
        let mut store = NoteStore::open(Box::new(MemoryBackend::new()))?;
        for title in titles {
            store.create(title, "body")?;
        }
        let controller = SelectionController::new(store, Notice::default());
        Ok(AppState::new(controller, Highlight::new(AccentColor::Blue)))
    }

    #[test]
    fn search_typing_narrows_list_but_keeps_selection() -> anyhow::Result<()> {
        let mut state = state_with(&["alpha", "beta"])?;
        let selected = state.controller().selected_id();
        state.begin_search();
        for ch in "alp".chars() {
            state.push_search_char(ch);
        }
        let visible = state.visible_notes();
        assert_eq!(visible.len(), 1);
        assert_eq!(state.controller().selected_id(), selected);
        assert_eq!(state.selected_index(&visible), None);

        state.cancel_search();
        assert_eq!(state.visible_notes().len(), 2);
        assert_eq!(state.focus(), FocusPane::List);
        Ok(())
    }

    #[test]
    fn placeholder_depends_on_store_contents() -> anyhow::Result<()> {
        let empty = state_with(&[])?;
        assert_eq!(empty.placeholder(), EMPTY_PLACEHOLDER);
        assert!(!state_with(&[])?.enter_editor());

        let filled = state_with(&["one"])?;
        assert_eq!(filled.placeholder(), UNSELECTED_PLACEHOLDER);
        Ok(())
    }

    #[test]
    fn save_returns_focus_to_list_with_notice() -> anyhow::Result<()> {
        let mut state = state_with(&[])?;
        state.begin_new();
        state.controller_mut().form_mut().set_title("Plan");
        assert!(state.status_hints().contains("fill in both fields"));
        state.controller_mut().form_mut().set_description("steps");
        assert!(state.status_hints().contains("Ctrl-s save"));
        assert!(state.save());
        assert_eq!(state.focus(), FocusPane::List);
        assert_eq!(
            state.controller().notice().message(),
            Some("Saved \"Plan\"")
        );
        Ok(())
    }
}
