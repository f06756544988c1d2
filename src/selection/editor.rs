use unicode_segmentation::UnicodeSegmentation;

use crate::note::{clamp_chars, Note, NoteField, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};

/// One editable text field. Every edit is followed by truncation to
/// `max_chars`, so the buffer never exceeds its limit while typing.
#[derive(Debug, Clone)]
pub struct FieldBuffer {
    text: String,
    cursor: usize,
    max_chars: usize,
    preferred_column: Option<usize>,
}

impl FieldBuffer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            max_chars,
            preferred_column: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn char_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = clamp_chars(text, self.max_chars).to_string();
        self.cursor = self.text.len();
        self.preferred_column = None;
    }

    pub fn insert_str(&mut self, input: &str) -> bool {
        if input.is_empty() {
            return false;
        }
        let before = self.text.clone();
        self.text.insert_str(self.cursor, input);
        self.cursor += input.len();
        self.enforce_limit();
        self.preferred_column = None;
        self.text != before
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.insert_str(encoded)
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.text, self.cursor);
        self.text.drain(prev..self.cursor);
        self.cursor = prev;
        self.preferred_column = None;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.text, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.text.drain(self.cursor..next);
        self.preferred_column = None;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.text, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.text, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.text, self.cursor);
        if self.cursor == start {
            return false;
        }
        self.cursor = start;
        self.preferred_column = Some(0);
        true
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.text, self.cursor);
        if self.cursor == end {
            return false;
        }
        self.cursor = end;
        self.preferred_column = None;
        true
    }

    pub fn move_up(&mut self) -> bool {
        let current_start = line_start(&self.text, self.cursor);
        if current_start == 0 {
            return false;
        }
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.text, current_start, self.cursor));
        let prev_start = line_start(&self.text, current_start - 1);
        self.cursor = position_for_column(&self.text, prev_start, column);
        self.preferred_column = Some(column);
        true
    }

    pub fn move_down(&mut self) -> bool {
        let current_end = line_end(&self.text, self.cursor);
        if current_end == self.text.len() {
            return false;
        }
        let current_start = line_start(&self.text, self.cursor);
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.text, current_start, self.cursor));
        self.cursor = position_for_column(&self.text, current_end + 1, column);
        self.preferred_column = Some(column);
        true
    }

    fn enforce_limit(&mut self) {
        let clamped_len = clamp_chars(&self.text, self.max_chars).len();
        if clamped_len < self.text.len() {
            self.text.truncate(clamped_len);
            self.cursor = self.cursor.min(self.text.len());
        }
    }
}

/// Title and description buffers backing the editor pane, plus the values
/// last loaded from or saved to the store.
#[derive(Debug, Clone)]
pub struct EditorForm {
    title: FieldBuffer,
    description: FieldBuffer,
    focus: NoteField,
    saved_title: String,
    saved_description: String,
}

impl Default for EditorForm {
    fn default() -> Self {
        Self::blank()
    }
}

impl EditorForm {
    pub fn blank() -> Self {
        Self {
            title: FieldBuffer::new(MAX_TITLE_CHARS),
            description: FieldBuffer::new(MAX_DESCRIPTION_CHARS),
            focus: NoteField::Title,
            saved_title: String::new(),
            saved_description: String::new(),
        }
    }

    pub fn for_note(note: &Note) -> Self {
        let mut form = Self::blank();
        form.mark_saved(note);
        form
    }

    pub fn title(&self) -> &str {
        self.title.text()
    }

    pub fn description(&self) -> &str {
        self.description.text()
    }

    pub fn field(&self, field: NoteField) -> &FieldBuffer {
        match field {
            NoteField::Title => &self.title,
            NoteField::Description => &self.description,
        }
    }

    pub fn focus(&self) -> NoteField {
        self.focus
    }

    pub fn set_focus(&mut self, field: NoteField) {
        self.focus = field;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            NoteField::Title => NoteField::Description,
            NoteField::Description => NoteField::Title,
        };
    }

    pub fn focused_mut(&mut self) -> &mut FieldBuffer {
        match self.focus {
            NoteField::Title => &mut self.title,
            NoteField::Description => &mut self.description,
        }
    }

    pub fn set_title(&mut self, text: &str) {
        self.title.set_text(text);
    }

    pub fn set_description(&mut self, text: &str) {
        self.description.set_text(text);
    }

    /// Newlines only make sense in the description; in the title Enter moves
    /// focus down instead.
    pub fn insert_newline(&mut self) -> bool {
        match self.focus {
            NoteField::Title => {
                self.focus = NoteField::Description;
                false
            }
            NoteField::Description => self.description.insert_char('\n'),
        }
    }

    /// Save is offered only while both buffers hold something.
    pub fn can_save(&self) -> bool {
        !self.title.text().is_empty() && !self.description.text().is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.title.text() != self.saved_title || self.description.text() != self.saved_description
    }

    pub fn revert(&mut self) {
        let title = self.saved_title.clone();
        let description = self.saved_description.clone();
        self.title.set_text(&title);
        self.description.set_text(&description);
    }

    pub fn mark_saved(&mut self, note: &Note) {
        self.title.set_text(&note.title);
        self.description.set_text(&note.description);
        self.saved_title = self.title.text().to_string();
        self.saved_description = self.description.text().to_string();
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let end = line_end(text, line_start);
    text[line_start..end]
        .grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| line_start + idx)
        .unwrap_or(end)
}
