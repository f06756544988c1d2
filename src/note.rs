use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 50;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Title,
    Description,
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteField::Title => f.write_str("title"),
            NoteField::Description => f.write_str("description"),
        }
    }
}

/// Title/description pair after trimming and truncation, not yet checked for
/// emptiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent {
    pub title: String,
    pub description: String,
}

impl NoteContent {
    pub fn normalize(title: &str, description: &str) -> Self {
        Self {
            title: clamp_title(title.trim()).trim_end().to_string(),
            description: clamp_description(description.trim()).trim_end().to_string(),
        }
    }

    /// First empty field, title checked before description.
    pub fn missing_field(&self) -> Option<NoteField> {
        if self.title.is_empty() {
            Some(NoteField::Title)
        } else if self.description.is_empty() {
            Some(NoteField::Description)
        } else {
            None
        }
    }
}

pub fn char_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Longest prefix of `text` holding at most `max` user-perceived characters.
pub fn clamp_chars(text: &str, max: usize) -> &str {
    match text.grapheme_indices(true).nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn clamp_title(text: &str) -> &str {
    clamp_chars(text, MAX_TITLE_CHARS)
}

pub fn clamp_description(text: &str) -> &str {
    clamp_chars(text, MAX_DESCRIPTION_CHARS)
}
