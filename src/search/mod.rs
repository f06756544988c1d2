use crate::note::Note;

/// Case-insensitive substring filter over title and description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    needle: Option<String>,
}

impl SearchFilter {
    pub fn new(input: &str) -> Self {
        if input.is_empty() {
            Self { needle: None }
        } else {
            Self {
                needle: Some(input.to_lowercase()),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_none()
    }

    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    pub fn matches(&self, note: &Note) -> bool {
        let Some(needle) = self.needle.as_deref() else {
            return true;
        };
        contains_folded(&note.title, needle) || contains_folded(&note.description, needle)
    }
}

impl From<Option<&str>> for SearchFilter {
    fn from(input: Option<&str>) -> Self {
        input.map(SearchFilter::new).unwrap_or_default()
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteId;

    fn note(title: &str, description: &str) -> Note {
        Note {
            id: NoteId::new(),
            title: title.into(),
            description: description.into(),
            created_at: 0,
        }
    }

    #[test]
    fn matches_title_or_description_ignoring_case() {
        let filter = SearchFilter::new("CAT");
        assert!(filter.matches(&note("Category", "x")));
        assert!(filter.matches(&note("dog", "buy cat food")));
        assert!(!filter.matches(&note("dog", "bone")));
    }

    #[test]
    fn empty_input_matches_everything() {
        let filter = SearchFilter::new("");
        assert!(filter.is_empty());
        assert!(filter.matches(&note("anything", "at all")));
        assert!(SearchFilter::from(None).matches(&note("a", "b")));
    }

    #[test]
    fn whitespace_is_part_of_the_needle() {
        let filter = SearchFilter::new(" food");
        assert!(filter.matches(&note("dog", "cat food")));
        assert!(!filter.matches(&note("food", "none")));
    }
}
