//! In-memory note collection with write-through persistence.
//!
//! [`NoteStore`] is the only writer of the collection. Every mutation is
//! applied in memory, handed to the [`NoteBackend`] as a full snapshot, and
//! rolled back if the backend reports a failure, so callers never observe a
//! half-applied change.

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::note::{Note, NoteContent, NoteId};
use crate::search::SearchFilter;
use crate::storage::NoteBackend;

mod error;

pub use error::{StoreError, StoreResult, ValidationError};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum NoteOrder {
    /// Case-insensitive by title; ties keep insertion order.
    #[default]
    Alphabetical,
    /// Oldest first, in the order notes were created.
    Insertion,
}

pub struct NoteStore {
    notes: IndexMap<NoteId, Note>,
    backend: Box<dyn NoteBackend>,
}

impl NoteStore {
    pub fn open(backend: Box<dyn NoteBackend>) -> anyhow::Result<Self> {
        let loaded = backend
            .load_all()
            .with_context(|| format!("loading notes from {}", backend.describe()))?;
        let mut notes = IndexMap::with_capacity(loaded.len());
        for mut note in loaded {
            if notes.contains_key(&note.id) {
                tracing::warn!(id = %note.id, "duplicate note id in storage, keeping first");
                continue;
            }
            let content = NoteContent::normalize(&note.title, &note.description);
            if let Some(field) = content.missing_field() {
                tracing::warn!(id = %note.id, %field, "skipping stored note with empty field");
                continue;
            }
            if content.title != note.title || content.description != note.description {
                tracing::warn!(id = %note.id, "stored note exceeds field limits, normalising");
                note.title = content.title;
                note.description = content.description;
            }
            notes.insert(note.id, note);
        }
        tracing::info!(count = notes.len(), backend = %backend.describe(), "notes loaded");
        Ok(Self { notes, backend })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.contains_key(&id)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    /// Last note in insertion order.
    pub fn most_recent(&self) -> Option<&Note> {
        self.notes.last().map(|(_, note)| note)
    }

    pub fn list(&self, filter: Option<&str>) -> Vec<Note> {
        self.list_in(NoteOrder::Alphabetical, filter)
    }

    pub fn list_in(&self, order: NoteOrder, filter: Option<&str>) -> Vec<Note> {
        let filter = SearchFilter::from(filter);
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .filter(|note| filter.matches(note))
            .cloned()
            .collect();
        if order == NoteOrder::Alphabetical {
            sort_alphabetically(&mut notes);
        }
        notes
    }

    pub fn create(&mut self, title: &str, description: &str) -> StoreResult<Note> {
        let content = validated(title, description)?;
        let note = Note {
            id: NoteId::new(),
            title: content.title,
            description: content.description,
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        let before = self.notes.clone();
        self.notes.insert(note.id, note.clone());
        self.commit(before)?;
        tracing::debug!(id = %note.id, "note created");
        Ok(note)
    }

    pub fn update(&mut self, id: NoteId, title: &str, description: &str) -> StoreResult<Note> {
        if !self.notes.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        let content = validated(title, description)?;
        let before = self.notes.clone();
        let Some(note) = self.notes.get_mut(&id) else {
            return Err(StoreError::NotFound(id));
        };
        if note.title == content.title && note.description == content.description {
            return Ok(note.clone());
        }
        note.title = content.title;
        note.description = content.description;
        let updated = note.clone();
        self.commit(before)?;
        tracing::debug!(%id, "note updated");
        Ok(updated)
    }

    pub fn delete(&mut self, id: NoteId) -> StoreResult<()> {
        let before = self.notes.clone();
        if self.notes.shift_remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        self.commit(before)?;
        tracing::debug!(%id, "note deleted");
        Ok(())
    }

    fn commit(&mut self, before: IndexMap<NoteId, Note>) -> StoreResult<()> {
        let snapshot: Vec<Note> = self.notes.values().cloned().collect();
        if let Err(err) = self.backend.persist(&snapshot) {
            tracing::error!(?err, backend = %self.backend.describe(), "persist failed, rolling back");
            self.notes = before;
            return Err(StoreError::Io(err));
        }
        Ok(())
    }
}

fn validated(title: &str, description: &str) -> StoreResult<NoteContent> {
    let content = NoteContent::normalize(title, description);
    if let Some(field) = content.missing_field() {
        return Err(ValidationError { field }.into());
    }
    Ok(content)
}

fn sort_alphabetically(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{char_count, NoteField};
    use crate::storage::MemoryBackend;
    use assert_matches::assert_matches;

    fn store() -> (MemoryBackend, NoteStore) {
        let backend = MemoryBackend::new();
        let store = NoteStore::open(Box::new(backend.clone())).expect("open store");
        (backend, store)
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|note| note.title.as_str()).collect()
    }

    #[test]
    fn create_trims_and_lists_exactly_once() -> anyhow::Result<()> {
        let (backend, mut store) = store();
        let note = store.create("  Shopping  ", "\teggs and milk \n")?;
        assert_eq!(note.title, "Shopping");
        assert_eq!(note.description, "eggs and milk");

        let listed = store.list(Some(""));
        let matching: Vec<_> = listed
            .iter()
            .filter(|n| n.title == "Shopping" && n.description == "eggs and milk")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(backend.persisted(), vec![note]);
        Ok(())
    }

    #[test]
    fn create_rejects_blank_fields_without_touching_collection() {
        let (backend, mut store) = store();
        for title in ["", "  "] {
            let err = store.create(title, "x").unwrap_err();
            assert_matches!(
                err,
                StoreError::Validation(ValidationError {
                    field: NoteField::Title
                })
            );
        }
        assert_matches!(
            store.create("title", " \n "),
            Err(StoreError::Validation(ValidationError {
                field: NoteField::Description
            }))
        );
        assert!(store.is_empty());
        assert_eq!(backend.persist_count(), 0);
    }

    #[test]
    fn create_truncates_to_field_limits() -> anyhow::Result<()> {
        let (_backend, mut store) = store();
        let note = store.create(&"A".repeat(60), &"B".repeat(1500))?;
        assert_eq!(char_count(&note.title), 50);
        assert_eq!(char_count(&note.description), 1000);
        Ok(())
    }

    #[test]
    fn update_overwrites_in_place_and_keeps_id() -> anyhow::Result<()> {
        let (_backend, mut store) = store();
        let first = store.create("First", "one")?;
        let second = store.create("Second", "two")?;

        let updated = store.update(first.id, " Renamed ", "changed")?;
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.title, "Renamed");
        assert_eq!(store.len(), 2);

        let listed = store.list(None);
        let found = listed.iter().find(|n| n.id == first.id).expect("updated note");
        assert_eq!(found.description, "changed");
        let order = store.list_in(NoteOrder::Insertion, None);
        assert_eq!(order[0].id, first.id);
        assert_eq!(order[1].id, second.id);
        Ok(())
    }

    #[test]
    fn identical_update_leaves_note_unchanged() -> anyhow::Result<()> {
        let (backend, mut store) = store();
        let note = store.create("Same", "content")?;
        let persisted_before = backend.persist_count();

        let again = store.update(note.id, "Same", "content")?;
        assert_eq!(again, note);
        assert_eq!(backend.persist_count(), persisted_before);
        Ok(())
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let (_backend, mut store) = store();
        let ghost = NoteId::new();
        assert_matches!(store.update(ghost, "t", "d"), Err(StoreError::NotFound(id)) if id == ghost);
        assert_matches!(store.delete(ghost), Err(StoreError::NotFound(id)) if id == ghost);
    }

    #[test]
    fn delete_removes_exactly_one() -> anyhow::Result<()> {
        let (backend, mut store) = store();
        let keep = store.create("Keep", "k")?;
        let gone = store.create("Drop", "d")?;

        store.delete(gone.id)?;
        assert_eq!(store.len(), 1);
        assert!(!store.list(None).iter().any(|n| n.id == gone.id));
        assert_eq!(backend.persisted(), vec![keep]);
        Ok(())
    }

    #[test]
    fn failed_persist_rolls_back_each_mutation() -> anyhow::Result<()> {
        let (backend, mut store) = store();
        let note = store.create("Stable", "body")?;

        backend.fail_next_persist();
        assert_matches!(store.create("New", "body"), Err(StoreError::Io(_)));
        assert_eq!(store.len(), 1);

        backend.fail_next_persist();
        assert_matches!(store.update(note.id, "Edited", "body"), Err(StoreError::Io(_)));
        assert_eq!(store.get(note.id).map(|n| n.title.as_str()), Some("Stable"));

        backend.fail_next_persist();
        assert_matches!(store.delete(note.id), Err(StoreError::Io(_)));
        assert!(store.contains(note.id));

        assert_eq!(backend.persisted(), vec![note]);
        Ok(())
    }

    #[test]
    fn list_filters_case_insensitively_in_alphabetical_order() -> anyhow::Result<()> {
        let (_backend, mut store) = store();
        store.create("dog", "cat food")?;
        store.create("Category", "misc")?;
        store.create("bird", "seeds")?;

        assert_eq!(titles(&store.list(Some("cat"))), vec!["Category", "dog"]);
        assert_eq!(titles(&store.list(Some("CAT"))), vec!["Category", "dog"]);
        assert_eq!(titles(&store.list(Some(""))), vec!["bird", "Category", "dog"]);
        assert_eq!(
            titles(&store.list_in(NoteOrder::Insertion, None)),
            vec!["dog", "Category", "bird"]
        );
        Ok(())
    }

    #[test]
    fn most_recent_follows_insertion_order() -> anyhow::Result<()> {
        let (_backend, mut store) = store();
        assert!(store.most_recent().is_none());
        store.create("Zeta", "z")?;
        let latest = store.create("Alpha", "a")?;
        assert_eq!(store.most_recent().map(|n| n.id), Some(latest.id));
        Ok(())
    }

    #[test]
    fn open_loads_existing_notes_and_drops_duplicates() -> anyhow::Result<()> {
        let note = Note {
            id: NoteId::new(),
            title: "Loaded".into(),
            description: "from disk".into(),
            created_at: 7,
        };
        let backend = MemoryBackend::with_notes(vec![note.clone(), note.clone()]);
        let store = NoteStore::open(Box::new(backend))?;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(note.id), Some(&note));
        Ok(())
    }

    #[test]
    fn open_normalises_hand_edited_notes() -> anyhow::Result<()> {
        let stored = |title: &str, description: &str| Note {
            id: NoteId::new(),
            title: title.into(),
            description: description.into(),
            created_at: 0,
        };
        let long = stored(&format!("  {}", "T".repeat(70)), &"D".repeat(1200));
        let blank_title = stored("   ", "body");
        let blank_description = stored("title", "");
        let fine = stored("Fine", "body");
        let backend = MemoryBackend::with_notes(vec![
            long.clone(),
            blank_title.clone(),
            blank_description.clone(),
            fine.clone(),
        ]);

        let store = NoteStore::open(Box::new(backend))?;
        assert_eq!(store.len(), 2);
        assert!(!store.contains(blank_title.id));
        assert!(!store.contains(blank_description.id));
        let trimmed = store.get(long.id).expect("long note kept");
        assert_eq!(trimmed.title, "T".repeat(50));
        assert_eq!(char_count(&trimmed.description), 1000);
        assert_eq!(store.get(fine.id), Some(&fine));
        Ok(())
    }

    #[test]
    fn order_parses_from_config_strings() {
        assert_eq!("insertion".parse::<NoteOrder>().ok(), Some(NoteOrder::Insertion));
        assert_eq!(NoteOrder::Alphabetical.to_string(), "alphabetical");
    }
}
