use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use super::NoteBackend;
use crate::note::Note;

#[derive(Debug, Default)]
struct Inner {
    notes: Vec<Note>,
    persist_count: usize,
    fail_next: bool,
}

/// Volatile backend; clones share the same contents so a test can keep a
/// handle after giving one to the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        let backend = Self::default();
        backend.inner.lock().notes = notes;
        backend
    }

    /// Makes the next `persist` call fail once.
    pub fn fail_next_persist(&self) {
        self.inner.lock().fail_next = true;
    }

    pub fn persisted(&self) -> Vec<Note> {
        self.inner.lock().notes.clone()
    }

    pub fn persist_count(&self) -> usize {
        self.inner.lock().persist_count
    }
}

impl NoteBackend for MemoryBackend {
    fn load_all(&self) -> Result<Vec<Note>> {
        Ok(self.inner.lock().notes.clone())
    }

    fn persist(&self, notes: &[Note]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_next {
            inner.fail_next = false;
            bail!("simulated write failure");
        }
        inner.notes = notes.to_vec();
        inner.persist_count += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
