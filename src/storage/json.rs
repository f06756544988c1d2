use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::NoteBackend;
use crate::note::Note;

const DOCUMENT_VERSION: u32 = 1;
const TMP_EXTENSION: &str = "json.tmp";

#[derive(Debug, Serialize, Deserialize)]
struct NotesDocument {
    version: u32,
    #[serde(default)]
    notes: Vec<Note>,
}

/// Whole collection as one JSON document, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl NoteBackend for JsonFileBackend {
    fn load_all(&self) -> Result<Vec<Note>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading notes file {}", self.path.display()))
            }
        };
        let document: NotesDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing notes file {}", self.path.display()))?;
        if document.version > DOCUMENT_VERSION {
            tracing::warn!(
                version = document.version,
                "notes file written by a newer version; reading what we understand"
            );
        }
        Ok(document.notes)
    }

    fn persist(&self, notes: &[Note]) -> Result<()> {
        let document = NotesDocument {
            version: DOCUMENT_VERSION,
            notes: notes.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&document).context("serialising notes")?;
        let tmp_path = self.path.with_extension(TMP_EXTENSION);
        fs::write(&tmp_path, &json)
            .with_context(|| format!("writing temporary notes file {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("atomically replacing {}", self.path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteId;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_empty() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let backend = JsonFileBackend::open(&temp.path().join("notes.json"))?;
        assert!(backend.load_all()?.is_empty());
        Ok(())
    }

    #[test]
    fn persist_replaces_file_and_leaves_no_temp() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("nested/notes.json");
        let backend = JsonFileBackend::open(&path)?;
        let note = Note {
            id: NoteId::new(),
            title: "Groceries".into(),
            description: "milk".into(),
            created_at: 42,
        };
        backend.persist(&[note.clone()])?;

        assert!(path.exists());
        assert!(!path.with_extension(TMP_EXTENSION).exists());
        assert_eq!(backend.load_all()?, vec![note]);
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("notes.json");
        fs::write(&path, b"{ not json")?;
        let backend = JsonFileBackend::open(&path)?;
        assert!(backend.load_all().is_err());
        Ok(())
    }
}
