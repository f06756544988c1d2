use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::config::{BackendKind, StorageOptions};
use crate::note::{Note, NoteId};

mod json;
mod memory;
mod schema;

pub use json::JsonFileBackend;
pub use memory::MemoryBackend;

/// Durable home of the note collection.
///
/// The store calls `load_all` once at startup and `persist` with the whole
/// collection after every mutation. Implementations must either make the full
/// snapshot durable or return an error; partial writes are not allowed to
/// become visible on the next `load_all`.
pub trait NoteBackend {
    fn load_all(&self) -> Result<Vec<Note>>;

    fn persist(&self, notes: &[Note]) -> Result<()>;

    fn describe(&self) -> String;
}

#[derive(Clone)]
pub struct SqliteBackend {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl SqliteBackend {
    pub fn open(options: &StorageOptions) -> Result<Self> {
        let db_path = &options.database_path;
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?;
        prepare_connection(&conn, options)?;
        schema::apply(&conn)?;
        Ok(Self {
            db_path: Arc::new(db_path.clone()),
            options: Arc::new(options.clone()),
        })
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }
}

impl NoteBackend for SqliteBackend {
    fn load_all(&self) -> Result<Vec<Note>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, created_at
                 FROM notes
                 ORDER BY position ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("reading notes")?;

            let mut notes = Vec::with_capacity(rows.len());
            for (raw_id, title, description, created_at) in rows {
                let id: NoteId = match raw_id.parse() {
                    Ok(id) => id,
                    Err(err) => {
                        tracing::warn!(%raw_id, ?err, "skipping note with malformed id");
                        continue;
                    }
                };
                notes.push(Note {
                    id,
                    title,
                    description,
                    created_at,
                });
            }
            Ok(notes)
        })
    }

    fn persist(&self, notes: &[Note]) -> Result<()> {
        self.with_connection(|conn| {
            let tx = conn.transaction().context("starting persist transaction")?;
            tx.execute("DELETE FROM notes", [])
                .context("clearing notes table")?;
            {
                let mut insert = tx.prepare(
                    "INSERT INTO notes (id, title, description, created_at, position)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (position, note) in notes.iter().enumerate() {
                    insert
                        .execute(params![
                            note.id.to_string(),
                            note.title,
                            note.description,
                            note.created_at,
                            position as i64
                        ])
                        .with_context(|| format!("inserting note {}", note.id))?;
                }
            }
            tx.commit().context("committing notes")?;
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }
}

pub fn init(options: &StorageOptions) -> Result<Box<dyn NoteBackend>> {
    let backend: Box<dyn NoteBackend> = match options.backend {
        BackendKind::Sqlite => Box::new(SqliteBackend::open(options)?),
        BackendKind::Json => Box::new(JsonFileBackend::open(&options.json_path)?),
    };
    tracing::debug!(backend = %backend.describe(), "storage initialised");
    Ok(backend)
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::storage_options;
    use super::*;
    use tempfile::TempDir;

    fn sample(title: &str, created_at: i64) -> Note {
        Note {
            id: NoteId::new(),
            title: title.into(),
            description: format!("{title} body"),
            created_at,
        }
    }

    #[test]
    fn sqlite_persist_then_load_keeps_insertion_order() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let backend = SqliteBackend::open(&storage_options(&temp, BackendKind::Sqlite))?;
        let notes = vec![sample("Zulu", 1), sample("Alpha", 2), sample("Mike", 3)];
        backend.persist(&notes)?;

        let loaded = backend.load_all()?;
        assert_eq!(loaded, notes);
        Ok(())
    }

    #[test]
    fn sqlite_persist_replaces_previous_snapshot() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let backend = SqliteBackend::open(&storage_options(&temp, BackendKind::Sqlite))?;
        let first = sample("First", 1);
        let second = sample("Second", 2);
        backend.persist(&[first.clone(), second.clone()])?;
        backend.persist(&[second.clone()])?;

        let reopened = SqliteBackend::open(&storage_options(&temp, BackendKind::Sqlite))?;
        assert_eq!(reopened.load_all()?, vec![second]);
        Ok(())
    }

    #[test]
    fn init_picks_backend_from_options() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let sqlite = init(&storage_options(&temp, BackendKind::Sqlite))?;
        assert!(sqlite.describe().starts_with("sqlite:"));
        let json = init(&storage_options(&temp, BackendKind::Json))?;
        assert!(json.describe().starts_with("json:"));
        assert!(json.load_all()?.is_empty());
        Ok(())
    }
}
