use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS notes_position ON notes(position);
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}
