use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::Backend;

/// Backend storing each collection blob as a row of the `collections` table.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database file, applying schema and migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = crate::db::open_database(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Fully migrated in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = crate::db::open_memory_database()?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection that already has the schema applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run `f` with the underlying connection (health checks, stats).
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let conn = self.lock()?;
        f(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }
}

impl Backend for SqliteBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM collections WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read collection {key}"))
    }

    fn write(&self, key: &str, blob: &str, written_at: DateTime<Utc>) -> Result<()> {
        let now = written_at.to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO collections (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, blob, now],
        )
        .with_context(|| format!("failed to write collection {key}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM collections WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM collections ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM collections", [])?;
        Ok(())
    }
}

/// Per-collection figures reported by `pantry stats`.
#[derive(Debug, serde::Serialize)]
pub struct BlobInfo {
    pub key: String,
    pub bytes: u64,
    pub updated_at: Option<String>,
}

/// Size and last write time of every stored blob.
pub fn blob_info(conn: &Connection) -> Result<Vec<BlobInfo>> {
    let mut stmt =
        conn.prepare("SELECT key, LENGTH(value), updated_at FROM collections ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BlobInfo {
                key: row.get(0)?,
                bytes: row.get::<_, i64>(1)? as u64,
                updated_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
