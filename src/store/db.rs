//! Store handle and schema bootstrap
//!
//! One SQLite connection (WAL mode) guarded by a tokio mutex serializes all
//! access; multi-statement mutations run inside SQLite transactions. The
//! schema is created on open, so a fresh data directory is immediately
//! usable.

use crate::store::{StoreError, StoreResult};
use rusqlite::{Connection, OpenFlags, Row};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Handle to the Hearth database
pub struct Store {
    pub(crate) conn: Mutex<Connection>,
    path: PathBuf,
}

impl Store {
    /// Open (or create) the database under `data_dir`
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join("hearth.db");

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // Configure for performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA cache_size = 10000;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Open an in-memory store (tests)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS families (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                invite_code TEXT NOT NULL UNIQUE,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS family_links (
                family_id    TEXT NOT NULL,
                connected_id TEXT NOT NULL,
                created_at   INTEGER NOT NULL,
                PRIMARY KEY (family_id, connected_id)
            );

            CREATE TABLE IF NOT EXISTS members (
                id            TEXT PRIMARY KEY,
                family_id     TEXT NOT NULL,
                name          TEXT NOT NULL,
                role          TEXT NOT NULL,
                permissions   TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                balance_cents INTEGER NOT NULL DEFAULT 0,
                created_at    INTEGER NOT NULL,
                UNIQUE (family_id, name)
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                member_id  TEXT NOT NULL,
                family_id  TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id           TEXT PRIMARY KEY,
                family_id    TEXT NOT NULL,
                title        TEXT NOT NULL,
                notes        TEXT,
                assigned_to  TEXT,
                created_by   TEXT NOT NULL,
                due_at       INTEGER,
                priority     TEXT NOT NULL,
                status       TEXT NOT NULL,
                completed_at INTEGER,
                recurrence   TEXT,
                created_at   INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id           TEXT PRIMARY KEY,
                family_id    TEXT NOT NULL,
                title        TEXT NOT NULL,
                starts_at    INTEGER NOT NULL,
                ends_at      INTEGER NOT NULL,
                location     TEXT,
                participants TEXT NOT NULL,
                recurrence   TEXT,
                created_by   TEXT NOT NULL,
                created_at   INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id         TEXT PRIMARY KEY,
                family_id  TEXT NOT NULL,
                sender_id  TEXT NOT NULL,
                body       TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS transactions (
                id           TEXT PRIMARY KEY,
                family_id    TEXT NOT NULL,
                kind         TEXT NOT NULL,
                from_member  TEXT,
                to_member    TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                note         TEXT,
                created_by   TEXT NOT NULL,
                created_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id           TEXT PRIMARY KEY,
                family_id    TEXT NOT NULL,
                title        TEXT NOT NULL,
                doc_type     TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes   INTEGER NOT NULL,
                tags         TEXT NOT NULL,
                uploaded_by  TEXT NOT NULL,
                created_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS lists (
                id         TEXT PRIMARY KEY,
                family_id  TEXT NOT NULL,
                title      TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS list_items (
                id         TEXT PRIMARY KEY,
                list_id    TEXT NOT NULL,
                text       TEXT NOT NULL,
                done       INTEGER NOT NULL DEFAULT 0,
                position   INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meetings (
                id           TEXT PRIMARY KEY,
                family_id    TEXT NOT NULL,
                title        TEXT NOT NULL,
                scheduled_at INTEGER NOT NULL,
                agenda       TEXT NOT NULL,
                created_by   TEXT NOT NULL,
                created_at   INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_members_family ON members(family_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_family ON tasks(family_id);
            CREATE INDEX IF NOT EXISTS idx_events_family ON events(family_id);
            CREATE INDEX IF NOT EXISTS idx_messages_family_created
                ON messages(family_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_transactions_family_created
                ON transactions(family_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_documents_family ON documents(family_id);
            CREATE INDEX IF NOT EXISTS idx_lists_family ON lists(family_id);
            CREATE INDEX IF NOT EXISTS idx_list_items_list ON list_items(list_id);
            CREATE INDEX IF NOT EXISTS idx_meetings_family ON meetings(family_id);
            ",
        )?;

        Ok(())
    }

    /// Cheap reachability probe for health checks
    pub async fn health_check(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Row counts per entity, for the full health report
    pub async fn counts(&self) -> StoreResult<EntityCounts> {
        let conn = self.conn.lock().await;
        let count = |table: &str| -> StoreResult<u64> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n as u64)
        };

        Ok(EntityCounts {
            families: count("families")?,
            members: count("members")?,
            tasks: count("tasks")?,
            events: count("events")?,
            messages: count("messages")?,
            documents: count("documents")?,
        })
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Row counts reported by the health endpoint
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EntityCounts {
    pub families: u64,
    pub members: u64,
    pub tasks: u64,
    pub events: u64,
    pub messages: u64,
    pub documents: u64,
}

/// Read a JSON-encoded column into a typed value
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read an optional JSON-encoded column
pub(crate) fn opt_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

/// Read a TEXT column through an enum `parse` function
pub(crate) fn enum_column<T>(
    row: &Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized value: {raw}").into(),
        )
    })
}

/// Map the "query returned no rows" case to a domain NotFound
pub(crate) fn not_found(what: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> StoreError {
    let what = what.into();
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(what),
        other => StoreError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.health_check().await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.families, 0);
        assert_eq!(counts.tasks, 0);
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store.health_check().await.unwrap();
        }
        let store = Store::open(dir.path()).unwrap();
        store.health_check().await.unwrap();
    }
}
