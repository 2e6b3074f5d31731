//! Session persistence
//!
//! Sessions are keyed by the SHA-256 of the bearer token. Expired rows are
//! ignored on lookup and swept by a background prune task.

use crate::store::types::Session;
use crate::store::{Store, StoreResult};
use rusqlite::{params, OptionalExtension};

impl Store {
    /// Persist a new session
    pub async fn create_session(&self, session: &Session) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sessions (token_hash, member_id, family_id, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                session.token_hash,
                session.member_id,
                session.family_id,
                session.created_at,
                session.expires_at
            ],
        )?;
        Ok(())
    }

    /// Look up a live session by token hash; expired sessions are invisible
    pub async fn session_by_hash(
        &self,
        token_hash: &str,
        now: i64,
    ) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().await;
        let session = conn
            .query_row(
                "SELECT token_hash, member_id, family_id, created_at, expires_at
                 FROM sessions WHERE token_hash = ? AND expires_at > ?",
                params![token_hash, now],
                |row| {
                    Ok(Session {
                        token_hash: row.get(0)?,
                        member_id: row.get(1)?,
                        family_id: row.get(2)?,
                        created_at: row.get(3)?,
                        expires_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Drop a session (logout); missing rows are not an error
    pub async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?",
            params![token_hash],
        )?;
        Ok(())
    }

    /// Sweep expired sessions, returning how many were removed
    pub async fn prune_sessions(&self, now: i64) -> StoreResult<usize> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?", params![now])?;
        Ok(removed)
    }
}
