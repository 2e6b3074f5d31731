//! Family meeting accessors

use crate::store::db::{json_column, not_found};
use crate::store::types::{now_ms, Meeting, MeetingPatch};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Row};

fn row_to_meeting(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        scheduled_at: row.get(3)?,
        agenda: json_column(row, 4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const MEETING_COLS: &str =
    "id, family_id, title, scheduled_at, agenda, created_by, created_at, updated_at";

impl Store {
    /// Insert a meeting record
    pub async fn insert_meeting(&self, meeting: &Meeting) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO meetings ({MEETING_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                meeting.id,
                meeting.family_id,
                meeting.title,
                meeting.scheduled_at,
                serde_json::to_string(&meeting.agenda)?,
                meeting.created_by,
                meeting.created_at,
                meeting.updated_at
            ],
        )?;
        Ok(())
    }

    /// A family's meetings, soonest first; `after` limits to upcoming ones
    pub async fn list_meetings(
        &self,
        family_id: &str,
        after: Option<i64>,
    ) -> StoreResult<Vec<Meeting>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MEETING_COLS} FROM meetings
             WHERE family_id = ? AND scheduled_at >= ?
             ORDER BY scheduled_at"
        ))?;
        let meetings = stmt
            .query_map(params![family_id, after.unwrap_or(i64::MIN)], row_to_meeting)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meetings)
    }

    /// Fetch a meeting, scoped to a family
    pub async fn get_meeting(&self, family_id: &str, meeting_id: &str) -> StoreResult<Meeting> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {MEETING_COLS} FROM meetings WHERE family_id = ? AND id = ?"),
            params![family_id, meeting_id],
            row_to_meeting,
        )
        .map_err(not_found(format!("meeting {meeting_id}")))
    }

    /// Apply a patch to a meeting, refreshing updated_at
    pub async fn update_meeting(
        &self,
        family_id: &str,
        meeting_id: &str,
        patch: MeetingPatch,
    ) -> StoreResult<Meeting> {
        let conn = self.conn.lock().await;
        let mut meeting = conn
            .query_row(
                &format!("SELECT {MEETING_COLS} FROM meetings WHERE family_id = ? AND id = ?"),
                params![family_id, meeting_id],
                row_to_meeting,
            )
            .map_err(not_found(format!("meeting {meeting_id}")))?;

        if let Some(title) = patch.title {
            meeting.title = title;
        }
        if let Some(scheduled_at) = patch.scheduled_at {
            meeting.scheduled_at = scheduled_at;
        }
        if let Some(agenda) = patch.agenda {
            meeting.agenda = agenda;
        }
        meeting.updated_at = now_ms();

        conn.execute(
            "UPDATE meetings SET title = ?, scheduled_at = ?, agenda = ?, updated_at = ?
             WHERE id = ?",
            params![
                meeting.title,
                meeting.scheduled_at,
                serde_json::to_string(&meeting.agenda)?,
                meeting.updated_at,
                meeting.id
            ],
        )?;
        Ok(meeting)
    }

    /// Delete a meeting
    pub async fn delete_meeting(&self, family_id: &str, meeting_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM meetings WHERE family_id = ? AND id = ?",
            params![family_id, meeting_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("meeting {meeting_id}")));
        }
        Ok(())
    }
}
