//! Calendar event accessors
//!
//! Range queries expand recurring events into concrete occurrences, so the
//! caller sees each repeat inside the window as its own entry.

use crate::store::db::{json_column, not_found, opt_json_column};
use crate::store::types::{now_ms, Event, EventOccurrence, EventPatch};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Row};

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        starts_at: row.get(3)?,
        ends_at: row.get(4)?,
        location: row.get(5)?,
        participants: json_column(row, 6)?,
        recurrence: opt_json_column(row, 7)?,
        created_by: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const EVENT_COLS: &str = "id, family_id, title, starts_at, ends_at, location, participants, \
                          recurrence, created_by, created_at, updated_at";

impl Store {
    /// Insert an event record
    pub async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO events ({EVENT_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                event.id,
                event.family_id,
                event.title,
                event.starts_at,
                event.ends_at,
                event.location,
                serde_json::to_string(&event.participants)?,
                event
                    .recurrence
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                event.created_by,
                event.created_at,
                event.updated_at
            ],
        )?;
        Ok(())
    }

    /// All of a family's events, soonest first
    pub async fn list_events(&self, family_id: &str) -> StoreResult<Vec<Event>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {EVENT_COLS} FROM events WHERE family_id = ? ORDER BY starts_at"
        ))?;
        let events = stmt
            .query_map(params![family_id], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Occurrences overlapping `[from, to)`, recurring events expanded
    pub async fn events_between(
        &self,
        family_id: &str,
        from: i64,
        to: i64,
    ) -> StoreResult<Vec<EventOccurrence>> {
        let events = self.list_events(family_id).await?;
        let mut occurrences = Vec::new();

        for event in events {
            let duration = (event.ends_at - event.starts_at).max(0);
            match event.recurrence {
                None => {
                    // Overlap test for a single occurrence
                    if event.starts_at < to && event.ends_at > from {
                        occurrences.push(EventOccurrence {
                            starts_at: event.starts_at,
                            ends_at: event.ends_at,
                            event,
                        });
                    }
                }
                Some(rule) => {
                    // Expand from the anchor; widen the window by the
                    // duration so running occurrences are included.
                    for start in rule.occurrences_between(event.starts_at, from - duration, to) {
                        occurrences.push(EventOccurrence {
                            starts_at: start,
                            ends_at: start + duration,
                            event: event.clone(),
                        });
                    }
                }
            }
        }

        occurrences.sort_by_key(|o| o.starts_at);
        Ok(occurrences)
    }

    /// Fetch an event, scoped to a family
    pub async fn get_event(&self, family_id: &str, event_id: &str) -> StoreResult<Event> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {EVENT_COLS} FROM events WHERE family_id = ? AND id = ?"),
            params![family_id, event_id],
            row_to_event,
        )
        .map_err(not_found(format!("event {event_id}")))
    }

    /// Apply a patch to an event, refreshing updated_at
    pub async fn update_event(
        &self,
        family_id: &str,
        event_id: &str,
        patch: EventPatch,
    ) -> StoreResult<Event> {
        let conn = self.conn.lock().await;
        let mut event = conn
            .query_row(
                &format!("SELECT {EVENT_COLS} FROM events WHERE family_id = ? AND id = ?"),
                params![family_id, event_id],
                row_to_event,
            )
            .map_err(not_found(format!("event {event_id}")))?;

        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(starts_at) = patch.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            event.ends_at = ends_at;
        }
        if let Some(location) = patch.location {
            event.location = Some(location);
        }
        if let Some(participants) = patch.participants {
            event.participants = participants;
        }
        if let Some(recurrence) = patch.recurrence {
            event.recurrence = Some(recurrence);
        }
        if event.ends_at < event.starts_at {
            return Err(StoreError::InvalidData(
                "event ends before it starts".to_string(),
            ));
        }
        event.updated_at = now_ms();

        conn.execute(
            "UPDATE events SET title = ?, starts_at = ?, ends_at = ?, location = ?,
                    participants = ?, recurrence = ?, updated_at = ?
             WHERE id = ?",
            params![
                event.title,
                event.starts_at,
                event.ends_at,
                event.location,
                serde_json::to_string(&event.participants)?,
                event
                    .recurrence
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                event.updated_at,
                event.id
            ],
        )?;
        Ok(event)
    }

    /// Delete an event
    pub async fn delete_event(&self, family_id: &str, event_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM events WHERE family_id = ? AND id = ?",
            params![family_id, event_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("event {event_id}")));
        }
        Ok(())
    }
}
