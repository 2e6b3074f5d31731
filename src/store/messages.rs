//! Message feed accessors
//!
//! The typed body (plain text or tv-request) is stored as a JSON column.
//! Deciding a tv-request is the only mutation; everything else is insert,
//! list, delete.

use crate::store::db::{json_column, not_found};
use crate::store::types::{Message, MessageBody, RequestStatus};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Row};

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        family_id: row.get(1)?,
        sender_id: row.get(2)?,
        body: json_column(row, 3)?,
        created_at: row.get(4)?,
    })
}

const MESSAGE_COLS: &str = "id, family_id, sender_id, body, created_at";

impl Store {
    /// Insert a message record
    pub async fn insert_message(&self, message: &Message) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO messages ({MESSAGE_COLS}) VALUES (?, ?, ?, ?, ?)"),
            params![
                message.id,
                message.family_id,
                message.sender_id,
                serde_json::to_string(&message.body)?,
                message.created_at
            ],
        )?;
        Ok(())
    }

    /// The family feed, newest first
    pub async fn list_messages(&self, family_id: &str, limit: usize) -> StoreResult<Vec<Message>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MESSAGE_COLS} FROM messages WHERE family_id = ?
             ORDER BY created_at DESC LIMIT ?"
        ))?;
        let messages = stmt
            .query_map(params![family_id, limit as i64], row_to_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Fetch a message, scoped to a family
    pub async fn get_message(&self, family_id: &str, message_id: &str) -> StoreResult<Message> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {MESSAGE_COLS} FROM messages WHERE family_id = ? AND id = ?"),
            params![family_id, message_id],
            row_to_message,
        )
        .map_err(not_found(format!("message {message_id}")))
    }

    /// Decide a pending tv-request
    pub async fn decide_tv_request(
        &self,
        family_id: &str,
        message_id: &str,
        approve: bool,
        decided_by: &str,
    ) -> StoreResult<Message> {
        let conn = self.conn.lock().await;
        let mut message = conn
            .query_row(
                &format!("SELECT {MESSAGE_COLS} FROM messages WHERE family_id = ? AND id = ?"),
                params![family_id, message_id],
                row_to_message,
            )
            .map_err(not_found(format!("message {message_id}")))?;

        match &mut message.body {
            MessageBody::TvRequest {
                status, decided_by: decider, ..
            } => {
                if *status != RequestStatus::Pending {
                    return Err(StoreError::Conflict(format!(
                        "request already {status}"
                    )));
                }
                *status = if approve {
                    RequestStatus::Approved
                } else {
                    RequestStatus::Rejected
                };
                *decider = Some(decided_by.to_string());
            }
            MessageBody::Text { .. } => {
                return Err(StoreError::InvalidData(
                    "message is not a tv-request".to_string(),
                ));
            }
        }

        conn.execute(
            "UPDATE messages SET body = ? WHERE id = ?",
            params![serde_json::to_string(&message.body)?, message.id],
        )?;
        Ok(message)
    }

    /// Delete a message
    pub async fn delete_message(&self, family_id: &str, message_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM messages WHERE family_id = ? AND id = ?",
            params![family_id, message_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("message {message_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> (Store, String, String) {
        let store = Store::open_in_memory().unwrap();
        let (family, member) = store.create_family("Fam", "Alice", "h").await.unwrap();
        (store, family.id, member.id)
    }

    #[tokio::test]
    async fn test_feed_order_and_limit() {
        let (store, family_id, member_id) = seeded_store().await;
        for i in 0..5 {
            let mut msg = Message::text(family_id.clone(), member_id.clone(), format!("msg {i}"));
            msg.created_at = 1_000 + i;
            store.insert_message(&msg).await.unwrap();
        }

        let feed = store.list_messages(&family_id, 3).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(
            feed[0].body,
            MessageBody::Text {
                text: "msg 4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_tv_request_decision() {
        let (store, family_id, member_id) = seeded_store().await;
        let request = Message::tv_request(family_id.clone(), member_id.clone(), 45, "movie");
        store.insert_message(&request).await.unwrap();

        let decided = store
            .decide_tv_request(&family_id, &request.id, true, "parent-1")
            .await
            .unwrap();
        match decided.body {
            MessageBody::TvRequest {
                status, decided_by, ..
            } => {
                assert_eq!(status, RequestStatus::Approved);
                assert_eq!(decided_by.as_deref(), Some("parent-1"));
            }
            _ => panic!("expected tv-request body"),
        }

        // Second decision conflicts
        let err = store
            .decide_tv_request(&family_id, &request.id, false, "parent-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_decide_plain_text_rejected() {
        let (store, family_id, member_id) = seeded_store().await;
        let msg = Message::text(family_id.clone(), member_id, "hello");
        store.insert_message(&msg).await.unwrap();

        let err = store
            .decide_tv_request(&family_id, &msg.id, true, "p")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_delete_message() {
        let (store, family_id, member_id) = seeded_store().await;
        let msg = Message::text(family_id.clone(), member_id, "bye");
        store.insert_message(&msg).await.unwrap();

        store.delete_message(&family_id, &msg.id).await.unwrap();
        assert!(store.list_messages(&family_id, 10).await.unwrap().is_empty());
    }
}
