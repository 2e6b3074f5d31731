//! Shared list accessors
//!
//! Items keep a position column for display order; deleting a list removes
//! its items in the same transaction.

use crate::store::db::not_found;
use crate::store::types::{new_id, now_ms, List, ListItem};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Connection, Row};

fn row_to_list(row: &Row<'_>) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ListItem> {
    Ok(ListItem {
        id: row.get(0)?,
        list_id: row.get(1)?,
        text: row.get(2)?,
        done: row.get::<_, i64>(3)? != 0,
        position: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn items_for(conn: &Connection, list_id: &str) -> StoreResult<Vec<ListItem>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, list_id, text, done, position, created_at
         FROM list_items WHERE list_id = ? ORDER BY position",
    )?;
    let items = stmt
        .query_map(params![list_id], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Patch applied to a list item
#[derive(Debug, Clone, Default)]
pub struct ListItemPatch {
    pub text: Option<String>,
    pub done: Option<bool>,
}

impl Store {
    /// Insert a list record
    pub async fn insert_list(&self, list: &List) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO lists (id, family_id, title, created_by, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                list.id,
                list.family_id,
                list.title,
                list.created_by,
                list.created_at
            ],
        )?;
        Ok(())
    }

    /// A family's lists with their items, newest list first
    pub async fn list_lists(&self, family_id: &str) -> StoreResult<Vec<(List, Vec<ListItem>)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, family_id, title, created_by, created_at
             FROM lists WHERE family_id = ? ORDER BY created_at DESC",
        )?;
        let lists = stmt
            .query_map(params![family_id], row_to_list)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(lists.len());
        for list in lists {
            let items = items_for(&conn, &list.id)?;
            out.push((list, items));
        }
        Ok(out)
    }

    /// Fetch one list with its items, scoped to a family
    pub async fn get_list(
        &self,
        family_id: &str,
        list_id: &str,
    ) -> StoreResult<(List, Vec<ListItem>)> {
        let conn = self.conn.lock().await;
        let list = conn
            .query_row(
                "SELECT id, family_id, title, created_by, created_at
                 FROM lists WHERE family_id = ? AND id = ?",
                params![family_id, list_id],
                row_to_list,
            )
            .map_err(not_found(format!("list {list_id}")))?;
        let items = items_for(&conn, &list.id)?;
        Ok((list, items))
    }

    /// Delete a list and its items
    pub async fn delete_list(&self, family_id: &str, list_id: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM lists WHERE family_id = ? AND id = ?",
            params![family_id, list_id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("list {list_id}")));
        }
        tx.execute("DELETE FROM list_items WHERE list_id = ?", params![list_id])?;

        tx.commit()?;
        Ok(())
    }

    /// Append an item to a list
    pub async fn add_list_item(
        &self,
        family_id: &str,
        list_id: &str,
        text: &str,
    ) -> StoreResult<ListItem> {
        let conn = self.conn.lock().await;
        // Verify the list belongs to this family
        conn.query_row(
            "SELECT 1 FROM lists WHERE family_id = ? AND id = ?",
            params![family_id, list_id],
            |_| Ok(()),
        )
        .map_err(not_found(format!("list {list_id}")))?;

        let position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM list_items WHERE list_id = ?",
            params![list_id],
            |row| row.get(0),
        )?;

        let item = ListItem {
            id: new_id(),
            list_id: list_id.to_string(),
            text: text.to_string(),
            done: false,
            position,
            created_at: now_ms(),
        };
        conn.execute(
            "INSERT INTO list_items (id, list_id, text, done, position, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                item.id,
                item.list_id,
                item.text,
                item.done as i64,
                item.position,
                item.created_at
            ],
        )?;
        Ok(item)
    }

    /// Apply a patch to a list item
    pub async fn update_list_item(
        &self,
        family_id: &str,
        list_id: &str,
        item_id: &str,
        patch: ListItemPatch,
    ) -> StoreResult<ListItem> {
        let conn = self.conn.lock().await;
        let mut item = conn
            .query_row(
                "SELECT i.id, i.list_id, i.text, i.done, i.position, i.created_at
                 FROM list_items i JOIN lists l ON l.id = i.list_id
                 WHERE l.family_id = ? AND i.list_id = ? AND i.id = ?",
                params![family_id, list_id, item_id],
                row_to_item,
            )
            .map_err(not_found(format!("list item {item_id}")))?;

        if let Some(text) = patch.text {
            item.text = text;
        }
        if let Some(done) = patch.done {
            item.done = done;
        }

        conn.execute(
            "UPDATE list_items SET text = ?, done = ? WHERE id = ?",
            params![item.text, item.done as i64, item.id],
        )?;
        Ok(item)
    }

    /// Remove an item from a list
    pub async fn delete_list_item(
        &self,
        family_id: &str,
        list_id: &str,
        item_id: &str,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM list_items WHERE id = ? AND list_id IN
                 (SELECT id FROM lists WHERE family_id = ? AND id = ?)",
            params![item_id, family_id, list_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("list item {item_id}")));
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
    async fn test_list_with_items() {
        let (store, family_id, member_id) = seeded_store().await;
        let list = List::new(family_id.clone(), "Groceries", member_id);
        store.insert_list(&list).await.unwrap();

        store.add_list_item(&family_id, &list.id, "Milk").await.unwrap();
        let eggs = store.add_list_item(&family_id, &list.id, "Eggs").await.unwrap();
        assert_eq!(eggs.position, 2);

        let (fetched, items) = store.get_list(&family_id, &list.id).await.unwrap();
        assert_eq!(fetched.title, "Groceries");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Milk");
    }

    #[tokio::test]
    async fn test_item_toggle_done() {
        let (store, family_id, member_id) = seeded_store().await;
        let list = List::new(family_id.clone(), "Chores", member_id);
        store.insert_list(&list).await.unwrap();
        let item = store.add_list_item(&family_id, &list.id, "Vacuum").await.unwrap();

        let updated = store
            .update_list_item(
                &family_id,
                &list.id,
                &item.id,
                ListItemPatch {
                    done: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.done);
    }

    #[tokio::test]
    async fn test_delete_list_cascades_items() {
        let (store, family_id, member_id) = seeded_store().await;
        let list = List::new(family_id.clone(), "Trip", member_id);
        store.insert_list(&list).await.unwrap();
        let item = store.add_list_item(&family_id, &list.id, "Passports").await.unwrap();

        store.delete_list(&family_id, &list.id).await.unwrap();

        let err = store
            .delete_list_item(&family_id, &list.id, &item.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_foreign_family_cannot_touch_items() {
        let (store, family_id, member_id) = seeded_store().await;
        let (other, _) = store.create_family("Other", "Bob", "h").await.unwrap();
        let list = List::new(family_id.clone(), "Private", member_id);
        store.insert_list(&list).await.unwrap();

        let err = store
            .add_list_item(&other.id, &list.id, "Spy")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
