//! Budget ledger accessors
//!
//! Balances live on the member rows and move only through transfers and
//! adjustments. Each mutation updates the balances and appends its ledger
//! row inside a single SQLite transaction, the backend-supplied atomic
//! multi-field update the original relied on.

use crate::store::db::{enum_column, not_found};
use crate::store::types::{new_id, now_ms, Transaction, TransactionKind};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        family_id: row.get(1)?,
        kind: enum_column(row, 2, TransactionKind::parse)?,
        from_member: row.get(3)?,
        to_member: row.get(4)?,
        amount_cents: row.get(5)?,
        note: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const TX_COLS: &str =
    "id, family_id, kind, from_member, to_member, amount_cents, note, created_by, created_at";

impl Store {
    /// Move `amount_cents` from one member to another
    pub async fn transfer(
        &self,
        family_id: &str,
        from_member: &str,
        to_member: &str,
        amount_cents: i64,
        note: Option<String>,
        created_by: &str,
    ) -> StoreResult<Transaction> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidData(
                "transfer amount must be positive".to_string(),
            ));
        }
        if from_member == to_member {
            return Err(StoreError::InvalidData(
                "cannot transfer to the same member".to_string(),
            ));
        }

        let record = Transaction {
            id: new_id(),
            family_id: family_id.to_string(),
            kind: TransactionKind::Transfer,
            from_member: Some(from_member.to_string()),
            to_member: to_member.to_string(),
            amount_cents,
            note,
            created_by: created_by.to_string(),
            created_at: now_ms(),
        };

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let debited = tx.execute(
            "UPDATE members SET balance_cents = balance_cents - ?
             WHERE family_id = ? AND id = ?",
            params![amount_cents, family_id, from_member],
        )?;
        if debited == 0 {
            return Err(StoreError::NotFound(format!("member {from_member}")));
        }

        let credited = tx.execute(
            "UPDATE members SET balance_cents = balance_cents + ?
             WHERE family_id = ? AND id = ?",
            params![amount_cents, family_id, to_member],
        )?;
        if credited == 0 {
            return Err(StoreError::NotFound(format!("member {to_member}")));
        }

        insert_transaction(&tx, &record)?;
        tx.commit()?;

        tracing::info!(
            family_id,
            from_member,
            to_member,
            amount_cents,
            "Budget transfer"
        );
        Ok(record)
    }

    /// Apply a signed allowance or correction to one member's balance
    pub async fn adjust_balance(
        &self,
        family_id: &str,
        member_id: &str,
        amount_cents: i64,
        note: Option<String>,
        created_by: &str,
    ) -> StoreResult<Transaction> {
        if amount_cents == 0 {
            return Err(StoreError::InvalidData(
                "adjustment amount must be non-zero".to_string(),
            ));
        }

        let record = Transaction {
            id: new_id(),
            family_id: family_id.to_string(),
            kind: TransactionKind::Adjustment,
            from_member: None,
            to_member: member_id.to_string(),
            amount_cents,
            note,
            created_by: created_by.to_string(),
            created_at: now_ms(),
        };

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE members SET balance_cents = balance_cents + ?
             WHERE family_id = ? AND id = ?",
            params![amount_cents, family_id, member_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("member {member_id}")));
        }

        insert_transaction(&tx, &record)?;
        tx.commit()?;

        Ok(record)
    }

    /// The family ledger, newest first
    pub async fn list_transactions(
        &self,
        family_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<Transaction>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {TX_COLS} FROM transactions WHERE family_id = ?
             ORDER BY created_at DESC LIMIT ?"
        ))?;
        let transactions = stmt
            .query_map(params![family_id, limit as i64], row_to_transaction)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Fetch a single ledger entry, scoped to a family
    pub async fn get_transaction(
        &self,
        family_id: &str,
        transaction_id: &str,
    ) -> StoreResult<Transaction> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {TX_COLS} FROM transactions WHERE family_id = ? AND id = ?"),
            params![family_id, transaction_id],
            row_to_transaction,
        )
        .map_err(not_found(format!("transaction {transaction_id}")))
    }

    /// A member's current balance, if the member exists
    pub async fn member_balance(
        &self,
        family_id: &str,
        member_id: &str,
    ) -> StoreResult<Option<i64>> {
        let conn = self.conn.lock().await;
        let balance = conn
            .query_row(
                "SELECT balance_cents FROM members WHERE family_id = ? AND id = ?",
                params![family_id, member_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(balance)
    }
}

fn insert_transaction(conn: &rusqlite::Connection, record: &Transaction) -> StoreResult<()> {
    conn.execute(
        &format!("INSERT INTO transactions ({TX_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
        params![
            record.id,
            record.family_id,
            record.kind.as_str(),
            record.from_member,
            record.to_member,
            record.amount_cents,
            record.note,
            record.created_by,
            record.created_at
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::{Member, Role};

    async fn seeded_store() -> (Store, String, String, String) {
        let store = Store::open_in_memory().unwrap();
        let (family, parent) = store.create_family("Fam", "Alice", "h").await.unwrap();
        let child = Member::new(family.id.clone(), "Casper", Role::Child);
        store.add_member(&child, "h").await.unwrap();
        (store, family.id, parent.id, child.id)
    }

    #[tokio::test]
    async fn test_transfer_moves_balance_and_appends_ledger_row() {
        let (store, family_id, parent_id, child_id) = seeded_store().await;
        store
            .adjust_balance(&family_id, &parent_id, 10_00, None, &parent_id)
            .await
            .unwrap();

        store
            .transfer(&family_id, &parent_id, &child_id, 2_50, None, &parent_id)
            .await
            .unwrap();

        let parent_balance = store
            .member_balance(&family_id, &parent_id)
            .await
            .unwrap()
            .unwrap();
        let child_balance = store
            .member_balance(&family_id, &child_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent_balance, 7_50);
        assert_eq!(child_balance, 2_50);

        let ledger = store.list_transactions(&family_id, 10).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].kind, TransactionKind::Transfer);
        assert_eq!(ledger[0].amount_cents, 2_50);
        assert_eq!(ledger[0].from_member.as_deref(), Some(parent_id.as_str()));
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_member_rolls_back() {
        let (store, family_id, parent_id, _) = seeded_store().await;
        store
            .adjust_balance(&family_id, &parent_id, 10_00, None, &parent_id)
            .await
            .unwrap();

        let err = store
            .transfer(&family_id, &parent_id, "nobody", 5_00, None, &parent_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        // Debit was rolled back with the failed credit
        let balance = store
            .member_balance(&family_id, &parent_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance, 10_00);
        assert_eq!(store.list_transactions(&family_id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_validation() {
        let (store, family_id, parent_id, child_id) = seeded_store().await;

        let err = store
            .transfer(&family_id, &parent_id, &child_id, 0, None, &parent_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));

        let err = store
            .transfer(&family_id, &parent_id, &parent_id, 1_00, None, &parent_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_negative_adjustment_allows_overdraft() {
        let (store, family_id, _, child_id) = seeded_store().await;
        store
            .adjust_balance(&family_id, &child_id, -3_00, Some("lost book".to_string()), &child_id)
            .await
            .unwrap();

        let balance = store
            .member_balance(&family_id, &child_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance, -3_00);
    }
}
