//! Family and member accessors
//!
//! Families are the tenant unit; every other record hangs off a family id.
//! Linking connects two families symmetrically through their invite codes.

use crate::auth;
use crate::store::db::{enum_column, json_column, not_found};
use crate::store::types::{now_ms, Family, Member, MemberPatch, Role};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn row_to_family(row: &Row<'_>) -> rusqlite::Result<Family> {
    Ok(Family {
        id: row.get(0)?,
        name: row.get(1)?,
        invite_code: row.get(2)?,
        connected_families: Vec::new(),
        created_at: row.get(3)?,
    })
}

fn row_to_member(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        family_id: row.get(1)?,
        name: row.get(2)?,
        role: enum_column(row, 3, Role::parse)?,
        permissions: json_column(row, 4)?,
        balance_cents: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const MEMBER_COLS: &str = "id, family_id, name, role, permissions, balance_cents, created_at";

fn connected_ids(conn: &Connection, family_id: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT connected_id FROM family_links WHERE family_id = ? ORDER BY created_at",
    )?;
    let ids = stmt
        .query_map(params![family_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

impl Store {
    /// Create a family together with its founding parent member
    pub async fn create_family(
        &self,
        family_name: &str,
        member_name: &str,
        password_hash: &str,
    ) -> StoreResult<(Family, Member)> {
        let family = Family::new(family_name, auth::generate_invite_code());
        let member = Member::new(family.id.clone(), member_name, Role::Parent);

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO families (id, name, invite_code, created_at) VALUES (?, ?, ?, ?)",
            params![family.id, family.name, family.invite_code, family.created_at],
        )?;
        insert_member(&tx, &member, password_hash)?;

        tx.commit()?;

        tracing::info!(family_id = %family.id, "Created family");
        Ok((family, member))
    }

    /// Fetch a family with its connected family ids
    pub async fn get_family(&self, family_id: &str) -> StoreResult<Family> {
        let conn = self.conn.lock().await;
        let mut family = conn
            .query_row(
                "SELECT id, name, invite_code, created_at FROM families WHERE id = ?",
                params![family_id],
                row_to_family,
            )
            .map_err(not_found(format!("family {family_id}")))?;

        family.connected_families = connected_ids(&conn, family_id)?;
        Ok(family)
    }

    /// Rename a family
    pub async fn rename_family(&self, family_id: &str, name: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE families SET name = ? WHERE id = ?",
            params![name, family_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("family {family_id}")));
        }
        Ok(())
    }

    /// Look up a family by its invite code
    pub async fn family_by_invite_code(&self, code: &str) -> StoreResult<Option<Family>> {
        let conn = self.conn.lock().await;
        let family = conn
            .query_row(
                "SELECT id, name, invite_code, created_at FROM families WHERE invite_code = ?",
                params![code],
                row_to_family,
            )
            .optional()?;

        match family {
            Some(mut family) => {
                family.connected_families = connected_ids(&conn, &family.id)?;
                Ok(Some(family))
            }
            None => Ok(None),
        }
    }

    /// Families connected to the given one
    pub async fn connected_families(&self, family_id: &str) -> StoreResult<Vec<Family>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT f.id, f.name, f.invite_code, f.created_at
             FROM family_links l JOIN families f ON f.id = l.connected_id
             WHERE l.family_id = ?
             ORDER BY l.created_at",
        )?;
        let families = stmt
            .query_map(params![family_id], row_to_family)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(families)
    }

    /// Connect two families, both directions
    pub async fn link_families(&self, family_id: &str, other_id: &str) -> StoreResult<()> {
        if family_id == other_id {
            return Err(StoreError::InvalidData(
                "cannot link a family to itself".to_string(),
            ));
        }

        let mut conn = self.conn.lock().await;
        let now = now_ms();
        let tx = conn.transaction()?;

        let already: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM family_links WHERE family_id = ? AND connected_id = ?",
                params![family_id, other_id],
                |row| row.get(0),
            )
            .optional()?;
        if already.is_some() {
            return Err(StoreError::Conflict("families already linked".to_string()));
        }

        tx.execute(
            "INSERT INTO family_links (family_id, connected_id, created_at) VALUES (?, ?, ?)",
            params![family_id, other_id, now],
        )?;
        tx.execute(
            "INSERT INTO family_links (family_id, connected_id, created_at) VALUES (?, ?, ?)",
            params![other_id, family_id, now],
        )?;

        tx.commit()?;
        tracing::info!(family_id, other_id, "Linked families");
        Ok(())
    }

    /// Remove the connection between two families, both directions
    pub async fn unlink_families(&self, family_id: &str, other_id: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM family_links WHERE family_id = ? AND connected_id = ?",
            params![family_id, other_id],
        )?;
        tx.execute(
            "DELETE FROM family_links WHERE family_id = ? AND connected_id = ?",
            params![other_id, family_id],
        )?;

        tx.commit()?;

        if removed == 0 {
            return Err(StoreError::NotFound(format!(
                "link to family {other_id}"
            )));
        }
        Ok(())
    }

    // ==================== Members ====================

    /// Add a member to a family
    pub async fn add_member(&self, member: &Member, password_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        match insert_member(&conn, member, password_hash) {
            Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(format!(
                    "member name '{}' already exists in this family",
                    member.name
                )))
            }
            other => other,
        }
    }

    /// Fetch a member, scoped to a family
    pub async fn get_member(&self, family_id: &str, member_id: &str) -> StoreResult<Member> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {MEMBER_COLS} FROM members WHERE family_id = ? AND id = ?"),
            params![family_id, member_id],
            row_to_member,
        )
        .map_err(not_found(format!("member {member_id}")))
    }

    /// All members of a family, oldest first
    pub async fn list_members(&self, family_id: &str) -> StoreResult<Vec<Member>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MEMBER_COLS} FROM members WHERE family_id = ? ORDER BY created_at"
        ))?;
        let members = stmt
            .query_map(params![family_id], row_to_member)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Apply a patch to a member
    pub async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        patch: MemberPatch,
    ) -> StoreResult<Member> {
        let conn = self.conn.lock().await;
        let mut member = conn
            .query_row(
                &format!("SELECT {MEMBER_COLS} FROM members WHERE family_id = ? AND id = ?"),
                params![family_id, member_id],
                row_to_member,
            )
            .map_err(not_found(format!("member {member_id}")))?;

        if let Some(name) = patch.name {
            member.name = name;
        }
        if let Some(role) = patch.role {
            member.role = role;
        }
        if let Some(permissions) = patch.permissions {
            member.permissions = permissions;
        }

        conn.execute(
            "UPDATE members SET name = ?, role = ?, permissions = ? WHERE id = ?",
            params![
                member.name,
                member.role.as_str(),
                serde_json::to_string(&member.permissions)?,
                member.id
            ],
        )?;

        if let Some(hash) = patch.password_hash {
            conn.execute(
                "UPDATE members SET password_hash = ? WHERE id = ?",
                params![hash, member.id],
            )?;
        }

        Ok(member)
    }

    /// Remove a member
    pub async fn delete_member(&self, family_id: &str, member_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM members WHERE family_id = ? AND id = ?",
            params![family_id, member_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("member {member_id}")));
        }
        Ok(())
    }

    /// Login lookup: member id and password hash for a (family, name) pair
    pub async fn member_credentials(
        &self,
        family_id: &str,
        name: &str,
    ) -> StoreResult<Option<(String, String)>> {
        let conn = self.conn.lock().await;
        let creds = conn
            .query_row(
                "SELECT id, password_hash FROM members WHERE family_id = ? AND name = ?",
                params![family_id, name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(creds)
    }
}

fn insert_member(conn: &Connection, member: &Member, password_hash: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO members
             (id, family_id, name, role, permissions, password_hash, balance_cents, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            member.id,
            member.family_id,
            member.name,
            member.role.as_str(),
            serde_json::to_string(&member.permissions)?,
            password_hash,
            member.balance_cents,
            member.created_at
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_family() {
        let store = test_store().await;
        let (family, member) = store
            .create_family("Larsson", "Astrid", "hash")
            .await
            .unwrap();

        let fetched = store.get_family(&family.id).await.unwrap();
        assert_eq!(fetched.name, "Larsson");
        assert_eq!(fetched.invite_code.len(), 8);
        assert!(fetched.connected_families.is_empty());

        let members = store.list_members(&family.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, member.id);
        assert_eq!(members[0].role, Role::Parent);
        assert_eq!(members[0].balance_cents, 0);
    }

    #[tokio::test]
    async fn test_member_name_unique_per_family() {
        let store = test_store().await;
        let (family, _) = store.create_family("Larsson", "Astrid", "h").await.unwrap();

        let dup = Member::new(family.id.clone(), "Astrid", Role::Child);
        let err = store.add_member(&dup, "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Same name in a different family is fine
        let (other, _) = store.create_family("Berg", "Astrid", "h").await.unwrap();
        assert_eq!(other.name, "Berg");
    }

    #[tokio::test]
    async fn test_member_scoping() {
        let store = test_store().await;
        let (fam_a, member_a) = store.create_family("A", "Alice", "h").await.unwrap();
        let (fam_b, _) = store.create_family("B", "Bob", "h").await.unwrap();

        // Member of A is invisible through B's scope
        let err = store.get_member(&fam_b.id, &member_a.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.get_member(&fam_a.id, &member_a.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_member() {
        let store = test_store().await;
        let (family, _) = store.create_family("A", "Alice", "h").await.unwrap();
        let child = Member::new(family.id.clone(), "Casper", Role::Child);
        store.add_member(&child, "h").await.unwrap();

        let updated = store
            .update_member(
                &family.id,
                &child.id,
                MemberPatch {
                    name: Some("Casper Jr".to_string()),
                    permissions: Some(vec!["manage_lists".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Casper Jr");
        assert!(updated.has_permission("manage_lists"));

        let fetched = store.get_member(&family.id, &child.id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_link_and_unlink_families() {
        let store = test_store().await;
        let (fam_a, _) = store.create_family("A", "Alice", "h").await.unwrap();
        let (fam_b, _) = store.create_family("B", "Bob", "h").await.unwrap();

        store.link_families(&fam_a.id, &fam_b.id).await.unwrap();

        // Both directions visible
        let a = store.get_family(&fam_a.id).await.unwrap();
        let b = store.get_family(&fam_b.id).await.unwrap();
        assert_eq!(a.connected_families, vec![fam_b.id.clone()]);
        assert_eq!(b.connected_families, vec![fam_a.id.clone()]);

        // Double link is a conflict
        let err = store.link_families(&fam_a.id, &fam_b.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.unlink_families(&fam_b.id, &fam_a.id).await.unwrap();
        let a = store.get_family(&fam_a.id).await.unwrap();
        assert!(a.connected_families.is_empty());
    }

    #[tokio::test]
    async fn test_link_to_self_rejected() {
        let store = test_store().await;
        let (family, _) = store.create_family("A", "Alice", "h").await.unwrap();
        let err = store
            .link_families(&family.id, &family.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_member_credentials() {
        let store = test_store().await;
        let (family, member) = store.create_family("A", "Alice", "the-hash").await.unwrap();

        let (id, hash) = store
            .member_credentials(&family.id, "Alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, member.id);
        assert_eq!(hash, "the-hash");

        assert!(store
            .member_credentials(&family.id, "Nobody")
            .await
            .unwrap()
            .is_none());
    }
}
