//! Document metadata accessors
//!
//! Content bytes live in the blob store; these rows carry the metadata.
//! Deleting removes the record first and then the blob, with no transaction
//! linking the two. A blob-delete failure after a successful record delete
//! is logged and left behind.

use crate::store::db::{json_column, not_found};
use crate::store::types::Document;
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Row};

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        doc_type: row.get(3)?,
        content_type: row.get(4)?,
        size_bytes: row.get(5)?,
        tags: json_column(row, 6)?,
        uploaded_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const DOC_COLS: &str =
    "id, family_id, title, doc_type, content_type, size_bytes, tags, uploaded_by, created_at";

/// Equality filters for document listings
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub doc_type: Option<String>,
    pub tag: Option<String>,
}

impl Store {
    /// Insert a document metadata record
    pub async fn insert_document(&self, document: &Document) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO documents ({DOC_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                document.id,
                document.family_id,
                document.title,
                document.doc_type,
                document.content_type,
                document.size_bytes,
                serde_json::to_string(&document.tags)?,
                document.uploaded_by,
                document.created_at
            ],
        )?;
        Ok(())
    }

    /// A family's documents, newest first, with optional filters
    pub async fn list_documents(
        &self,
        family_id: &str,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<Document>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {DOC_COLS} FROM documents WHERE family_id = ? ORDER BY created_at DESC"
        ))?;
        let documents = stmt
            .query_map(params![family_id], row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        let documents = documents
            .into_iter()
            .filter(|d| {
                filter
                    .doc_type
                    .as_ref()
                    .map(|t| &d.doc_type == t)
                    .unwrap_or(true)
                    && filter
                        .tag
                        .as_ref()
                        .map(|tag| d.tags.iter().any(|t| t == tag))
                        .unwrap_or(true)
            })
            .collect();
        Ok(documents)
    }

    /// Fetch a document, scoped to a family
    pub async fn get_document(&self, family_id: &str, document_id: &str) -> StoreResult<Document> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {DOC_COLS} FROM documents WHERE family_id = ? AND id = ?"),
            params![family_id, document_id],
            row_to_document,
        )
        .map_err(not_found(format!("document {document_id}")))
    }

    /// Delete a document record
    pub async fn delete_document(&self, family_id: &str, document_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM documents WHERE family_id = ? AND id = ?",
            params![family_id, document_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("document {document_id}")));
        }
        Ok(())
    }
}
