//! Document Routes
//!
//! Uploads arrive as base64 inside a JSON body; content is served back raw
//! with the stored MIME type.
//!
//! - GET /api/v1/documents - List documents (filter by type / tag)
//! - POST /api/v1/documents - Upload a document
//! - GET /api/v1/documents/:id - Get document metadata
//! - GET /api/v1/documents/:id/content - Get document content bytes
//! - DELETE /api/v1/documents/:id - Delete record and content

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::{DocumentResponse, Envelope, UploadDocumentRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentMember;
use crate::api::state::AppState;
use crate::store::{Document, DocumentFilter};

/// Query parameters for document listings
#[derive(Debug, Deserialize)]
pub struct DocumentListParams {
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// GET /api/v1/documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Query(params): Query<DocumentListParams>,
) -> ApiResult<Json<Envelope<Vec<DocumentResponse>>>> {
    let documents = state
        .store
        .list_documents(
            current.family_id(),
            &DocumentFilter {
                doc_type: params.doc_type,
                tag: params.tag,
            },
        )
        .await?;

    Ok(Json(Envelope::new(
        documents.iter().map(DocumentResponse::from_document).collect(),
    )))
}

/// POST /api/v1/documents
///
/// Write the content blob first, then the metadata record.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<UploadDocumentRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<DocumentResponse>>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Document title cannot be empty".to_string()));
    }
    if req.content_type.trim().is_empty() {
        return Err(ApiError::Validation("Content type cannot be empty".to_string()));
    }

    let bytes = base64_decode(&req.data)
        .map_err(|e| ApiError::Validation(format!("Invalid base64 data: {e}")))?;
    if bytes.len() > state.config.max_upload_bytes {
        return Err(ApiError::Validation(format!(
            "Document exceeds maximum size of {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let document = Document::new(
        current.family_id(),
        req.title.trim(),
        req.doc_type,
        req.content_type,
        bytes.len() as i64,
        &current.member.id,
    )
    .tags(req.tags);

    state.blobs.put(&document.id, &bytes)?;
    state.store.insert_document(&document).await?;

    tracing::info!(
        document_id = %document.id,
        size_bytes = document.size_bytes,
        "Uploaded document"
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(DocumentResponse::from_document(&document))),
    ))
}

/// GET /api/v1/documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(document_id): Path<String>,
) -> ApiResult<Json<Envelope<DocumentResponse>>> {
    let document = state
        .store
        .get_document(current.family_id(), &document_id)
        .await?;
    Ok(Json(Envelope::new(DocumentResponse::from_document(
        &document,
    ))))
}

/// GET /api/v1/documents/:id/content
///
/// Raw content bytes with the stored MIME type.
pub async fn get_document_content(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(document_id): Path<String>,
) -> ApiResult<Response> {
    let document = state
        .store
        .get_document(current.family_id(), &document_id)
        .await?;
    let bytes = state.blobs.get(&document.id)?;

    Ok((
        [(header::CONTENT_TYPE, document.content_type)],
        bytes,
    )
        .into_response())
}

/// DELETE /api/v1/documents/:id
///
/// Removes the record, then the blob. The two deletes are not linked by a
/// transaction; a blob failure after the record delete is logged and the
/// orphaned bytes stay behind.
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(document_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_document(current.family_id(), &document_id)
        .await?;

    if let Err(e) = state.blobs.delete(&document_id) {
        tracing::error!(document_id = %document_id, "Failed to delete document blob: {}", e);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Simple base64 decoding (standard alphabet, optional padding)
fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    fn decode_char(c: u8) -> Option<u8> {
        match c {
            b'A'..=b'Z' => Some(c - b'A'),
            b'a'..=b'z' => Some(c - b'a' + 26),
            b'0'..=b'9' => Some(c - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }

    let bytes: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);
    for chunk in bytes.chunks(4) {
        if chunk.len() < 2 {
            return Err("Truncated base64 input".to_string());
        }

        let b0 = decode_char(chunk[0]).ok_or("Invalid base64")?;
        let b1 = decode_char(chunk[1]).ok_or("Invalid base64")?;
        out.push((b0 << 2) | (b1 >> 4));

        if chunk.len() > 2 && chunk[2] != b'=' {
            let b2 = decode_char(chunk[2]).ok_or("Invalid base64")?;
            out.push((b1 << 4) | (b2 >> 2));

            if chunk.len() > 3 && chunk[3] != b'=' {
                let b3 = decode_char(chunk[3]).ok_or("Invalid base64")?;
                out.push((b2 << 6) | b3);
            }
        }
    }

    Ok(out)
}
