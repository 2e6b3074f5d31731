//! Message Feed Routes
//!
//! - GET /api/v1/messages - Family feed, newest first
//! - POST /api/v1/messages - Post a text message or a tv-time request
//! - POST /api/v1/messages/:id/approve - Approve a tv-request (parent only)
//! - POST /api/v1/messages/:id/reject - Reject a tv-request (parent only)
//! - DELETE /api/v1/messages/:id - Delete (sender or parent)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::{CreateMessageRequest, Envelope, MessageResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{require_parent, CurrentMember};
use crate::api::state::AppState;
use crate::store::Message;

const DEFAULT_FEED_LIMIT: usize = 50;
const MAX_FEED_LIMIT: usize = 500;

/// Query parameters for the feed
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/v1/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<Envelope<Vec<MessageResponse>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .min(MAX_FEED_LIMIT);

    let messages = state
        .store
        .list_messages(current.family_id(), limit)
        .await?;

    Ok(Json(Envelope::new(
        messages.iter().map(MessageResponse::from_message).collect(),
    )))
}

/// POST /api/v1/messages
///
/// Exactly one of `text` / `tv_request` must be present.
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<MessageResponse>>)> {
    let message = match (req.text, req.tv_request) {
        (Some(text), None) => {
            if text.trim().is_empty() {
                return Err(ApiError::Validation("Message text cannot be empty".to_string()));
            }
            Message::text(current.family_id(), &current.member.id, text.trim())
        }
        (None, Some(request)) => {
            if request.minutes == 0 {
                return Err(ApiError::Validation(
                    "Requested minutes must be positive".to_string(),
                ));
            }
            Message::tv_request(
                current.family_id(),
                &current.member.id,
                request.minutes,
                request.reason,
            )
        }
        _ => {
            return Err(ApiError::Validation(
                "Provide exactly one of text or tv_request".to_string(),
            ));
        }
    };

    state.store.insert_message(&message).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(MessageResponse::from_message(&message))),
    ))
}

/// POST /api/v1/messages/:id/approve
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Envelope<MessageResponse>>> {
    decide(state, current, message_id, true).await
}

/// POST /api/v1/messages/:id/reject
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Envelope<MessageResponse>>> {
    decide(state, current, message_id, false).await
}

async fn decide(
    state: Arc<AppState>,
    current: CurrentMember,
    message_id: String,
    approve: bool,
) -> ApiResult<Json<Envelope<MessageResponse>>> {
    require_parent(&current)?;

    let message = state
        .store
        .decide_tv_request(
            current.family_id(),
            &message_id,
            approve,
            &current.member.id,
        )
        .await?;

    tracing::info!(message_id = %message.id, approve, "Decided tv-request");

    Ok(Json(Envelope::new(MessageResponse::from_message(&message))))
}

/// DELETE /api/v1/messages/:id
///
/// The sender may delete their own message; parents may delete anything.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(message_id): Path<String>,
) -> ApiResult<StatusCode> {
    let message = state
        .store
        .get_message(current.family_id(), &message_id)
        .await?;

    if message.sender_id != current.member.id {
        require_parent(&current)?;
    }

    state
        .store
        .delete_message(current.family_id(), &message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
