//! Meeting Routes
//!
//! - GET /api/v1/meetings - List meetings (optionally upcoming only)
//! - POST /api/v1/meetings - Schedule a meeting (parent only)
//! - GET /api/v1/meetings/:id - Get a meeting
//! - PUT /api/v1/meetings/:id - Update a meeting
//! - DELETE /api/v1/meetings/:id - Cancel a meeting (parent only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::{CreateMeetingRequest, Envelope, MeetingResponse, UpdateMeetingRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{require_parent, CurrentMember};
use crate::api::state::AppState;
use crate::store::{now_ms, Meeting, MeetingPatch};

/// Query parameters for meeting listings
#[derive(Debug, Deserialize)]
pub struct MeetingListParams {
    #[serde(default)]
    pub upcoming: Option<bool>,
}

/// GET /api/v1/meetings
pub async fn list_meetings(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Query(params): Query<MeetingListParams>,
) -> ApiResult<Json<Envelope<Vec<MeetingResponse>>>> {
    let after = if params.upcoming.unwrap_or(false) {
        Some(now_ms())
    } else {
        None
    };

    let meetings = state.store.list_meetings(current.family_id(), after).await?;

    Ok(Json(Envelope::new(
        meetings.iter().map(MeetingResponse::from_meeting).collect(),
    )))
}

/// POST /api/v1/meetings
pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<CreateMeetingRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<MeetingResponse>>)> {
    require_parent(&current)?;
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Meeting title cannot be empty".to_string()));
    }

    let meeting = Meeting::new(
        current.family_id(),
        req.title.trim(),
        req.scheduled_at,
        &current.member.id,
    )
    .agenda(req.agenda);
    state.store.insert_meeting(&meeting).await?;

    tracing::info!(meeting_id = %meeting.id, "Scheduled meeting");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(MeetingResponse::from_meeting(&meeting))),
    ))
}

/// GET /api/v1/meetings/:id
pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(meeting_id): Path<String>,
) -> ApiResult<Json<Envelope<MeetingResponse>>> {
    let meeting = state
        .store
        .get_meeting(current.family_id(), &meeting_id)
        .await?;
    Ok(Json(Envelope::new(MeetingResponse::from_meeting(&meeting))))
}

/// PUT /api/v1/meetings/:id
pub async fn update_meeting(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(meeting_id): Path<String>,
    Json(req): Json<UpdateMeetingRequest>,
) -> ApiResult<Json<Envelope<MeetingResponse>>> {
    let meeting = state
        .store
        .update_meeting(
            current.family_id(),
            &meeting_id,
            MeetingPatch {
                title: req.title,
                scheduled_at: req.scheduled_at,
                agenda: req.agenda,
            },
        )
        .await?;

    Ok(Json(Envelope::new(MeetingResponse::from_meeting(&meeting))))
}

/// DELETE /api/v1/meetings/:id
pub async fn delete_meeting(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(meeting_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_parent(&current)?;

    state
        .store
        .delete_meeting(current.family_id(), &meeting_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
