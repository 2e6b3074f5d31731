//! Calendar Routes
//!
//! - GET /api/v1/events - List events; with from/to, expand occurrences
//! - POST /api/v1/events - Create an event
//! - GET /api/v1/events/:id - Get an event
//! - PUT /api/v1/events/:id - Update an event
//! - DELETE /api/v1/events/:id - Delete an event

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::{
    CreateEventRequest, Envelope, EventResponse, OccurrenceResponse, UpdateEventRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentMember;
use crate::api::state::AppState;
use crate::store::{Event, EventPatch};

/// Query parameters for event listings
#[derive(Debug, Deserialize)]
pub struct EventListParams {
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
}

/// GET /api/v1/events
///
/// Without a window, returns the raw event records. With `from` and `to`,
/// returns concrete occurrences with recurring events expanded.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Query(params): Query<EventListParams>,
) -> ApiResult<Response> {
    match (params.from, params.to) {
        (Some(from), Some(to)) => {
            if to <= from {
                return Err(ApiError::Validation(
                    "to must be after from".to_string(),
                ));
            }
            let occurrences = state
                .store
                .events_between(current.family_id(), from, to)
                .await?;
            let body: Vec<OccurrenceResponse> = occurrences
                .iter()
                .map(OccurrenceResponse::from_occurrence)
                .collect();
            Ok(Json(Envelope::new(body)).into_response())
        }
        (None, None) => {
            let events = state.store.list_events(current.family_id()).await?;
            let body: Vec<EventResponse> = events.iter().map(EventResponse::from_event).collect();
            Ok(Json(Envelope::new(body)).into_response())
        }
        _ => Err(ApiError::Validation(
            "from and to must be supplied together".to_string(),
        )),
    }
}

/// POST /api/v1/events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<EventResponse>>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Event title cannot be empty".to_string()));
    }
    if req.ends_at < req.starts_at {
        return Err(ApiError::Validation(
            "Event ends before it starts".to_string(),
        ));
    }

    let mut event = Event::new(
        current.family_id(),
        req.title.trim(),
        req.starts_at,
        req.ends_at,
        &current.member.id,
    )
    .participants(req.participants);
    event.location = req.location;
    if let Some(recurrence) = &req.recurrence {
        event.recurrence = Some(recurrence.to_rule().map_err(ApiError::Validation)?);
    }

    state.store.insert_event(&event).await?;

    tracing::info!(event_id = %event.id, "Created event");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(EventResponse::from_event(&event))),
    ))
}

/// GET /api/v1/events/:id
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Envelope<EventResponse>>> {
    let event = state
        .store
        .get_event(current.family_id(), &event_id)
        .await?;
    Ok(Json(Envelope::new(EventResponse::from_event(&event))))
}

/// PUT /api/v1/events/:id
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(event_id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Envelope<EventResponse>>> {
    let recurrence = req
        .recurrence
        .as_ref()
        .map(|r| r.to_rule().map_err(ApiError::Validation))
        .transpose()?;

    let event = state
        .store
        .update_event(
            current.family_id(),
            &event_id,
            EventPatch {
                title: req.title,
                starts_at: req.starts_at,
                ends_at: req.ends_at,
                location: req.location,
                participants: req.participants,
                recurrence,
            },
        )
        .await?;

    Ok(Json(Envelope::new(EventResponse::from_event(&event))))
}

/// DELETE /api/v1/events/:id
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(event_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_event(current.family_id(), &event_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
