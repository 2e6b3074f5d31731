//! Task Routes
//!
//! CRUD endpoints for shared household tasks.
//!
//! - GET /api/v1/tasks - List tasks (filter by assignee / status)
//! - POST /api/v1/tasks - Create a task
//! - GET /api/v1/tasks/:id - Get a task
//! - PUT /api/v1/tasks/:id - Update a task
//! - POST /api/v1/tasks/:id/toggle - Toggle completion
//! - DELETE /api/v1/tasks/:id - Delete a task

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::{CreateTaskRequest, Envelope, TaskResponse, UpdateTaskRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentMember;
use crate::api::state::AppState;
use crate::store::{Priority, Task, TaskFilter, TaskPatch, TaskStatus};

/// Query parameters for task listings
#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<Envelope<Vec<TaskResponse>>>> {
    let status = params
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;

    let tasks = state
        .store
        .list_tasks(
            current.family_id(),
            &TaskFilter {
                assigned_to: params.assigned_to,
                status,
            },
        )
        .await?;

    Ok(Json(Envelope::new(
        tasks.iter().map(TaskResponse::from_task).collect(),
    )))
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<TaskResponse>>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Task title cannot be empty".to_string()));
    }

    let mut task = Task::new(current.family_id(), req.title.trim(), &current.member.id);
    task.notes = req.notes;
    task.assigned_to = req.assigned_to;
    task.due_at = req.due_at;
    if let Some(priority) = req.priority.as_deref() {
        task.priority = parse_priority(priority)?;
    }
    if let Some(recurrence) = &req.recurrence {
        task.recurrence = Some(recurrence.to_rule().map_err(ApiError::Validation)?);
    }

    state.store.insert_task(&task).await?;

    tracing::info!(task_id = %task.id, "Created task");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(TaskResponse::from_task(&task))),
    ))
}

/// GET /api/v1/tasks/:id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Envelope<TaskResponse>>> {
    let task = state.store.get_task(current.family_id(), &task_id).await?;
    Ok(Json(Envelope::new(TaskResponse::from_task(&task))))
}

/// PUT /api/v1/tasks/:id
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Envelope<TaskResponse>>> {
    let priority = req.priority.as_deref().map(parse_priority).transpose()?;
    let recurrence = req
        .recurrence
        .as_ref()
        .map(|r| r.to_rule().map_err(ApiError::Validation))
        .transpose()?;

    let task = state
        .store
        .update_task(
            current.family_id(),
            &task_id,
            TaskPatch {
                title: req.title,
                notes: req.notes,
                assigned_to: req.assigned_to,
                due_at: req.due_at,
                priority,
                recurrence,
            },
        )
        .await?;

    Ok(Json(Envelope::new(TaskResponse::from_task(&task))))
}

/// POST /api/v1/tasks/:id/toggle
///
/// Flip completion state; recurring tasks advance their due date instead.
pub async fn toggle_task(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Envelope<TaskResponse>>> {
    let task = state
        .store
        .toggle_task(current.family_id(), &task_id)
        .await?;
    Ok(Json(Envelope::new(TaskResponse::from_task(&task))))
}

/// DELETE /api/v1/tasks/:id
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_task(current.family_id(), &task_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parse priority string
fn parse_priority(s: &str) -> ApiResult<Priority> {
    Priority::parse(&s.to_lowercase()).ok_or_else(|| {
        ApiError::Validation(format!("Invalid priority: {s}. Use low, medium, or high"))
    })
}

/// Parse status string
fn parse_status(s: &str) -> ApiResult<TaskStatus> {
    TaskStatus::parse(&s.to_lowercase()).ok_or_else(|| {
        ApiError::Validation(format!("Invalid status: {s}. Use pending or completed"))
    })
}
