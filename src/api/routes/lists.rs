//! Shared List Routes
//!
//! - GET /api/v1/lists - All lists with their items
//! - POST /api/v1/lists - Create a list
//! - GET /api/v1/lists/:id - Get one list with items
//! - DELETE /api/v1/lists/:id - Delete a list and its items
//! - POST /api/v1/lists/:id/items - Append an item
//! - PUT /api/v1/lists/:id/items/:item_id - Update an item
//! - DELETE /api/v1/lists/:id/items/:item_id - Remove an item

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    AddListItemRequest, CreateListRequest, Envelope, ListItemResponse, ListResponse,
    UpdateListItemRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentMember;
use crate::api::state::AppState;
use crate::store::{List, ListItemPatch};

/// GET /api/v1/lists
pub async fn list_lists(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
) -> ApiResult<Json<Envelope<Vec<ListResponse>>>> {
    let lists = state.store.list_lists(current.family_id()).await?;

    Ok(Json(Envelope::new(
        lists
            .iter()
            .map(|(list, items)| ListResponse::from_list(list, items))
            .collect(),
    )))
}

/// POST /api/v1/lists
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<ListResponse>>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("List title cannot be empty".to_string()));
    }

    let list = List::new(current.family_id(), req.title.trim(), &current.member.id);
    state.store.insert_list(&list).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(ListResponse::from_list(&list, &[]))),
    ))
}

/// GET /api/v1/lists/:id
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(list_id): Path<String>,
) -> ApiResult<Json<Envelope<ListResponse>>> {
    let (list, items) = state.store.get_list(current.family_id(), &list_id).await?;
    Ok(Json(Envelope::new(ListResponse::from_list(&list, &items))))
}

/// DELETE /api/v1/lists/:id
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(list_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_list(current.family_id(), &list_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/lists/:id/items
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(list_id): Path<String>,
    Json(req): Json<AddListItemRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<ListItemResponse>>)> {
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("Item text cannot be empty".to_string()));
    }

    let item = state
        .store
        .add_list_item(current.family_id(), &list_id, req.text.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(ListItemResponse::from_item(&item))),
    ))
}

/// PUT /api/v1/lists/:id/items/:item_id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path((list_id, item_id)): Path<(String, String)>,
    Json(req): Json<UpdateListItemRequest>,
) -> ApiResult<Json<Envelope<ListItemResponse>>> {
    let item = state
        .store
        .update_list_item(
            current.family_id(),
            &list_id,
            &item_id,
            ListItemPatch {
                text: req.text,
                done: req.done,
            },
        )
        .await?;

    Ok(Json(Envelope::new(ListItemResponse::from_item(&item))))
}

/// DELETE /api/v1/lists/:id/items/:item_id
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path((list_id, item_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_list_item(current.family_id(), &list_id, &item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
