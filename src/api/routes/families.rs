//! Family & Member Routes
//!
//! - GET /api/v1/family - Family record with members and connections
//! - PUT /api/v1/family - Rename (parent only)
//! - POST /api/v1/family/members - Add a member (parent only)
//! - PUT /api/v1/family/members/:id - Update a member
//! - DELETE /api/v1/family/members/:id - Remove a member (parent only)
//! - POST /api/v1/family/link - Connect to another family by invite code
//! - DELETE /api/v1/family/link/:family_id - Disconnect

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    AddMemberRequest, Envelope, FamilyResponse, FamilySummary, LinkFamilyRequest, MemberResponse,
    RenameFamilyRequest, UpdateMemberRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{require_parent, CurrentMember};
use crate::api::routes::auth::validate_password;
use crate::api::state::AppState;
use crate::auth;
use crate::store::{Member, MemberPatch, Role};

/// GET /api/v1/family
pub async fn get_family(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
) -> ApiResult<Json<Envelope<FamilyResponse>>> {
    let family = state.store.get_family(current.family_id()).await?;
    let members = state.store.list_members(current.family_id()).await?;
    let connected = state.store.connected_families(current.family_id()).await?;

    Ok(Json(Envelope::new(FamilyResponse {
        id: family.id,
        name: family.name,
        invite_code: family.invite_code,
        members: members.iter().map(MemberResponse::from_member).collect(),
        connected_families: connected.iter().map(FamilySummary::from_family).collect(),
        created_at: family.created_at,
    })))
}

/// PUT /api/v1/family
///
/// Rename the family (parent only).
pub async fn rename_family(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<RenameFamilyRequest>,
) -> ApiResult<StatusCode> {
    require_parent(&current)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Family name cannot be empty".to_string()));
    }

    state
        .store
        .rename_family(current.family_id(), req.name.trim())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/family/members
///
/// Add a member to the family (parent only).
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<MemberResponse>>)> {
    require_parent(&current)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Member name cannot be empty".to_string()));
    }
    let role = parse_role(&req.role)?;
    validate_password(&state, &req.password)?;

    let password_hash = auth::hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))?;

    let member = Member::new(current.family_id(), req.name.trim(), role)
        .permissions(req.permissions);
    state.store.add_member(&member, &password_hash).await?;

    tracing::info!(member_id = %member.id, role = %role, "Added family member");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(MemberResponse::from_member(&member))),
    ))
}

/// PUT /api/v1/family/members/:id
///
/// Parents may update anyone; members may update their own name and
/// password.
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(member_id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<Json<Envelope<MemberResponse>>> {
    let editing_self = current.member.id == member_id;
    if !editing_self {
        require_parent(&current)?;
    }
    if editing_self && (req.role.is_some() || req.permissions.is_some()) {
        // Role and permission changes always need a parent
        require_parent(&current)?;
    }

    let role = req.role.as_deref().map(parse_role).transpose()?;
    let password_hash = match req.password {
        Some(password) => {
            validate_password(&state, &password)?;
            Some(
                auth::hash_password(&password)
                    .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))?,
            )
        }
        None => None,
    };

    let member = state
        .store
        .update_member(
            current.family_id(),
            &member_id,
            MemberPatch {
                name: req.name,
                role,
                permissions: req.permissions,
                password_hash,
            },
        )
        .await?;

    Ok(Json(Envelope::new(MemberResponse::from_member(&member))))
}

/// DELETE /api/v1/family/members/:id
///
/// Remove a member (parent only, not yourself).
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(member_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_parent(&current)?;
    if current.member.id == member_id {
        return Err(ApiError::Validation(
            "Cannot remove yourself from the family".to_string(),
        ));
    }

    state
        .store
        .delete_member(current.family_id(), &member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/family/link
///
/// Connect this family to the one owning the invite code (parent only).
pub async fn link_family(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<LinkFamilyRequest>,
) -> ApiResult<Json<Envelope<FamilySummary>>> {
    require_parent(&current)?;

    let other = state
        .store
        .family_by_invite_code(req.code.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no family with code {}", req.code.trim())))?;

    state
        .store
        .link_families(current.family_id(), &other.id)
        .await?;

    Ok(Json(Envelope::new(FamilySummary::from_family(&other))))
}

/// DELETE /api/v1/family/link/:family_id
///
/// Disconnect from a linked family (parent only).
pub async fn unlink_family(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Path(family_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_parent(&current)?;

    state
        .store
        .unlink_families(current.family_id(), &family_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parse role string
fn parse_role(s: &str) -> ApiResult<Role> {
    Role::parse(&s.to_lowercase()).ok_or_else(|| {
        ApiError::Validation(format!("Invalid role: {s}. Use parent or child"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert!(matches!(parse_role("parent"), Ok(Role::Parent)));
        assert!(matches!(parse_role("CHILD"), Ok(Role::Child)));
        assert!(parse_role("admin").is_err());
    }
}
