//! Auth Routes
//!
//! - POST /api/v1/auth/register - Create a family and its founding parent
//! - POST /api/v1/auth/login - Exchange credentials for a bearer token
//! - POST /api/v1/auth/logout - Invalidate the current session
//! - GET /api/v1/auth/me - Current member and family

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{
    AuthResponse, Envelope, FamilyResponse, FamilySummary, LoginRequest, MemberResponse,
    RegisterRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::CurrentMember;
use crate::api::state::AppState;
use crate::auth;
use crate::store::{now_ms, Member, Session};

/// POST /api/v1/auth/register
///
/// Create a family together with its founding parent member and log the
/// parent in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<AuthResponse>>)> {
    if req.family_name.trim().is_empty() {
        return Err(ApiError::Validation("Family name cannot be empty".to_string()));
    }
    if req.member_name.trim().is_empty() {
        return Err(ApiError::Validation("Member name cannot be empty".to_string()));
    }
    validate_password(&state, &req.password)?;

    let password_hash = auth::hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))?;

    let (family, member) = state
        .store
        .create_family(req.family_name.trim(), req.member_name.trim(), &password_hash)
        .await?;

    let token = issue_session(&state, &member).await?;

    tracing::info!(family_id = %family.id, member_id = %member.id, "Registered family");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(AuthResponse {
            token,
            member: MemberResponse::from_member(&member),
            family: FamilySummary::from_family(&family),
        })),
    ))
}

/// POST /api/v1/auth/login
///
/// Verify the (family, name, password) triple and start a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Envelope<AuthResponse>>> {
    let credentials = state
        .store
        .member_credentials(&req.family_id, &req.name)
        .await?;

    let (member_id, password_hash) = credentials
        .ok_or_else(|| ApiError::Unauthorized("unknown member or wrong password".to_string()))?;

    if !auth::verify_password(&req.password, &password_hash) {
        return Err(ApiError::Unauthorized(
            "unknown member or wrong password".to_string(),
        ));
    }

    let member = state.store.get_member(&req.family_id, &member_id).await?;
    let family = state.store.get_family(&req.family_id).await?;
    let token = issue_session(&state, &member).await?;

    tracing::info!(member_id = %member.id, "Member logged in");

    Ok(Json(Envelope::new(AuthResponse {
        token,
        member: MemberResponse::from_member(&member),
        family: FamilySummary::from_family(&family),
    })))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
) -> ApiResult<StatusCode> {
    state
        .store
        .delete_session(&current.session.token_hash)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
///
/// The member behind the token, with the full family view.
pub async fn me(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
) -> ApiResult<Json<Envelope<FamilyView>>> {
    let family = state.store.get_family(current.family_id()).await?;
    let members = state.store.list_members(current.family_id()).await?;
    let connected = state.store.connected_families(current.family_id()).await?;

    Ok(Json(Envelope::new(FamilyView {
        member: MemberResponse::from_member(&current.member),
        family: FamilyResponse {
            id: family.id,
            name: family.name,
            invite_code: family.invite_code,
            members: members.iter().map(MemberResponse::from_member).collect(),
            connected_families: connected.iter().map(FamilySummary::from_family).collect(),
            created_at: family.created_at,
        },
    })))
}

/// Payload of /auth/me: who you are and the family around you
#[derive(Debug, serde::Serialize)]
pub struct FamilyView {
    pub member: MemberResponse,
    pub family: FamilyResponse,
}

/// Create a session for a member, returning the raw token
pub(crate) async fn issue_session(state: &AppState, member: &Member) -> ApiResult<String> {
    let token = auth::generate_token();
    let now = now_ms();
    let session = Session {
        token_hash: auth::hash_token(&token),
        member_id: member.id.clone(),
        family_id: member.family_id.clone(),
        created_at: now,
        expires_at: now + state.session_ttl_ms(),
    };
    state.store.create_session(&session).await?;
    Ok(token)
}

/// Shared password policy check
pub(crate) fn validate_password(state: &AppState, password: &str) -> ApiResult<()> {
    if password.len() < state.config.min_password_len {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            state.config.min_password_len
        )));
    }
    Ok(())
}
