//! Request extractors
//!
//! `CurrentMember` resolves the bearer token to a live session and loads
//! the member behind it; handlers take it as an argument and get
//! authentication for free.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth;
use crate::store::{now_ms, Member, Session};

/// The authenticated member behind the request's bearer token
pub struct CurrentMember {
    pub member: Member,
    pub session: Session,
}

impl CurrentMember {
    pub fn family_id(&self) -> &str {
        &self.member.family_id
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        let session = state
            .store
            .session_by_hash(&auth::hash_token(token), now_ms())
            .await?
            .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".to_string()))?;

        let member = state
            .store
            .get_member(&session.family_id, &session.member_id)
            .await
            .map_err(|_| ApiError::Unauthorized("session member no longer exists".to_string()))?;

        Ok(CurrentMember { member, session })
    }
}

/// Gate an operation to parents
pub fn require_parent(current: &CurrentMember) -> ApiResult<()> {
    if current.member.is_parent() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "only parents may perform this action".to_string(),
        ))
    }
}
