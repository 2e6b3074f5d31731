//! Health Routes
//!
//! - GET /health/live - Liveness probe
//! - GET /health/ready - Readiness probe (store reachable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::EntityCounts;

/// Minimal health acknowledgement
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Full health report
#[derive(Debug, Serialize)]
pub struct FullHealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub counts: EntityCounts,
}

/// GET /health/live
pub async fn liveness() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

/// GET /health/ready
pub async fn readiness(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthStatus>, StatusCode> {
    match state.store.health_check().await {
        Ok(()) => Ok(Json(HealthStatus {
            status: "ready".to_string(),
        })),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// GET /health
pub async fn full_health(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FullHealthResponse>> {
    let counts = state.store.counts().await?;

    Ok(Json(FullHealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        counts,
    }))
}
