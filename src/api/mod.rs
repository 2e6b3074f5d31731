//! Hearth REST API
//!
//! HTTP API layer for Hearth, built with Axum.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/register` - Create a family and its founding parent
//! - `POST /api/v1/auth/login` - Exchange credentials for a bearer token
//! - `POST /api/v1/auth/logout` - Invalidate the current session
//! - `GET /api/v1/auth/me` - Current member and family
//!
//! ## Family
//! - `GET /api/v1/family` - Family with members and connections
//! - `PUT /api/v1/family` - Rename
//! - `POST /api/v1/family/members` - Add a member
//! - `PUT /api/v1/family/members/:id` - Update a member
//! - `DELETE /api/v1/family/members/:id` - Remove a member
//! - `POST /api/v1/family/link` - Connect to another family
//! - `DELETE /api/v1/family/link/:family_id` - Disconnect
//!
//! ## Tasks
//! - `GET/POST /api/v1/tasks`, `GET/PUT/DELETE /api/v1/tasks/:id`
//! - `POST /api/v1/tasks/:id/toggle` - Toggle completion
//!
//! ## Calendar
//! - `GET/POST /api/v1/events`, `GET/PUT/DELETE /api/v1/events/:id`
//!
//! ## Messages
//! - `GET/POST /api/v1/messages`, `DELETE /api/v1/messages/:id`
//! - `POST /api/v1/messages/:id/approve` / `.../reject` - Decide tv-requests
//!
//! ## Budget
//! - `GET /api/v1/budget`, `GET /api/v1/budget/transactions`
//! - `POST /api/v1/budget/transfer`, `POST /api/v1/budget/adjust`
//!
//! ## Documents
//! - `GET/POST /api/v1/documents`, `GET/DELETE /api/v1/documents/:id`
//! - `GET /api/v1/documents/:id/content` - Raw content bytes
//!
//! ## Lists
//! - `GET/POST /api/v1/lists`, `GET/DELETE /api/v1/lists/:id`
//! - `POST /api/v1/lists/:id/items`, `PUT/DELETE /api/v1/lists/:id/items/:item_id`
//!
//! ## Meetings
//! - `GET/POST /api/v1/meetings`, `GET/PUT/DELETE /api/v1/meetings/:id`
//!
//! ## Health
//! - `GET /health/live`, `GET /health/ready`, `GET /health`

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // Upload bodies carry base64, which inflates content by a third
    let body_limit = state.config.max_upload_bytes * 4 / 3 + 1024;

    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        // Family routes
        .route("/family", get(routes::families::get_family))
        .route("/family", put(routes::families::rename_family))
        .route("/family/members", post(routes::families::add_member))
        .route("/family/members/:id", put(routes::families::update_member))
        .route("/family/members/:id", delete(routes::families::delete_member))
        .route("/family/link", post(routes::families::link_family))
        .route("/family/link/:family_id", delete(routes::families::unlink_family))
        // Task routes
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/tasks", post(routes::tasks::create_task))
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route("/tasks/:id", delete(routes::tasks::delete_task))
        .route("/tasks/:id/toggle", post(routes::tasks::toggle_task))
        // Calendar routes
        .route("/events", get(routes::events::list_events))
        .route("/events", post(routes::events::create_event))
        .route("/events/:id", get(routes::events::get_event))
        .route("/events/:id", put(routes::events::update_event))
        .route("/events/:id", delete(routes::events::delete_event))
        // Message routes
        .route("/messages", get(routes::messages::list_messages))
        .route("/messages", post(routes::messages::create_message))
        .route("/messages/:id", delete(routes::messages::delete_message))
        .route("/messages/:id/approve", post(routes::messages::approve_request))
        .route("/messages/:id/reject", post(routes::messages::reject_request))
        // Budget routes
        .route("/budget", get(routes::budget::get_budget))
        .route("/budget/transfer", post(routes::budget::transfer))
        .route("/budget/adjust", post(routes::budget::adjust))
        .route("/budget/transactions", get(routes::budget::list_transactions))
        // List routes
        .route("/lists", get(routes::lists::list_lists))
        .route("/lists", post(routes::lists::create_list))
        .route("/lists/:id", get(routes::lists::get_list))
        .route("/lists/:id", delete(routes::lists::delete_list))
        .route("/lists/:id/items", post(routes::lists::add_item))
        .route("/lists/:id/items/:item_id", put(routes::lists::update_item))
        .route("/lists/:id/items/:item_id", delete(routes::lists::delete_item))
        // Meeting routes
        .route("/meetings", get(routes::meetings::list_meetings))
        .route("/meetings", post(routes::meetings::create_meeting))
        .route("/meetings/:id", get(routes::meetings::get_meeting))
        .route("/meetings/:id", put(routes::meetings::update_meeting))
        .route("/meetings/:id", delete(routes::meetings::delete_meeting))
        // Document routes - with a raised body limit for uploads
        .route("/documents", get(routes::documents::list_documents))
        .route("/documents", post(routes::documents::upload_document))
        .route("/documents/:id", get(routes::documents::get_document))
        .route("/documents/:id", delete(routes::documents::delete_document))
        .route(
            "/documents/:id/content",
            get(routes::documents::get_document_content),
        )
        .layer(DefaultBodyLimit::max(body_limit));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Hearth API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Hearth API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::store::{BlobStore, Store};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    pub async fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        let blobs = Arc::new(BlobStore::new(dir.path()).unwrap());
        let state = AppState::new(store, blobs, ApiConfig::default());
        (build_router(state), dir)
    }

    /// Issue a request, returning status and parsed JSON body (Null if empty)
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register a family, returning the parent's token and the auth payload
    pub async fn register(app: &Router, family: &str, name: &str) -> (String, Value) {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "family_name": family,
                "member_name": name,
                "password": "correct horse"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let token = body["data"]["token"].as_str().unwrap().to_string();
        (token, body["data"].clone())
    }

    /// Add a child member and log them in, returning (child token, child id)
    pub async fn add_child(app: &Router, parent_token: &str, name: &str) -> (String, String) {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/family/members",
            Some(parent_token),
            Some(json!({ "name": name, "role": "child", "password": "kid password" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "add member failed: {body}");
        let child_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, me) = send(app, "GET", "/api/v1/auth/me", Some(parent_token), None).await;
        let family_id = me["data"]["family"]["id"].as_str().unwrap();

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "family_id": family_id, "name": name, "password": "kid password" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "child login failed: {body}");
        let token = body["data"]["token"].as_str().unwrap().to_string();
        (token, child_id)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_health_live() {
        let (app, _dir) = create_test_app().await;
        let (status, body) = send(&app, "GET", "/health/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_ready_and_full() {
        let (app, _dir) = create_test_app().await;

        let (status, _) = send(&app, "GET", "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["counts"]["families"], 0);
    }

    #[tokio::test]
    async fn test_requests_without_token_are_unauthorized() {
        let (app, _dir) = create_test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send(&app, "GET", "/api/v1/tasks", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_logout_flow() {
        let (app, _dir) = create_test_app().await;
        let (token, data) = register(&app, "Larsson", "Astrid").await;
        let family_id = data["family"]["id"].as_str().unwrap().to_string();

        // me works with the registration token
        let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["member"]["name"], "Astrid");
        assert_eq!(body["data"]["member"]["role"], "parent");

        // wrong password is rejected
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "family_id": family_id, "name": "Astrid", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // fresh login works
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "family_id": family_id, "name": "Astrid", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let login_token = body["data"]["token"].as_str().unwrap().to_string();

        // logout kills the session
        let (status, _) = send(&app, "POST", "/api/v1/auth/logout", Some(&login_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(&login_token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let (app, _dir) = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "family_name": "F", "member_name": "M", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_task_round_trip() {
        let (app, _dir) = create_test_app().await;
        let (token, _) = register(&app, "Larsson", "Astrid").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/tasks",
            Some(&token),
            Some(json!({ "title": "Water the plants", "priority": "high" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let task_id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["status"], "pending");

        let (status, body) = send(&app, "GET", "/api/v1/tasks", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["title"], "Water the plants");
        assert_eq!(body["data"][0]["status"], "pending");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/tasks/{task_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, "GET", "/api/v1/tasks", Some(&token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_toggle_sets_and_clears_completed_at() {
        let (app, _dir) = create_test_app().await;
        let (token, _) = register(&app, "Larsson", "Astrid").await;

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/tasks",
            Some(&token),
            Some(json!({ "title": "Dishes" })),
        )
        .await;
        let task_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/tasks/{task_id}/toggle"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["completed"], true);
        assert!(body["data"]["completed_at"].is_i64());

        let (_, body) = send(
            &app,
            "POST",
            &format!("/api/v1/tasks/{task_id}/toggle"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["data"]["completed"], false);
        assert!(body["data"]["completed_at"].is_null());
    }

    #[tokio::test]
    async fn test_tasks_are_family_scoped() {
        let (app, _dir) = create_test_app().await;
        let (token_a, _) = register(&app, "A", "Alice").await;
        let (token_b, _) = register(&app, "B", "Bob").await;

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/tasks",
            Some(&token_a),
            Some(json!({ "title": "Secret chore" })),
        )
        .await;
        let task_id = body["data"]["id"].as_str().unwrap().to_string();

        // Family B can't see A's task, by id or in listings
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/tasks/{task_id}"),
            Some(&token_b),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, "GET", "/api/v1/tasks", Some(&token_b), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_occurrence_expansion() {
        let (app, _dir) = create_test_app().await;
        let (token, _) = register(&app, "Larsson", "Astrid").await;

        const WEEK: i64 = 7 * 24 * 3600 * 1000;
        let start = 1_700_000_000_000i64;
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/events",
            Some(&token),
            Some(json!({
                "title": "Soccer practice",
                "starts_at": start,
                "ends_at": start + 3_600_000,
                "recurrence": { "freq": "weekly" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/events?from={}&to={}", start, start + 4 * WEEK),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let occurrences = body["data"].as_array().unwrap();
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences[1]["starts_at"].as_i64().unwrap(), start + WEEK);
    }

    #[tokio::test]
    async fn test_tv_request_approval_is_parent_gated() {
        let (app, _dir) = create_test_app().await;
        let (parent_token, _) = register(&app, "Larsson", "Astrid").await;
        let (child_token, child_id) = add_child(&app, &parent_token, "Casper").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/messages",
            Some(&child_token),
            Some(json!({ "tv_request": { "minutes": 45, "reason": "movie night" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let message_id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["sender_id"], child_id);
        assert_eq!(body["data"]["status"], "pending");

        // Child cannot approve their own request
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/messages/{message_id}/approve"),
            Some(&child_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        // Parent can
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/messages/{message_id}/approve"),
            Some(&parent_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "approved");
        assert!(body["data"]["decided_by"].is_string());

        // Deciding twice conflicts
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/messages/{message_id}/reject"),
            Some(&parent_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_budget_transfer_moves_balances() {
        let (app, _dir) = create_test_app().await;
        let (parent_token, data) = register(&app, "Larsson", "Astrid").await;
        let parent_id = data["member"]["id"].as_str().unwrap().to_string();
        let (child_token, child_id) = add_child(&app, &parent_token, "Casper").await;

        // Seed the parent's balance
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/budget/adjust",
            Some(&parent_token),
            Some(json!({ "member": parent_id, "amount_cents": 1000 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Children may not move money
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/budget/transfer",
            Some(&child_token),
            Some(json!({ "from": parent_id, "to": child_id, "amount_cents": 250 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/budget/transfer",
            Some(&parent_token),
            Some(json!({ "from": parent_id, "to": child_id, "amount_cents": 250 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, "GET", "/api/v1/budget", Some(&parent_token), None).await;
        let balances = body["data"]["balances"].as_array().unwrap();
        let balance_of = |id: &str| {
            balances
                .iter()
                .find(|b| b["member_id"] == id)
                .unwrap()["balance_cents"]
                .as_i64()
                .unwrap()
        };
        assert_eq!(balance_of(&parent_id), 750);
        assert_eq!(balance_of(&child_id), 250);
        assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_document_upload_download_delete() {
        let (app, _dir) = create_test_app().await;
        let (token, _) = register(&app, "Larsson", "Astrid").await;

        // "hello" in base64
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/documents",
            Some(&token),
            Some(json!({
                "title": "Note",
                "doc_type": "misc",
                "content_type": "text/plain",
                "data": "aGVsbG8=",
                "tags": ["test"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let doc_id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["size_bytes"], 5);

        // Content round trip
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/documents/{doc_id}/content"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Delete removes it from listings
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/documents/{doc_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, "GET", "/api/v1/documents", Some(&token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_items_flow() {
        let (app, _dir) = create_test_app().await;
        let (token, _) = register(&app, "Larsson", "Astrid").await;

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/lists",
            Some(&token),
            Some(json!({ "title": "Groceries" })),
        )
        .await;
        let list_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = send(
            &app,
            "POST",
            &format!("/api/v1/lists/{list_id}/items"),
            Some(&token),
            Some(json!({ "text": "Milk" })),
        )
        .await;
        let item_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/v1/lists/{list_id}/items/{item_id}"),
            Some(&token),
            Some(json!({ "done": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["done"], true);

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/v1/lists/{list_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["data"]["items"][0]["done"], true);
    }

    #[tokio::test]
    async fn test_meetings_are_parent_gated() {
        let (app, _dir) = create_test_app().await;
        let (parent_token, _) = register(&app, "Larsson", "Astrid").await;
        let (child_token, _) = add_child(&app, &parent_token, "Casper").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/meetings",
            Some(&child_token),
            Some(json!({ "title": "Coup", "scheduled_at": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/meetings",
            Some(&parent_token),
            Some(json!({
                "title": "Sunday planning",
                "scheduled_at": 1_900_000_000_000i64,
                "agenda": ["chores", "vacation"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["agenda"].as_array().unwrap().len(), 2);

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/meetings?upcoming=true",
            Some(&child_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_family_linking_flow() {
        let (app, _dir) = create_test_app().await;
        let (token_a, _) = register(&app, "Larsson", "Astrid").await;
        let (token_b, _) = register(&app, "Berg", "Bodil").await;

        // Family B's invite code
        let (_, body) = send(&app, "GET", "/api/v1/family", Some(&token_b), None).await;
        let code = body["data"]["invite_code"].as_str().unwrap().to_string();
        let family_b_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/family/link",
            Some(&token_a),
            Some(json!({ "code": code })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Berg");

        // Both sides see the connection
        let (_, body) = send(&app, "GET", "/api/v1/family", Some(&token_b), None).await;
        assert_eq!(body["data"]["connected_families"][0]["name"], "Larsson");

        // Unknown code is a 404
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/family/link",
            Some(&token_a),
            Some(json!({ "code": "nosuchcode" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/family/link/{family_b_id}"),
            Some(&token_a),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_member_management() {
        let (app, _dir) = create_test_app().await;
        let (parent_token, _) = register(&app, "Larsson", "Astrid").await;
        let (child_token, child_id) = add_child(&app, &parent_token, "Casper").await;

        // Children cannot add members
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/family/members",
            Some(&child_token),
            Some(json!({ "name": "Friend", "role": "child", "password": "whatever1" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Child may rename themselves but not promote themselves
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/family/members/{child_id}"),
            Some(&child_token),
            Some(json!({ "name": "Cas" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/family/members/{child_id}"),
            Some(&child_token),
            Some(json!({ "role": "parent" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Parent removes the child; their session dies with them
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/family/members/{child_id}"),
            Some(&parent_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(&child_token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
