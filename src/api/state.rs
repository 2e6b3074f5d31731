//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::store::{BlobStore, Store};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer
    pub store: Arc<Store>,
    /// Document content store
    pub blobs: Arc<BlobStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(store: Arc<Store>, blobs: Arc<BlobStore>, config: ApiConfig) -> Self {
        Self {
            store,
            blobs,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Session lifetime in milliseconds
    pub fn session_ttl_ms(&self) -> i64 {
        (self.config.session_ttl_hours as i64) * 3600 * 1000
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// How long a login session stays valid (hours)
    pub session_ttl_hours: u64,
    /// Minimum accepted password length
    pub min_password_len: usize,
    /// Maximum document upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8086,
            session_ttl_hours: 24 * 14,
            min_password_len: 8,
            max_upload_bytes: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
