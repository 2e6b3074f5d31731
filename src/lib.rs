//! # Hearth
//!
//! A household-management service for families: shared tasks, a calendar,
//! a messaging/approval feed, a budget ledger, shared lists, meetings,
//! document storage and family linking, behind one REST API.
//!
//! ## Features
//!
//! - **Families as tenants**: every record is scoped to a family; members
//!   carry a parent/child role for permission gating
//! - **Bearer-token auth**: Argon2id passwords, hashed session tokens
//! - **Recurring items**: tasks and calendar events expand repeat rules
//! - **Budget ledger**: per-member balances moved by atomic transfers
//! - **Document storage**: metadata rows plus on-disk content blobs
//!
//! ## Modules
//!
//! - [`store`]: SQLite persistence layer and domain records
//! - [`auth`]: password hashing and session-token primitives
//! - [`recur`]: recurrence rules and occurrence expansion
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hearth::api::{serve, ApiConfig, AppState};
//! use hearth::store::{BlobStore, Store};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let data_dir = Path::new("./hearth_data");
//!     let store = Arc::new(Store::open(data_dir)?);
//!     let blobs = Arc::new(BlobStore::new(data_dir)?);
//!
//!     let config = ApiConfig::default();
//!     let state = AppState::new(store, blobs, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod recur;
pub mod store;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, ApiResult, AppState};

pub use store::{
    BlobStore, Document, Event, Family, List, ListItem, Meeting, Member, Message, MessageBody,
    Priority, RequestStatus, Role, Store, StoreError, StoreResult, Task, TaskStatus, Transaction,
};

pub use recur::{Freq, Recurrence};

pub use config::{Config, ConfigError, LoggingConfig};
