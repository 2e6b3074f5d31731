//! Hearth server binary
//!
//! Run with: cargo run -- serve
//!
//! # Configuration
//!
//! Loaded from config.toml (see `hearth init-config`) with environment
//! overrides:
//! - `HEARTH_DATA_DIR`: Data directory
//! - `HEARTH_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `HEARTH_API_PORT`: Port to listen on (default: 8086)
//! - `HEARTH_SESSION_TTL_HOURS`: Session lifetime
//! - `HEARTH_LOG_LEVEL` / `HEARTH_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely

use anyhow::Context;
use clap::{Parser, Subcommand};
use hearth::api::{self, ApiConfig, AppState};
use hearth::config::{generate_default_config, Config};
use hearth::store::{now_ms, BlobStore, Store};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hearth", version, about = "Hearth household-management service")]
struct Cli {
    /// Path to a config file (defaults to standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server (default)
    Serve,
    /// Write a commented default config file
    InitConfig {
        /// Where to write it
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    init_tracing(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::InitConfig { path } => {
            std::fs::write(&path, generate_default_config())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "hearth={},tower_http=warn",
            config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting Hearth v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = Path::new(&config.storage.data_dir);
    tracing::info!("Data directory: {:?}", data_dir);

    let store = Arc::new(Store::open(data_dir).context("opening store")?);
    let blobs = Arc::new(BlobStore::new(data_dir).context("opening blob store")?);

    // Sweep stale sessions at startup and then hourly
    let pruned = store.prune_sessions(now_ms()).await?;
    if pruned > 0 {
        tracing::info!("Pruned {} expired sessions", pruned);
    }
    let prune_store = Arc::clone(&store);
    let prune_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            match prune_store.prune_sessions(now_ms()).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Pruned {} expired sessions", n),
                Err(e) => tracing::warn!("Session prune failed: {}", e),
            }
        }
    });

    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        session_ttl_hours: config.auth.session_ttl_hours,
        min_password_len: config.auth.min_password_len,
        max_upload_bytes: config.api.max_upload_bytes,
    };

    let state = AppState::new(store, blobs, api_config.clone());

    tracing::info!("Starting server on {}", api_config.addr());
    api::serve(state, &api_config).await?;

    prune_handle.abort();
    tracing::info!("Hearth stopped");
    Ok(())
}
