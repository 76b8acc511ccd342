//! OceanFood Storefront - catalog, cart, favorites and flash-sale API.
//!
//! This binary serves the JSON API on port 3000.
//!
//! # Storage
//!
//! - `PostgreSQL` when `OCEANFOOD_DATABASE_URL` (or `DATABASE_URL`) is set
//! - In-memory otherwise, for local development; nothing survives a restart.
//!   The catalog starts empty unless `OCEANFOOD_SEED_FILE` names a product
//!   file to load.
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! `cargo run -p oceanfood-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use axum::ServiceExt;
use axum::extract::Request;
use oceanfood_storefront::config::StorefrontConfig;
use oceanfood_storefront::db::{self, Storage, memory::MemoryCatalog};
use oceanfood_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Errors opening the configured storage.
#[derive(Debug, Error)]
enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cannot read seed file {path}: {source}")]
    SeedIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid seed file {path}: {source}")]
    SeedFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Connect to `PostgreSQL` if configured, otherwise fall back to memory.
async fn open_storage(config: &StorefrontConfig) -> Result<Storage, StorageError> {
    if let Some(url) = &config.database_url {
        let pool = db::create_pool(url).await?;
        tracing::info!("Database pool created");
        if config.seed_file.is_some() {
            tracing::warn!("OCEANFOOD_SEED_FILE is ignored with a database; use oceanfood-cli seed");
        }
        return Ok(Storage::postgres(pool));
    }

    tracing::warn!("No database URL configured; using in-memory storage");
    let catalog = Arc::new(MemoryCatalog::default());
    match &config.seed_file {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| StorageError::SeedIo {
                    path: path.clone(),
                    source,
                })?;
            let count = catalog
                .load_json(&json)
                .await
                .map_err(|source| StorageError::SeedFormat {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(count, path = %path.display(), "Loaded catalog from seed file");
        }
        None => tracing::warn!("In-memory catalog is empty; set OCEANFOOD_SEED_FILE to load products"),
    }
    Ok(Storage::in_memory(catalog))
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "oceanfood_storefront=info,tower_http=debug".into());

    // JSON lines for log shippers, text otherwise
    let json_logs = std::env::var("OCEANFOOD_LOG_FORMAT").is_ok_and(|v| v == "json");
    let json_layer =
        json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storage = open_storage(&config)
        .await
        .expect("Failed to open storage");

    let state = AppState::new(config.clone(), storage);
    let app = oceanfood_storefront::service(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
