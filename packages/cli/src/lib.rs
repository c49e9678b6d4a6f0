// ABOUTME: Server bootstrap and admin actions behind the `quadbase` binary
// ABOUTME: Opens the database, wires storage into the API router, and serves it

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::Router;
use quadbase_api::{create_router, AppState};
use quadbase_attachments::FsBlobStore;
use quadbase_storage::{Database, StorageConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub mod config;
pub mod moderation;

pub use config::{Config, ConfigError};

/// Open the configured database, applying pending migrations.
pub async fn open_database(config: &Config) -> anyhow::Result<Database> {
    let storage = StorageConfig::with_path(&config.database_path);
    Database::open(&storage)
        .await
        .with_context(|| format!("opening database {}", config.database_path.display()))
}

/// Application router with CORS applied when an origin is configured.
pub fn build_app(database: &Database, config: &Config) -> anyhow::Result<Router> {
    let blobs = Arc::new(FsBlobStore::new(&config.media_dir));
    let state = AppState::new(database.pool().clone(), blobs, config.max_upload_bytes);
    let router = create_router(state);

    let Some(origin) = config.cors_origin.as_deref() else {
        return Ok(router);
    };

    let cors = CorsLayer::new()
        .allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {}", origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(router.layer(cors))
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let database = open_database(&config).await?;
    let app = build_app(&database, &config)?;

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Quadbase listening on http://{}", addr);
    info!("Database: {}", config.database_path.display());
    info!("Media: {}", config.media_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
