//! # artcafe-server
//!
//! REST backend for ArtCafe: accounts, posts with images, comments, likes,
//! notifications and learning plans.
//!
//! This binary provides:
//! - **REST API** (axum) under `/api`, authenticated with bearer sessions
//! - **Image storage** on local disk, served statically under `/images`
//! - **SQLite persistence** through `artcafe-store`
//! - **Per-IP rate limiting**

mod api;
mod auth;
mod config;
mod error;
mod image_store;
mod rate_limit;
mod state;

use std::sync::Arc;
use std::time::Duration;

use artcafe_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::image_store::ImageStore;
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, Db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,artcafe_server=debug,artcafe_store=debug")
            }),
        )
        .init();

    info!(
        "Starting {} server v{}",
        artcafe_shared::constants::APP_NAME,
        env!("CARGO_PKG_VERSION")
    );

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let db = Db::new(database);

    let images = Arc::new(ImageStore::new(config.upload_dir.clone(), config.max_upload_size).await?);
    let rate_limiter = RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst);
    let http_addr = config.http_addr;

    let app_state = AppState {
        db: db.clone(),
        images,
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Expired session cleanup (every 10 minutes)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            let purged = db
                .call(|db| Ok(db.purge_expired_sessions(chrono::Utc::now())?))
                .await;
            match purged {
                Ok(0) => {}
                Ok(n) => info!(count = n, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session purge failed"),
            }
        }
    });

    // Rate limiter cleanup (every 5 minutes, forget clients idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.purge_idle(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
