use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

mod auth;
mod cache;
mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod routes;
mod services;
mod store;

use auth::rate_limit::{spawn_cleanup_worker, RateLimitState};
use config::{Config, StoreBackend};
use services::dashboard::{spawn_refresh_worker, Dashboard};
use store::{MemoryStore, MoodStore, SheetsStore};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mood_queue=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    let store: Arc<dyn MoodStore> = match &config.backend {
        StoreBackend::Sheets {
            sheet_key,
            range,
            key,
        } => Arc::new(
            SheetsStore::new(key.clone(), sheet_key.clone(), range.clone())
                .context("Failed to build the Sheets client")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; entries are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let dashboard = Arc::new(Dashboard::new(
        store,
        config.cache_ttl,
        config.timezone,
        config.refresh_interval,
    ));

    tracing::info!(
        store = dashboard.store_name(),
        timezone = %dashboard.timezone(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        refresh_secs = config.refresh_interval.as_secs(),
        "Dashboard configured"
    );

    let rate_limiter = RateLimitState::new(config.submit_rate_limit);
    spawn_cleanup_worker(rate_limiter.clone());
    spawn_refresh_worker(dashboard.clone());

    let app = routes::router(AppState {
        dashboard,
        rate_limiter,
    });

    let addr = config.listen_addr();
    tracing::info!("Mood of the Queue listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
