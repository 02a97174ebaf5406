//! Claim Service
//!
//! REST API for winning entry activation, claim review and testimonials

use anyhow::{Context, Result};
use claim_service::{
    create_router, seed, AppState, Config, MemoryStorage, RedisStorage, Storage,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claim_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Claim Service");

    // Initialize storage
    let storage: Arc<dyn Storage> = match &config.redis_url {
        Some(redis_url) => {
            info!("Using Redis storage");
            Arc::new(
                RedisStorage::new(redis_url)
                    .await
                    .context("Failed to initialize storage")?,
            )
        }
        None => {
            warn!("REDIS_URL not set; using in-memory storage, data is lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    // Create application state
    let state = AppState::new(storage, config.max_page_size);

    state
        .identity
        .bootstrap_admins(&config.bootstrap_admins)
        .await
        .context("Failed to bootstrap admins")?;

    if let Some(path) = &config.entries_seed_path {
        let entries = seed::load_entries(path)?;
        state
            .entries
            .import(entries)
            .await
            .context("Failed to import winning entries")?;
    }

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Claim Service running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
