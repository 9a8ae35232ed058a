//! FuelGate API Server
//!
//! Main entry point for the fuel-card authorization service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fuelgate_api::{AppState, create_router};
use fuelgate_db::connect;
use fuelgate_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuelgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = AppConfig::load().context("Failed to load configuration")?;

    if config.authorization.allow_last4_fallback && AppConfig::is_production() {
        warn!("Ignoring last-4 card fallback in production");
        config.authorization.allow_last4_fallback = false;
    }

    // Connect to database
    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        lock_timeout_ms = config.database.lock_timeout_ms,
        "Connected to database"
    );

    // Create router
    let app = create_router(AppState::new(db, &config));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
