//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The station webhook endpoint
//! - Health checks
//! - The `{data, message, error}` response envelope

pub mod response;
pub mod routes;

use axum::Router;
use fuelgate_db::WebhookService;
use fuelgate_shared::AppConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Webhook intake and authorization.
    pub webhooks: Arc<WebhookService>,
}

impl AppState {
    /// Wires the state from a pool and the loaded configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            webhooks: Arc::new(WebhookService::new(db.clone(), config)),
            db: Arc::new(db),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{AppState, Router, create_router};
    use fuelgate_shared::config::ServerConfig;
    use fuelgate_shared::{
        AppConfig, AuthorizationConfig, CacheConfig, DatabaseConfig, UnknownStationPolicy,
    };
    use sea_orm::DatabaseConnection;

    /// Router over a disconnected pool: only paths that answer before any
    /// query can be exercised with it.
    pub(crate) fn app() -> Router {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/unused".to_string(),
                max_connections: 1,
                min_connections: 0,
                connect_timeout_secs: 1,
                lock_timeout_ms: 1_000,
            },
            authorization: AuthorizationConfig {
                allow_last4_fallback: false,
                unknown_station: UnknownStationPolicy::Register,
            },
            cache: CacheConfig::default(),
        };
        create_router(AppState::new(DatabaseConnection::default(), &config))
    }
}
