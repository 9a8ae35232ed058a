//! Database layer with `SeaORM` entities, repositories, and the
//! authorization engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories for every locked or audited table
//! - The database-backed services (limit evaluation, authorization, webhook intake)
//! - Database migrations

pub mod entities;
pub mod lock;
pub mod migration;
pub mod repositories;
pub mod services;

pub use repositories::{
    BalanceLedger, CardRepository, FuelTransactionRepository, IdempotencyGate,
    LimitRuleRepository, OrganizationRepository, StationRepository, UsageBucketStore,
};
pub use services::{AuthorizeError, TransactionAuthorizer, WebhookService};

use std::time::Duration;

use fuelgate_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);
    Database::connect(options).await
}
