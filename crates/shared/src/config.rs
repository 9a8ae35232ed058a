//! Application configuration management.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authorization engine switches.
    #[serde(default)]
    pub authorization: AuthorizationConfig,
    /// Station lookup cache.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Upper bound on any row-lock wait inside an authorization, in milliseconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_lock_timeout() -> u64 {
    5_000
}

/// What to do with a webhook from a station code we have never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownStationPolicy {
    /// Create the station on first sight.
    #[default]
    Register,
    /// Answer `STATION_INVALID`.
    Reject,
}

/// Authorization engine switches.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AuthorizationConfig {
    /// Allow resolving a card by its last four digits when the PAN hash
    /// matches nothing. Only meant for demo environments.
    #[serde(default)]
    pub allow_last4_fallback: bool,
    /// Handling of unknown station codes.
    #[serde(default)]
    pub unknown_station: UnknownStationPolicy,
}

/// Station cache configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached station, in seconds.
    #[serde(default = "default_station_ttl")]
    pub station_ttl_secs: u64,
    /// Maximum number of cached stations.
    #[serde(default = "default_station_capacity")]
    pub station_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            station_ttl_secs: default_station_ttl(),
            station_capacity: default_station_capacity(),
        }
    }
}

fn default_station_ttl() -> u64 {
    300 // 5 minutes
}

fn default_station_capacity() -> u64 {
    10_000
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if configuration cannot be loaded
    /// or fails validation.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("FUELGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would silently weaken the engine.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` describing the first bad setting.
    pub fn validate(&self) -> AppResult<()> {
        // Postgres treats lock_timeout = 0 as "wait forever"
        if self.database.lock_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "database.lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Configuration(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        Ok(())
    }

    /// Returns true when running with `RUN_MODE=production`.
    #[must_use]
    pub fn is_production() -> bool {
        std::env::var("RUN_MODE").is_ok_and(|mode| mode == "production")
    }
}
