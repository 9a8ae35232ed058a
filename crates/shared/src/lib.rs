//! Shared types, errors, and configuration for FuelGate.
//!
//! This crate provides common types used across all other crates:
//! - Money in integer minor units and ISO currency codes
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, AuthorizationConfig, CacheConfig, DatabaseConfig, UnknownStationPolicy};
pub use error::{AppError, AppResult};
