//! Core business logic for FuelGate.
//!
//! This crate contains pure authorization logic with ZERO web or database dependencies.
//! Everything that can be decided without touching the store lives here; the
//! `fuelgate-db` crate loads rows, takes locks, and feeds them through these types.
//!
//! # Modules
//!
//! - `card` - Card status and PAN hashing
//! - `limits` - Limit rules, window calculation, and limit evaluation
//! - `ledger` - Organization account aggregate (debit / credit)
//! - `idempotency` - Webhook delivery state machine
//! - `authorization` - Inbound events, outcomes, and the authorization policy

pub mod authorization;
pub mod card;
pub mod idempotency;
pub mod ledger;
pub mod limits;
