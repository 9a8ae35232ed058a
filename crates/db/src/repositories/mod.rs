//! Repository layer for database operations.
//!
//! Repositories that take part in an authorization expose methods taking the
//! caller's `DatabaseTransaction`, so every read and write of one decision
//! shares a single unit of work.

pub mod account;
pub mod card;
pub mod fuel_transaction;
pub mod limit_rule;
pub mod organization;
pub mod station;
pub mod usage_bucket;
pub mod webhook_event;

pub use account::{BalanceLedger, BalanceLedgerError};
pub use card::{CardError, CardLookup, CardRepository, CreateCardInput};
pub use fuel_transaction::{FuelTransactionRepository, NewFuelTransaction};
pub use limit_rule::{LimitRuleRepository, NewLimitRule};
pub use organization::{
    CreateOrganizationInput, OrganizationError, OrganizationRepository, OrganizationWithAccount,
};
pub use station::StationRepository;
pub use usage_bucket::{UsageBucket, UsageBucketStore};
pub use webhook_event::{IdempotencyGate, IdempotencyGateError, Registration};
