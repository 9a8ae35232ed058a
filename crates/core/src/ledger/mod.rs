//! Organization prepaid balance.
//!
//! - `OrgAccount` aggregate with debit / credit rules
//! - Balance changes that feed the append-only ledger
//! - Error types for balance operations

pub mod account;
pub mod error;

#[cfg(test)]
mod account_props;

pub use account::{BalanceChange, EntryType, OrgAccount};
pub use error::LedgerError;
