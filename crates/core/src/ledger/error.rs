//! Ledger error types.

use fuelgate_shared::types::Money;
use thiserror::Error;

/// Errors from balance operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Debit or credit amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    /// The account does not hold enough to cover the debit.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance before the attempted debit.
        available: Money,
        /// Requested debit.
        requested: Money,
    },

    /// The resulting balance does not fit into 64 bits.
    #[error("Balance overflow")]
    Overflow,
}
