//! Organization account aggregate.

use fuelgate_shared::types::{Money, OrgAccountId, OrganizationId};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Money left the account.
    Debit,
    /// Money entered the account.
    Credit,
}

impl EntryType {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

/// Result of a successful balance mutation, used to write the ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Amount moved (always positive).
    pub amount: Money,
    /// Balance before the mutation.
    pub before: Money,
    /// Balance after the mutation.
    pub after: Money,
    /// Account version after the mutation.
    pub version: i64,
}

/// An organization's prepaid account.
///
/// The balance never goes negative and every mutation bumps `version`. The
/// database layer only builds this from a row it holds an exclusive lock on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgAccount {
    /// Account identifier.
    pub id: OrgAccountId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Available balance in minor units.
    pub available: Money,
    /// Mutation counter.
    pub version: i64,
}

impl OrgAccount {
    /// Returns true if the balance covers `amount`.
    #[must_use]
    pub fn can_cover(&self, amount: Money) -> bool {
        amount <= self.available
    }

    /// Removes `amount` from the balance.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` for zero or negative amounts
    /// - `InsufficientFunds` if the balance would go negative (the account is
    ///   left untouched)
    pub fn debit(&mut self, amount: Money) -> Result<BalanceChange, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if !self.can_cover(amount) {
            return Err(LedgerError::InsufficientFunds {
                available: self.available,
                requested: amount,
            });
        }
        let after = self
            .available
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(self.apply(EntryType::Debit, amount, after))
    }

    /// Adds `amount` to the balance.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` for zero or negative amounts
    /// - `Overflow` if the balance would not fit into 64 bits
    pub fn credit(&mut self, amount: Money) -> Result<BalanceChange, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        let after = self
            .available
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(self.apply(EntryType::Credit, amount, after))
    }

    fn apply(&mut self, entry_type: EntryType, amount: Money, after: Money) -> BalanceChange {
        let before = self.available;
        self.available = after;
        self.version += 1;
        BalanceChange {
            entry_type,
            amount,
            before,
            after,
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(available: i64) -> OrgAccount {
        OrgAccount {
            id: OrgAccountId::new(),
            organization_id: OrganizationId::new(),
            available: Money::from_minor(available),
            version: 0,
        }
    }

    #[test]
    fn test_debit_reduces_balance_and_bumps_version() {
        let mut acct = account(5_000_000);
        let change = acct.debit(Money::from_minor(10_000)).unwrap();
        assert_eq!(change.entry_type, EntryType::Debit);
        assert_eq!(change.before, Money::from_minor(5_000_000));
        assert_eq!(change.after, Money::from_minor(4_990_000));
        assert_eq!(change.version, 1);
        assert_eq!(acct.available, Money::from_minor(4_990_000));
        assert_eq!(acct.version, 1);
    }

    #[test]
    fn test_debit_entire_balance() {
        let mut acct = account(10_000);
        let change = acct.debit(Money::from_minor(10_000)).unwrap();
        assert!(change.after.is_zero());
    }

    #[test]
    fn test_insufficient_funds_leaves_account_untouched() {
        let mut acct = account(5_000);
        let err = acct.debit(Money::from_minor(5_001)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: Money::from_minor(5_000),
                requested: Money::from_minor(5_001),
            }
        );
        assert_eq!(acct.available, Money::from_minor(5_000));
        assert_eq!(acct.version, 0);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut acct = account(5_000);
        assert_eq!(
            acct.debit(Money::ZERO).unwrap_err(),
            LedgerError::NonPositiveAmount(Money::ZERO)
        );
        assert_eq!(
            acct.credit(Money::from_minor(-1)).unwrap_err(),
            LedgerError::NonPositiveAmount(Money::from_minor(-1))
        );
    }

    #[test]
    fn test_credit_tops_up() {
        let mut acct = account(0);
        let change = acct.credit(Money::from_minor(20_000)).unwrap();
        assert_eq!(change.entry_type, EntryType::Credit);
        assert_eq!(change.after, Money::from_minor(20_000));
        assert_eq!(acct.version, 1);
    }

    #[test]
    fn test_credit_overflow() {
        let mut acct = account(i64::MAX);
        assert_eq!(acct.credit(Money::from_minor(1)).unwrap_err(), LedgerError::Overflow);
        assert_eq!(acct.version, 0);
    }
}
