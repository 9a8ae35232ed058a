//! Property-based tests for the account aggregate.
//!
//! - A debit succeeds exactly when the balance covers it
//! - The balance never goes negative
//! - Debits conserve money: before = after + amount

use fuelgate_shared::types::{Money, OrgAccountId, OrganizationId};
use proptest::prelude::*;

use super::account::OrgAccount;
use super::error::LedgerError;

fn account(available: i64) -> OrgAccount {
    OrgAccount {
        id: OrgAccountId::new(),
        organization_id: OrganizationId::new(),
        available: Money::from_minor(available),
        version: 0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_debit_succeeds_iff_covered(balance in 0i64..10_000_000_000, amount in 1i64..10_000_000_000) {
        let mut acct = account(balance);
        match acct.debit(Money::from_minor(amount)) {
            Ok(change) => {
                prop_assert!(amount <= balance);
                prop_assert_eq!(change.after.minor(), balance - amount);
                prop_assert_eq!(change.before.minor(), change.after.minor() + amount);
            }
            Err(LedgerError::InsufficientFunds { .. }) => {
                prop_assert!(amount > balance);
                prop_assert_eq!(acct.available.minor(), balance);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn prop_balance_never_negative(
        balance in 0i64..1_000_000,
        debits in prop::collection::vec(1i64..100_000, 0..50),
    ) {
        let mut acct = account(balance);
        let mut approved = 0i64;
        for amount in debits {
            if acct.debit(Money::from_minor(amount)).is_ok() {
                approved += amount;
            }
            prop_assert!(!acct.available.is_negative());
        }
        prop_assert_eq!(acct.available.minor(), balance - approved);
    }

    #[test]
    fn prop_version_counts_mutations(
        ops in prop::collection::vec((any::<bool>(), 1i64..10_000), 0..40),
    ) {
        let mut acct = account(50_000);
        let mut applied = 0i64;
        for (is_credit, amount) in ops {
            let result = if is_credit {
                acct.credit(Money::from_minor(amount))
            } else {
                acct.debit(Money::from_minor(amount))
            };
            if result.is_ok() {
                applied += 1;
            }
        }
        prop_assert_eq!(acct.version, applied);
    }
}
