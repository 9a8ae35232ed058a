//! Pure authorization decisions.
//!
//! The database layer resolves the card, locks the account, and reads spend;
//! this service decides what those facts mean.

use fuelgate_shared::types::{CurrencyCode, Money};

use super::outcome::{AuthorizationOutcome, BadRequestCode, DeclineCode};
use crate::card::Card;
use crate::ledger::OrgAccount;
use crate::limits::LimitDecision;

/// A business decline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decline {
    /// Decline code.
    pub code: DeclineCode,
    /// Human-readable message, stored as the transaction's decline reason.
    pub message: String,
}

impl From<Decline> for AuthorizationOutcome {
    fn from(decline: Decline) -> Self {
        Self::Rejected {
            code: decline.code,
            message: decline.message,
        }
    }
}

/// Final decision once the card and its organization are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Approve; the caller debits the locked account.
    Approve,
    /// Decline; the account stays untouched.
    Decline(Decline),
}

/// Authorization policy.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Transactions must be in the organization's currency.
    pub fn check_currency(
        organization_currency: &CurrencyCode,
        transaction_currency: &CurrencyCode,
    ) -> Result<(), AuthorizationOutcome> {
        if organization_currency == transaction_currency {
            Ok(())
        } else {
            Err(AuthorizationOutcome::bad_request(
                BadRequestCode::CurrencyMismatch,
                format!(
                    "Transaction currency {transaction_currency} does not match organization currency {organization_currency}"
                ),
            ))
        }
    }

    /// Blocked cards are declined before any limit or balance work.
    pub fn check_card(card: &Card) -> Result<(), Decline> {
        if card.is_blocked() {
            Err(Decline {
                code: DeclineCode::CardBlocked,
                message: "Card is blocked".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Combines the limit decision with the locked account balance.
    ///
    /// Limits are checked before the balance, so a transaction that breaks
    /// both is declined for the limit. Nothing is mutated here.
    #[must_use]
    pub fn settle(limits: &LimitDecision, account: &OrgAccount, amount: Money) -> Verdict {
        if let LimitDecision::Fail(violation) = limits {
            return Verdict::Decline(Decline {
                code: DeclineCode::LimitExceeded(violation.period_type),
                message: violation.message(),
            });
        }

        if account.can_cover(amount) {
            Verdict::Approve
        } else {
            Verdict::Decline(Decline {
                code: DeclineCode::InsufficientFunds,
                message: format!(
                    "Insufficient funds: available {}, requested {amount}",
                    account.available
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardStatus;
    use crate::limits::{LimitViolation, PeriodType};
    use fuelgate_shared::types::{CardId, LimitRuleId, OrgAccountId, OrganizationId};

    fn account(available: i64) -> OrgAccount {
        OrgAccount {
            id: OrgAccountId::new(),
            organization_id: OrganizationId::new(),
            available: Money::from_minor(available),
            version: 3,
        }
    }

    fn card(status: CardStatus) -> Card {
        Card {
            id: CardId::new(),
            organization_id: OrganizationId::new(),
            pan_hash: "sha256:00".into(),
            last4: "4242".into(),
            status,
        }
    }

    fn daily_violation() -> LimitDecision {
        LimitDecision::Fail(LimitViolation {
            rule_id: LimitRuleId::new(),
            period_type: PeriodType::Daily,
            limit: Money::from_minor(200_000),
            spent: Money::from_minor(150_000),
            requested: Money::from_minor(60_000),
        })
    }

    #[test]
    fn test_currency_must_match() {
        let usd: CurrencyCode = "USD".parse().unwrap();
        let eur: CurrencyCode = "EUR".parse().unwrap();
        assert!(AuthorizationService::check_currency(&usd, &usd).is_ok());
        let outcome = AuthorizationService::check_currency(&usd, &eur).unwrap_err();
        assert_eq!(outcome.code(), Some("CURRENCY_MISMATCH"));
    }

    #[test]
    fn test_blocked_card_declined() {
        assert!(AuthorizationService::check_card(&card(CardStatus::Active)).is_ok());
        let decline = AuthorizationService::check_card(&card(CardStatus::Blocked)).unwrap_err();
        assert_eq!(decline.code, DeclineCode::CardBlocked);
    }

    #[test]
    fn test_settle_approves_when_covered() {
        let acct = account(5_000_000);
        let verdict =
            AuthorizationService::settle(&LimitDecision::Pass, &acct, Money::from_minor(10_000));
        assert_eq!(verdict, Verdict::Approve);

        // Exactly the balance is allowed
        let exact = AuthorizationService::settle(&LimitDecision::Pass, &acct, acct.available);
        assert_eq!(exact, Verdict::Approve);
    }

    #[test]
    fn test_limit_violation_wins_over_balance() {
        let acct = account(0);
        let verdict =
            AuthorizationService::settle(&daily_violation(), &acct, Money::from_minor(60_000));
        let Verdict::Decline(decline) = verdict else {
            panic!("expected decline");
        };
        assert_eq!(decline.code, DeclineCode::LimitExceeded(PeriodType::Daily));
    }

    #[test]
    fn test_insufficient_funds_declines() {
        let acct = account(5_000);
        let verdict =
            AuthorizationService::settle(&LimitDecision::Pass, &acct, Money::from_minor(5_001));
        let Verdict::Decline(decline) = verdict else {
            panic!("expected decline");
        };
        assert_eq!(decline.code, DeclineCode::InsufficientFunds);
        assert_eq!(decline.message, "Insufficient funds: available 5000, requested 5001");
    }

    #[test]
    fn test_decline_into_outcome() {
        let outcome: AuthorizationOutcome = Decline {
            code: DeclineCode::InsufficientFunds,
            message: "no".into(),
        }
        .into();
        assert_eq!(outcome.kind(), "REJECTED");
        assert_eq!(outcome.code(), Some("INSUFFICIENT_FUNDS"));
    }
}
