//! Limit evaluation against stored spend.
//!
//! Reads the spend behind every planned rule under the caller's transaction
//! and hands the numbers to the pure evaluator. Nothing is written here; the
//! returned buckets are incremented only if the authorization approves.

use chrono::{DateTime, Utc};
use fuelgate_core::limits::{
    BucketKey, LimitDecision, LimitError, LimitRuleEvaluator as Evaluator, LimitViolation,
    RuleSpend, WindowError, rolling,
};
use fuelgate_shared::types::{CardId, Money};
use sea_orm::{DatabaseTransaction, DbErr};

use crate::repositories::{FuelTransactionRepository, LimitRuleRepository, UsageBucket, UsageBucketStore};

/// Error types for limit evaluation.
#[derive(Debug, thiserror::Error)]
pub enum LimitEvaluationError {
    /// The card's rules are inconsistent.
    #[error(transparent)]
    Configuration(#[from] LimitError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Outcome of evaluating a card's limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitEvaluation {
    /// Every rule holds; these locked buckets receive the amount on approval.
    Pass {
        /// One bucket per distinct (period type, window), in lock order.
        buckets: Vec<UsageBucket>,
    },
    /// The first violated rule.
    Fail(LimitViolation),
}

impl LimitEvaluation {
    /// Pure decision for the settlement step.
    #[must_use]
    pub fn decision(&self) -> LimitDecision {
        match self {
            Self::Pass { .. } => LimitDecision::Pass,
            Self::Fail(violation) => LimitDecision::Fail(violation.clone()),
        }
    }
}

/// Evaluates a card's active limit rules.
#[derive(Debug, Clone)]
pub struct LimitRuleEvaluator {
    rules: LimitRuleRepository,
}

impl LimitRuleEvaluator {
    /// Creates a new limit evaluator.
    #[must_use]
    pub const fn new(rules: LimitRuleRepository) -> Self {
        Self { rules }
    }

    /// Checks `spend + amount <= limit` for every active rule of the card.
    ///
    /// Buckets are locked in `(period type, window start)` order. Rolling
    /// rules take the peak approved spend of any window around `occurred_at`,
    /// which is safe to read because the caller already holds the
    /// organization account lock.
    pub async fn evaluate(
        &self,
        txn: &DatabaseTransaction,
        card_id: CardId,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> Result<LimitEvaluation, LimitEvaluationError> {
        let rules = self.rules.active_for_card(txn, card_id).await?;
        let planned = Evaluator::plan(&rules, occurred_at)?;
        if planned.is_empty() {
            return Ok(LimitEvaluation::Pass { buckets: Vec::new() });
        }

        let mut buckets = Vec::new();
        for key in Evaluator::buckets(&planned) {
            buckets.push(UsageBucketStore::get_or_create_for_update(txn, card_id, key).await?);
        }

        let mut spends = Vec::with_capacity(planned.len());
        for rule in planned {
            let spent = match rule.bucket_key() {
                Some(key) => spent_in(&buckets, key),
                None => {
                    let reach = rolling::reach(rule.window).ok_or(LimitError::InvalidRule {
                        rule_id: rule.rule_id,
                        source: WindowError::OutOfRange,
                    })?;
                    let approved =
                        FuelTransactionRepository::approved_in_window(txn, card_id, reach).await?;
                    rolling::peak_spend(rule.window, &approved)
                }
            };
            spends.push(RuleSpend { rule, spent });
        }

        Ok(match Evaluator::evaluate(&spends, amount) {
            LimitDecision::Pass => LimitEvaluation::Pass { buckets },
            LimitDecision::Fail(violation) => {
                tracing::debug!(
                    card_id = %card_id,
                    rule_id = %violation.rule_id,
                    limit = %violation.limit,
                    spent = %violation.spent,
                    amount = %amount,
                    "Limit rule violated"
                );
                LimitEvaluation::Fail(violation)
            }
        })
    }
}

fn spent_in(buckets: &[UsageBucket], key: BucketKey) -> Money {
    buckets
        .iter()
        .find(|bucket| bucket.period_type == key.period_type && bucket.window == key.window)
        .map_or(Money::ZERO, |bucket| bucket.spent)
}
