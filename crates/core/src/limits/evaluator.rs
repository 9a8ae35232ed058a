//! Pure limit evaluation.
//!
//! Evaluation is split in two so the database layer controls locking:
//!
//! 1. [`LimitRuleEvaluator::plan`] turns the card's rules into the ordered set
//!    of windows that apply to the transaction instant.
//! 2. The caller reads the current spend of each planned rule.
//! 3. [`LimitRuleEvaluator::evaluate`] checks `spend + amount <= limit` for
//!    every rule and reports the first violation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fuelgate_shared::types::{LimitRuleId, Money};

use super::error::LimitError;
use super::types::{CardLimitRule, PeriodType, WindowMode, WindowSpec};
use super::window::{Window, WindowCalculator};

/// Identity of a usage bucket: one accumulator per period type and window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    /// Period type of the bucket.
    pub period_type: PeriodType,
    /// Bucket boundaries.
    pub window: Window,
}

/// A rule that applies to the transaction, with its computed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRule {
    /// Rule identifier.
    pub rule_id: LimitRuleId,
    /// Period type.
    pub period_type: PeriodType,
    /// Window placement.
    pub window_mode: WindowMode,
    /// Spend limit.
    pub limit: Money,
    /// Window relevant to the transaction instant.
    pub window: Window,
}

impl PlannedRule {
    /// Returns the bucket backing this rule, or `None` for rolling windows
    /// whose spend is derived from transaction history.
    #[must_use]
    pub fn bucket_key(&self) -> Option<BucketKey> {
        match self.window_mode {
            WindowMode::Calendar | WindowMode::Anchor => Some(BucketKey {
                period_type: self.period_type,
                window: self.window,
            }),
            WindowMode::Rolling => None,
        }
    }
}

/// Spend already accumulated in a planned rule's window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpend {
    /// The planned rule.
    pub rule: PlannedRule,
    /// Spend inside the window before this transaction.
    pub spent: Money,
}

/// First limit a transaction would break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitViolation {
    /// Violated rule.
    pub rule_id: LimitRuleId,
    /// Its period type, which selects the decline code.
    pub period_type: PeriodType,
    /// Configured limit.
    pub limit: Money,
    /// Spend before this transaction.
    pub spent: Money,
    /// Requested amount.
    pub requested: Money,
}

impl LimitViolation {
    /// Human-readable decline message.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "{} limit exceeded: spent {} + requested {} > limit {}",
            self.period_type.as_str().to_lowercase(),
            self.spent,
            self.requested,
            self.limit
        )
    }
}

/// Outcome of limit evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    /// Every applicable rule has room for the amount.
    Pass,
    /// A rule would be exceeded.
    Fail(LimitViolation),
}

impl LimitDecision {
    /// Returns true if the transaction fits every limit.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Pure limit rule evaluation.
pub struct LimitRuleEvaluator;

impl LimitRuleEvaluator {
    /// Plans which rules apply at `at`.
    ///
    /// Inactive rules are dropped, as are anchored rules whose cycle does not
    /// cover `at`. The result is ordered DAILY, WEEKLY, MONTHLY, CUSTOM and
    /// then by rule id, which is also the bucket lock order.
    ///
    /// # Errors
    ///
    /// - `InvalidRule` if a rule's window parameters are invalid.
    /// - `ConflictingWindows` if two bucketed rules of one period type compute
    ///   different windows.
    pub fn plan(rules: &[CardLimitRule], at: DateTime<Utc>) -> Result<Vec<PlannedRule>, LimitError> {
        let mut planned = Vec::with_capacity(rules.len());

        for rule in rules.iter().filter(|r| r.active) {
            let spec = rule.window_spec().map_err(|source| LimitError::InvalidRule {
                rule_id: rule.id,
                source,
            })?;
            let window = WindowCalculator::for_spec(spec, at).map_err(|source| {
                LimitError::InvalidRule {
                    rule_id: rule.id,
                    source,
                }
            })?;

            if matches!(spec, WindowSpec::Anchor { .. }) && !window.contains(at) {
                continue;
            }

            planned.push(PlannedRule {
                rule_id: rule.id,
                period_type: rule.period_type,
                window_mode: rule.window_mode,
                limit: rule.limit,
                window,
            });
        }

        planned.sort_by_key(|r| (r.period_type.rank(), r.rule_id));
        Self::check_bucket_conflicts(&planned)?;

        Ok(planned)
    }

    /// Checks every rule and returns the first violation in plan order.
    ///
    /// An amount that would overflow the spend counter counts as a violation.
    #[must_use]
    pub fn evaluate(spends: &[RuleSpend], amount: Money) -> LimitDecision {
        for RuleSpend { rule, spent } in spends {
            let fits = spent
                .checked_add(amount)
                .is_some_and(|total| total <= rule.limit);
            if !fits {
                return LimitDecision::Fail(LimitViolation {
                    rule_id: rule.rule_id,
                    period_type: rule.period_type,
                    limit: rule.limit,
                    spent: *spent,
                    requested: amount,
                });
            }
        }
        LimitDecision::Pass
    }

    /// Distinct buckets to increment after approval, in lock order.
    #[must_use]
    pub fn buckets(planned: &[PlannedRule]) -> Vec<BucketKey> {
        let mut keys: Vec<BucketKey> = planned.iter().filter_map(PlannedRule::bucket_key).collect();
        keys.sort_by_key(|k| (k.period_type.rank(), k.window.start));
        keys.dedup();
        keys
    }

    fn check_bucket_conflicts(planned: &[PlannedRule]) -> Result<(), LimitError> {
        let mut seen: BTreeMap<PeriodType, (LimitRuleId, Window)> = BTreeMap::new();
        for rule in planned {
            let Some(key) = rule.bucket_key() else {
                continue;
            };
            match seen.get(&key.period_type) {
                Some((first, window)) if *window != key.window => {
                    return Err(LimitError::ConflictingWindows {
                        period_type: key.period_type,
                        first: *first,
                        second: rule.rule_id,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(key.period_type, (rule.rule_id, key.window));
                }
            }
        }
        Ok(())
    }
}
