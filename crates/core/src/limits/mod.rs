//! Card spending limits.
//!
//! - Rule types (`PeriodType`, `WindowMode`, `CardLimitRule`)
//! - Window calculation (calendar, anchored, rolling)
//! - Peak spend across rolling windows
//! - Pure limit evaluation over pre-loaded spend figures
//!
//! The database layer plans which rules apply with [`LimitRuleEvaluator::plan`],
//! reads spend for each planned rule under lock, and then asks
//! [`LimitRuleEvaluator::evaluate`] for the verdict.

pub mod error;
pub mod evaluator;
pub mod rolling;
pub mod types;
pub mod window;

#[cfg(test)]
mod window_props;

pub use error::{LimitError, WindowError};
pub use evaluator::{
    BucketKey, LimitDecision, LimitRuleEvaluator, LimitViolation, PlannedRule, RuleSpend,
};
pub use rolling::ApprovedSpend;
pub use types::{CardLimitRule, PeriodType, WindowMode, WindowSpec};
pub use window::{Window, WindowCalculator};
