//! Limit rule error types.

use fuelgate_shared::types::LimitRuleId;
use thiserror::Error;

use super::types::PeriodType;

/// A rule's window parameters cannot produce a window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// CALENDAR windows only exist for DAILY, WEEKLY, and MONTHLY.
    #[error("Calendar window is not defined for period type {0}")]
    UnsupportedCalendarPeriod(PeriodType),

    /// Anchor day must be within 1..=31.
    #[error("Anchor day of month must be between 1 and 31, got {0}")]
    InvalidAnchorDay(i32),

    /// Anchored cycles must last at least one day.
    #[error("Anchor length must be at least one day, got {0}")]
    InvalidAnchorLength(i32),

    /// Rolling windows must span at least one hour.
    #[error("Rolling window must be at least one hour, got {0}")]
    InvalidRollingHours(i32),

    /// The window falls outside the representable date range.
    #[error("Window is out of the supported date range")]
    OutOfRange,
}

/// Errors raised while planning limit evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// A rule is misconfigured.
    #[error("Limit rule {rule_id} is invalid: {source}")]
    InvalidRule {
        /// The offending rule.
        rule_id: LimitRuleId,
        /// Why its window cannot be computed.
        source: WindowError,
    },

    /// Two bucketed rules of the same period type disagree on the window,
    /// so they cannot share the card's single accumulator for that period.
    #[error("Conflicting {period_type} windows between rules {first} and {second}")]
    ConflictingWindows {
        /// Period type both rules use.
        period_type: PeriodType,
        /// First rule seen.
        first: LimitRuleId,
        /// Rule whose window differs.
        second: LimitRuleId,
    },
}
