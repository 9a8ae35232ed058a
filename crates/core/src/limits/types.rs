//! Limit rule types.

use fuelgate_shared::types::{CardId, LimitRuleId, Money};
use serde::{Deserialize, Serialize};

use super::error::WindowError;

/// Anchored cycles default to starting on the 1st.
pub const DEFAULT_ANCHOR_DAY: i32 = 1;
/// Anchored cycles default to 30 days.
pub const DEFAULT_ANCHOR_LENGTH_DAYS: i32 = 30;
/// Rolling windows default to 24 hours.
pub const DEFAULT_ROLLING_HOURS: i32 = 24;

/// Period a limit applies to. Also names the decline code on violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    /// One day.
    Daily,
    /// One week.
    Weekly,
    /// One month.
    Monthly,
    /// Anything else (anchored billing cycles, rolling windows).
    Custom,
}

impl PeriodType {
    /// All period types in evaluation order.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Custom];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Custom => "CUSTOM",
        }
    }

    /// Evaluation rank; lower is checked first.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Daily => 0,
            Self::Weekly => 1,
            Self::Monthly => 2,
            Self::Custom => 3,
        }
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "CUSTOM" => Ok(Self::Custom),
            other => Err(format!("unknown period type: {other}")),
        }
    }
}

/// How a rule's window is placed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowMode {
    /// Aligned to UTC calendar boundaries.
    Calendar,
    /// Monthly cycle starting on an anchor day.
    Anchor,
    /// Trailing window ending at the transaction instant.
    Rolling,
}

impl WindowMode {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "CALENDAR",
            Self::Anchor => "ANCHOR",
            Self::Rolling => "ROLLING",
        }
    }
}

impl std::fmt::Display for WindowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CALENDAR" => Ok(Self::Calendar),
            "ANCHOR" => Ok(Self::Anchor),
            "ROLLING" => Ok(Self::Rolling),
            other => Err(format!("unknown window mode: {other}")),
        }
    }
}

/// Validated window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    /// Calendar day, ISO week, or calendar month.
    Calendar(PeriodType),
    /// Cycle starting on `day` of each month and lasting `length_days`.
    Anchor {
        /// Day of month, 1..=31, clamped to the month's last day.
        day: u32,
        /// Cycle length in days.
        length_days: u32,
    },
    /// Trailing window of `hours`.
    Rolling {
        /// Window length in hours.
        hours: u32,
    },
}

/// A per-card spending limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLimitRule {
    /// Rule identifier.
    pub id: LimitRuleId,
    /// Card the rule applies to.
    pub card_id: CardId,
    /// Period type.
    pub period_type: PeriodType,
    /// Maximum spend inside one window.
    pub limit: Money,
    /// Window placement.
    pub window_mode: WindowMode,
    /// ANCHOR: day of month the cycle starts.
    pub anchor_day_of_month: Option<i32>,
    /// ANCHOR: cycle length in days.
    pub anchor_length_days: Option<i32>,
    /// ROLLING: window length in hours.
    pub rolling_hours: Option<i32>,
    /// Inactive rules are ignored.
    pub active: bool,
}

impl CardLimitRule {
    /// Validates the rule's window parameters.
    ///
    /// Missing ANCHOR parameters default to day 1 and 30 days; a missing
    /// ROLLING length defaults to 24 hours. Present but out-of-range values
    /// are errors.
    pub fn window_spec(&self) -> Result<WindowSpec, WindowError> {
        match self.window_mode {
            WindowMode::Calendar => match self.period_type {
                PeriodType::Custom => Err(WindowError::UnsupportedCalendarPeriod(self.period_type)),
                period => Ok(WindowSpec::Calendar(period)),
            },
            WindowMode::Anchor => {
                let day = self.anchor_day_of_month.unwrap_or(DEFAULT_ANCHOR_DAY);
                let length = self.anchor_length_days.unwrap_or(DEFAULT_ANCHOR_LENGTH_DAYS);
                let day = u32::try_from(day)
                    .ok()
                    .filter(|d| (1..=31).contains(d))
                    .ok_or(WindowError::InvalidAnchorDay(day))?;
                let length_days = u32::try_from(length)
                    .ok()
                    .filter(|l| *l > 0)
                    .ok_or(WindowError::InvalidAnchorLength(length))?;
                Ok(WindowSpec::Anchor { day, length_days })
            }
            WindowMode::Rolling => {
                let hours = self.rolling_hours.unwrap_or(DEFAULT_ROLLING_HOURS);
                let hours = u32::try_from(hours)
                    .ok()
                    .filter(|h| *h > 0)
                    .ok_or(WindowError::InvalidRollingHours(hours))?;
                Ok(WindowSpec::Rolling { hours })
            }
        }
    }
}
