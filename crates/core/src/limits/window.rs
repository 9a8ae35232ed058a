//! Time windows for limit rules.
//!
//! All windows are half-open `[start, end)` in UTC. Calendar and anchored
//! windows have stable boundaries and are backed by a usage bucket; rolling
//! windows move with every transaction and are never stored.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::error::WindowError;
use super::types::{CardLimitRule, PeriodType, WindowSpec};

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Window {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl Window {
    /// Returns true if `at` lies inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Length of the window.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Computes rule windows.
pub struct WindowCalculator;

impl WindowCalculator {
    /// Computes the window of `rule` relevant to the instant `at`.
    ///
    /// For anchored rules whose cycle is shorter than the month, the returned
    /// window may end before `at`; callers check [`Window::contains`] and skip
    /// the rule when the instant falls in the gap between cycles.
    pub fn compute(rule: &CardLimitRule, at: DateTime<Utc>) -> Result<Window, WindowError> {
        Self::for_spec(rule.window_spec()?, at)
    }

    /// Computes a window from validated parameters.
    pub fn for_spec(spec: WindowSpec, at: DateTime<Utc>) -> Result<Window, WindowError> {
        match spec {
            WindowSpec::Calendar(PeriodType::Daily) => Self::daily(at),
            WindowSpec::Calendar(PeriodType::Weekly) => Self::weekly(at),
            WindowSpec::Calendar(PeriodType::Monthly) => Self::monthly(at),
            WindowSpec::Calendar(period @ PeriodType::Custom) => {
                Err(WindowError::UnsupportedCalendarPeriod(period))
            }
            WindowSpec::Anchor { day, length_days } => Self::anchored(at, day, length_days),
            WindowSpec::Rolling { hours } => Self::rolling(at, hours),
        }
    }

    fn daily(at: DateTime<Utc>) -> Result<Window, WindowError> {
        let start = at.date_naive();
        let end = start.checked_add_days(Days::new(1)).ok_or(WindowError::OutOfRange)?;
        Ok(Self::between(start, end))
    }

    fn weekly(at: DateTime<Utc>) -> Result<Window, WindowError> {
        let date = at.date_naive();
        let back = u64::from(date.weekday().num_days_from_monday());
        let start = date.checked_sub_days(Days::new(back)).ok_or(WindowError::OutOfRange)?;
        let end = start.checked_add_days(Days::new(7)).ok_or(WindowError::OutOfRange)?;
        Ok(Self::between(start, end))
    }

    fn monthly(at: DateTime<Utc>) -> Result<Window, WindowError> {
        let date = at.date_naive();
        let start = first_of_month(date.year(), date.month())?;
        let (year, month) = next_month(date.year(), date.month());
        let end = first_of_month(year, month)?;
        Ok(Self::between(start, end))
    }

    fn anchored(at: DateTime<Utc>, day: u32, length_days: u32) -> Result<Window, WindowError> {
        let date = at.date_naive();
        let this_cycle = anchor_date(date.year(), date.month(), day)?;

        let (start, next_cycle) = if this_cycle <= date {
            let (year, month) = next_month(date.year(), date.month());
            (this_cycle, anchor_date(year, month, day)?)
        } else {
            let (year, month) = previous_month(date.year(), date.month());
            (anchor_date(year, month, day)?, this_cycle)
        };

        let nominal_end = start
            .checked_add_days(Days::new(u64::from(length_days)))
            .ok_or(WindowError::OutOfRange)?;
        Ok(Self::between(start, nominal_end.min(next_cycle)))
    }

    fn rolling(at: DateTime<Utc>, hours: u32) -> Result<Window, WindowError> {
        let span = TimeDelta::try_hours(i64::from(hours)).ok_or(WindowError::OutOfRange)?;
        let start = at.checked_sub_signed(span).ok_or(WindowError::OutOfRange)?;
        Ok(Window { start, end: at })
    }

    fn between(start: NaiveDate, end: NaiveDate) -> Window {
        Window {
            start: midnight(start),
            end: midnight(end),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, WindowError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(WindowError::OutOfRange)
}

const fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// Number of days in the given month.
fn days_in_month(year: i32, month: u32) -> Result<u32, WindowError> {
    let first = first_of_month(year, month)?;
    let (next_year, next) = next_month(year, month);
    let following = first_of_month(next_year, next)?;
    u32::try_from(following.signed_duration_since(first).num_days())
        .map_err(|_| WindowError::OutOfRange)
}

/// Anchor day in the given month, clamped to the month's last day.
fn anchor_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, WindowError> {
    let day = day.min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day).ok_or(WindowError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        utc(y, m, d, 0, 0)
    }

    #[test]
    fn test_daily_window() {
        let w = WindowCalculator::for_spec(
            WindowSpec::Calendar(PeriodType::Daily),
            utc(2025, 9, 3, 15, 42),
        )
        .unwrap();
        assert_eq!(w.start, day(2025, 9, 3));
        assert_eq!(w.end, day(2025, 9, 4));
    }

    #[test]
    fn test_daily_window_at_midnight_belongs_to_new_day() {
        let w = WindowCalculator::for_spec(
            WindowSpec::Calendar(PeriodType::Daily),
            day(2025, 9, 4),
        )
        .unwrap();
        assert_eq!(w.start, day(2025, 9, 4));
    }

    #[rstest]
    // 2025-09-03 is a Wednesday
    #[case(utc(2025, 9, 3, 12, 0), day(2025, 9, 1))]
    // Monday itself
    #[case(day(2025, 9, 1), day(2025, 9, 1))]
    // Sunday late night still belongs to the week started on Monday
    #[case(utc(2025, 9, 7, 23, 59), day(2025, 9, 1))]
    // Week crossing a year boundary
    #[case(utc(2026, 1, 1, 8, 0), day(2025, 12, 29))]
    fn test_weekly_window(#[case] at: DateTime<Utc>, #[case] start: DateTime<Utc>) {
        let w = WindowCalculator::for_spec(WindowSpec::Calendar(PeriodType::Weekly), at).unwrap();
        assert_eq!(w.start, start);
        assert_eq!(w.duration(), TimeDelta::days(7));
    }

    #[rstest]
    #[case(utc(2025, 9, 15, 10, 0), day(2025, 9, 1), day(2025, 10, 1))]
    #[case(utc(2025, 12, 31, 23, 59), day(2025, 12, 1), day(2026, 1, 1))]
    #[case(utc(2024, 2, 29, 0, 0), day(2024, 2, 1), day(2024, 3, 1))]
    fn test_monthly_window(
        #[case] at: DateTime<Utc>,
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
    ) {
        let w = WindowCalculator::for_spec(WindowSpec::Calendar(PeriodType::Monthly), at).unwrap();
        assert_eq!((w.start, w.end), (start, end));
    }

    #[test]
    fn test_calendar_custom_is_invalid() {
        let err = WindowCalculator::for_spec(
            WindowSpec::Calendar(PeriodType::Custom),
            utc(2025, 9, 3, 0, 0),
        )
        .unwrap_err();
        assert_eq!(err, WindowError::UnsupportedCalendarPeriod(PeriodType::Custom));
    }

    #[test]
    fn test_anchor_after_anchor_day() {
        let spec = WindowSpec::Anchor { day: 15, length_days: 30 };
        let w = WindowCalculator::for_spec(spec, utc(2025, 9, 20, 9, 0)).unwrap();
        assert_eq!(w.start, day(2025, 9, 15));
        assert_eq!(w.end, day(2025, 10, 15));
    }

    #[test]
    fn test_anchor_before_anchor_day_uses_previous_month() {
        let spec = WindowSpec::Anchor { day: 15, length_days: 10 };
        let w = WindowCalculator::for_spec(spec, utc(2025, 9, 10, 9, 0)).unwrap();
        assert_eq!(w.start, day(2025, 8, 15));
        assert_eq!(w.end, day(2025, 8, 25));
        // 10 days after the 15th: the reference is in the gap between cycles
        assert!(!w.contains(utc(2025, 9, 10, 9, 0)));
    }

    #[test]
    fn test_anchor_day_clamped_to_short_month() {
        let spec = WindowSpec::Anchor { day: 31, length_days: 30 };
        // February 2025 has 28 days
        let w = WindowCalculator::for_spec(spec, utc(2025, 2, 28, 12, 0)).unwrap();
        assert_eq!(w.start, day(2025, 2, 28));
        assert_eq!(w.end, day(2025, 3, 30));

        // Before the clamped anchor falls back to January 31st
        let w = WindowCalculator::for_spec(spec, utc(2025, 2, 10, 12, 0)).unwrap();
        assert_eq!(w.start, day(2025, 1, 31));
        assert_eq!(w.end, day(2025, 2, 28));
    }

    #[test]
    fn test_anchor_length_capped_at_next_cycle() {
        let spec = WindowSpec::Anchor { day: 1, length_days: 45 };
        let w = WindowCalculator::for_spec(spec, utc(2025, 9, 20, 0, 0)).unwrap();
        assert_eq!(w.start, day(2025, 9, 1));
        assert_eq!(w.end, day(2025, 10, 1));
    }

    #[test]
    fn test_anchor_across_year_boundary() {
        let spec = WindowSpec::Anchor { day: 20, length_days: 30 };
        let w = WindowCalculator::for_spec(spec, utc(2026, 1, 5, 0, 0)).unwrap();
        assert_eq!(w.start, day(2025, 12, 20));
        assert_eq!(w.end, day(2026, 1, 19));
    }

    #[test]
    fn test_rolling_window() {
        let at = utc(2025, 9, 3, 15, 30);
        let w = WindowCalculator::for_spec(WindowSpec::Rolling { hours: 24 }, at).unwrap();
        assert_eq!(w.start, utc(2025, 9, 2, 15, 30));
        assert_eq!(w.end, at);
        // The reference instant itself is the exclusive end
        assert!(!w.contains(at));
    }
}
