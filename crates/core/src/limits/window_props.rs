//! Property-based tests for window calculation.
//!
//! - Windows are deterministic for a given rule and instant
//! - Calendar windows contain their reference instant
//! - Anchored cycles never overlap the following cycle
//! - Rolling windows end exactly at the reference instant

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;

use super::types::{PeriodType, WindowSpec};
use super::window::WindowCalculator;

/// Strategy for instants between 2000-01-01 and 2099-12-31.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_358_400i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn calendar_period() -> impl Strategy<Value = PeriodType> {
    prop_oneof![
        Just(PeriodType::Daily),
        Just(PeriodType::Weekly),
        Just(PeriodType::Monthly),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_calendar_window_contains_reference(at in instant(), period in calendar_period()) {
        let w = WindowCalculator::for_spec(WindowSpec::Calendar(period), at).unwrap();
        prop_assert!(w.contains(at));
        prop_assert!(w.start < w.end);
    }

    #[test]
    fn prop_windows_are_deterministic(at in instant(), period in calendar_period(), day in 1u32..=31, len in 1u32..=60) {
        let cal = WindowSpec::Calendar(period);
        prop_assert_eq!(
            WindowCalculator::for_spec(cal, at).unwrap(),
            WindowCalculator::for_spec(cal, at).unwrap()
        );
        let anchor = WindowSpec::Anchor { day, length_days: len };
        prop_assert_eq!(
            WindowCalculator::for_spec(anchor, at).unwrap(),
            WindowCalculator::for_spec(anchor, at).unwrap()
        );
    }

    #[test]
    fn prop_instants_in_same_window_share_it(at in instant(), period in calendar_period(), offset in 0i64..86_400) {
        let w = WindowCalculator::for_spec(WindowSpec::Calendar(period), at).unwrap();
        let other = w.start + TimeDelta::seconds(offset);
        if w.contains(other) {
            prop_assert_eq!(WindowCalculator::for_spec(WindowSpec::Calendar(period), other).unwrap(), w);
        }
    }

    #[test]
    fn prop_anchor_window_starts_on_or_before_reference(at in instant(), day in 1u32..=31, len in 1u32..=60) {
        let w = WindowCalculator::for_spec(WindowSpec::Anchor { day, length_days: len }, at).unwrap();
        prop_assert!(w.start <= at);
        prop_assert!(w.start < w.end);
        prop_assert!(w.duration() <= TimeDelta::days(i64::from(len)));
    }

    #[test]
    fn prop_anchor_cycles_do_not_overlap(at in instant(), day in 1u32..=31, len in 1u32..=60) {
        let spec = WindowSpec::Anchor { day, length_days: len };
        let w = WindowCalculator::for_spec(spec, at).unwrap();
        // 32 days after the start always lands in the next cycle or its gap
        let later = WindowCalculator::for_spec(spec, w.start + TimeDelta::days(32)).unwrap();
        prop_assert!(later.start >= w.end);
    }

    #[test]
    fn prop_rolling_window_ends_at_reference(at in instant(), hours in 1u32..=8_760) {
        let w = WindowCalculator::for_spec(WindowSpec::Rolling { hours }, at).unwrap();
        prop_assert_eq!(w.end, at);
        prop_assert_eq!(w.duration(), TimeDelta::hours(i64::from(hours)));
    }
}
