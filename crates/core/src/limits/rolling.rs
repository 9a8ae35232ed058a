//! Spend under rolling windows.
//!
//! A rolling rule bounds every `span`-long window, not only the one ending at
//! the new transaction. Deliveries can arrive out of timestamp order, so a
//! transaction at `at` is checked against every window `[s, s + span)` with
//! `at - span <= s <= at`. Approvals stamped at or after `at` count too.

use chrono::{DateTime, Utc};
use fuelgate_shared::types::Money;

use super::window::Window;

/// An approved purchase counted by rolling limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovedSpend {
    /// When the purchase happened.
    pub occurred_at: DateTime<Utc>,
    /// Approved amount.
    pub amount: Money,
}

/// Instants that can share a rolling window with the reference instant.
///
/// For the rolling window `[at - span, at)` this is `[at - span, at + span)`.
#[must_use]
pub fn reach(window: Window) -> Option<Window> {
    let end = window.end.checked_add_signed(window.duration())?;
    Some(Window {
        start: window.start,
        end,
    })
}

/// Largest approved spend in any rolling window around the reference instant.
///
/// `window` is the rolling window `[at - span, at)`. Candidate windows start
/// at `at - span`, at `at`, or at an approval in between, since a window's
/// total can only drop when its start passes an approval. The total
/// saturates at `i64::MAX` so an overflowing history still fails the limit.
#[must_use]
pub fn peak_spend(window: Window, approved: &[ApprovedSpend]) -> Money {
    let span = window.duration();
    let at = window.end;

    [window.start, at]
        .into_iter()
        .chain(
            approved
                .iter()
                .map(|spend| spend.occurred_at)
                .filter(|t| window.start <= *t && *t <= at),
        )
        .map(|start| {
            let end = start.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC);
            total_between(approved, start, end)
        })
        .max()
        .unwrap_or(Money::ZERO)
}

fn total_between(approved: &[ApprovedSpend], start: DateTime<Utc>, end: DateTime<Utc>) -> Money {
    approved
        .iter()
        .filter(|spend| start <= spend.occurred_at && spend.occurred_at < end)
        .try_fold(Money::ZERO, |total, spend| total.checked_add(spend.amount))
        .unwrap_or(Money::from_minor(i64::MAX))
}
