//! Concurrent authorization stress tests.
//!
//! Verifies that:
//! - Concurrent debits on one organization never over-spend the balance
//! - Concurrent deliveries of one idempotency key approve exactly once
//! - Concurrent transactions never push a card past its daily limit

use std::sync::Arc;

use chrono::Utc;
use fuelgate_core::authorization::{AuthorizationOutcome, DeclineCode};
use fuelgate_core::card::CardStatus;
use fuelgate_core::limits::{BucketKey, PeriodType, WindowCalculator, WindowSpec};
use fuelgate_db::repositories::{BalanceLedger, UsageBucketStore};
use fuelgate_db::{TransactionAuthorizer, WebhookService};
use fuelgate_shared::UnknownStationPolicy;
use fuelgate_shared::types::{Money, OrgAccountId};
use futures::future::join_all;
use tokio::sync::Barrier;
use uuid::Uuid;

mod common;

use common::{add_calendar_rule, app_config, connect, setup};

#[derive(Debug, Default)]
struct Tally {
    approved: usize,
    insufficient: usize,
    daily_limit: usize,
    duplicate: usize,
    other: Vec<AuthorizationOutcome>,
}

impl Tally {
    fn from_outcomes(outcomes: Vec<AuthorizationOutcome>) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            match &outcome {
                AuthorizationOutcome::Approved { .. } => tally.approved += 1,
                AuthorizationOutcome::Duplicate => tally.duplicate += 1,
                AuthorizationOutcome::Rejected {
                    code: DeclineCode::InsufficientFunds,
                    ..
                } => tally.insufficient += 1,
                AuthorizationOutcome::Rejected {
                    code: DeclineCode::LimitExceeded(PeriodType::Daily),
                    ..
                } => tally.daily_limit += 1,
                _ => tally.other.push(outcome),
            }
        }
        tally
    }
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    const TASKS: usize = 20;

    let Some(db) = connect().await else { return };
    let fixture = Arc::new(setup(&db, 100_000, CardStatus::Active).await);
    let config = app_config(UnknownStationPolicy::Register);
    let authorizer = TransactionAuthorizer::new(
        db.clone(),
        config.authorization,
        config.database.lock_timeout_ms,
    );
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let authorizer = authorizer.clone();
            let fixture = Arc::clone(&fixture);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                authorizer
                    .authorize(None, Some(fixture.station_id), &fixture.incoming(10_000, Utc::now()))
                    .await
            })
        })
        .collect();

    let outcomes = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let tally = Tally::from_outcomes(outcomes);

    assert!(tally.other.is_empty(), "unexpected outcomes: {:?}", tally.other);
    assert_eq!(tally.approved, 10);
    assert_eq!(tally.insufficient, 10);

    let ledger = BalanceLedger::new(db.clone());
    assert_eq!(
        ledger.balance(fixture.organization_id).await.unwrap(),
        Some(Money::ZERO)
    );

    // Opening credit plus one debit per approval, each leaving a non-negative balance
    let entries = ledger
        .entries(OrgAccountId::from_uuid(fixture.account_id))
        .await
        .unwrap();
    assert_eq!(entries.len(), 11);
    assert!(entries.iter().all(|entry| entry.balance_after >= 0));
}

#[tokio::test]
async fn test_concurrent_duplicates_approve_once() {
    const TASKS: usize = 10;

    let Some(db) = connect().await else { return };
    let fixture = setup(&db, 5_000_000, CardStatus::Active).await;
    let service = WebhookService::new(db.clone(), &app_config(UnknownStationPolicy::Register));
    let key = Arc::new(format!("tx-{}", Uuid::new_v4()));
    let raw = Arc::new(fixture.raw(10_000));
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let service = service.clone();
            let key = Arc::clone(&key);
            let raw = Arc::clone(&raw);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service.handle(&raw, Some(key.as_str())).await
            })
        })
        .collect();

    let outcomes = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let tally = Tally::from_outcomes(outcomes);

    assert!(tally.other.is_empty(), "unexpected outcomes: {:?}", tally.other);
    assert_eq!(tally.approved, 1);
    assert_eq!(tally.duplicate, TASKS - 1);
    assert_eq!(
        BalanceLedger::new(db.clone())
            .balance(fixture.organization_id)
            .await
            .unwrap(),
        Some(Money::from_minor(4_990_000))
    );
}

#[tokio::test]
async fn test_concurrent_transactions_respect_daily_limit() {
    const TASKS: usize = 10;

    let Some(db) = connect().await else { return };
    let fixture = Arc::new(setup(&db, 5_000_000, CardStatus::Active).await);
    add_calendar_rule(&db, &fixture, PeriodType::Daily, 50_000).await;
    let config = app_config(UnknownStationPolicy::Register);
    let authorizer = TransactionAuthorizer::new(
        db.clone(),
        config.authorization,
        config.database.lock_timeout_ms,
    );
    let occurred_at = Utc::now();
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let authorizer = authorizer.clone();
            let fixture = Arc::clone(&fixture);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                authorizer
                    .authorize(None, Some(fixture.station_id), &fixture.incoming(10_000, occurred_at))
                    .await
            })
        })
        .collect();

    let outcomes = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let tally = Tally::from_outcomes(outcomes);

    assert!(tally.other.is_empty(), "unexpected outcomes: {:?}", tally.other);
    assert_eq!(tally.approved, 5);
    assert_eq!(tally.daily_limit, 5);

    let window =
        WindowCalculator::for_spec(WindowSpec::Calendar(PeriodType::Daily), occurred_at).unwrap();
    let bucket = UsageBucketStore::find(
        &db,
        fixture.card.id,
        BucketKey {
            period_type: PeriodType::Daily,
            window,
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(bucket.spent, Money::from_minor(50_000));
}
