//! Usage bucket store.
//!
//! One accumulator row per (card, period type, window). Rows are read with
//! `SELECT ... FOR UPDATE` and only written when an approved transaction is
//! committed into them.
//!
//! Windows of one card and period type never overlap. When a rule change
//! moves the window (say MONTHLY from CALENDAR to ANCHOR), the older buckets
//! overlapping the new window are superseded: the new bucket starts from the
//! card's approved spend inside its own window, and the older rows are
//! deleted in the same unit of work as the first approval into it.

use chrono::{DateTime, FixedOffset, Utc};
use fuelgate_core::limits::{BucketKey, PeriodType, Window};
use fuelgate_shared::types::{CardId, Money, UsageBucketId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set,
};

use super::FuelTransactionRepository;
use crate::entities::{card_usage_buckets, sea_orm_active_enums};

/// A usage accumulator, possibly not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageBucket {
    /// Row identifier (pre-assigned for new buckets).
    pub id: UsageBucketId,
    /// Owning card.
    pub card_id: CardId,
    /// Period type.
    pub period_type: PeriodType,
    /// Boundaries.
    pub window: Window,
    /// Spend accumulated so far.
    pub spent: Money,
    /// Whether the row exists in the database.
    pub persisted: bool,
    /// Overlapping buckets of an older window, removed when this one is
    /// first written.
    pub supersedes: Vec<UsageBucketId>,
}

/// Reads and writes usage buckets inside an authorization transaction.
pub struct UsageBucketStore;

impl UsageBucketStore {
    /// Locks the bucket for `key`, or returns an unpersisted one.
    ///
    /// Every bucket of the card and period type overlapping the window is
    /// locked. A new bucket starts empty, unless it supersedes overlapping
    /// buckets of another window; then it starts from the card's approved
    /// spend inside `key.window`. The caller holds the card's account lock,
    /// so no other transaction can create a bucket between this read and
    /// [`Self::increment`].
    pub async fn get_or_create_for_update(
        txn: &DatabaseTransaction,
        card_id: CardId,
        key: BucketKey,
    ) -> Result<UsageBucket, DbErr> {
        let overlapping = Self::overlapping(card_id, key)
            .lock_exclusive()
            .all(txn)
            .await?;

        if let Some(model) = overlapping.iter().find(|model| same_window(model, key.window)) {
            return Ok(to_domain(model.clone()));
        }

        let mut bucket = UsageBucket {
            id: UsageBucketId::new(),
            card_id,
            period_type: key.period_type,
            window: key.window,
            spent: Money::ZERO,
            persisted: false,
            supersedes: Vec::new(),
        };
        if !overlapping.is_empty() {
            bucket.spent =
                FuelTransactionRepository::approved_spend_in_window(txn, card_id, key.window)
                    .await?;
            bucket.supersedes = overlapping
                .iter()
                .map(|model| UsageBucketId::from_uuid(model.id))
                .collect();
            tracing::info!(
                card_id = %card_id,
                period_type = %key.period_type,
                superseded = bucket.supersedes.len(),
                spent = %bucket.spent,
                "Usage bucket window changed"
            );
        }
        Ok(bucket)
    }

    /// Adds `amount` to the bucket, inserting it if it is new.
    ///
    /// Limits must already have been checked.
    pub async fn increment(
        txn: &DatabaseTransaction,
        bucket: &UsageBucket,
        amount: Money,
    ) -> Result<UsageBucket, DbErr> {
        let spent = bucket
            .spent
            .checked_add(amount)
            .ok_or_else(|| DbErr::Custom(format!("usage bucket {} overflow", bucket.id)))?;
        let now: DateTime<FixedOffset> = Utc::now().into();

        let model = if bucket.persisted {
            card_usage_buckets::ActiveModel {
                id: Set(bucket.id.into_inner()),
                spent_cents: Set(spent.minor()),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(txn)
            .await?
        } else {
            if !bucket.supersedes.is_empty() {
                card_usage_buckets::Entity::delete_many()
                    .filter(
                        card_usage_buckets::Column::Id
                            .is_in(bucket.supersedes.iter().copied().map(UsageBucketId::into_inner)),
                    )
                    .exec(txn)
                    .await?;
            }
            card_usage_buckets::ActiveModel {
                id: Set(bucket.id.into_inner()),
                card_id: Set(bucket.card_id.into_inner()),
                period_type: Set(bucket.period_type.into()),
                bucket_start: Set(bucket.window.start.into()),
                bucket_end: Set(bucket.window.end.into()),
                spent_cents: Set(spent.minor()),
                updated_at: Set(now),
            }
            .insert(txn)
            .await?
        };

        Ok(to_domain(model))
    }

    /// Reads a bucket without locking.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        card_id: CardId,
        key: BucketKey,
    ) -> Result<Option<UsageBucket>, DbErr> {
        Ok(Self::query(card_id, key).one(conn).await?.map(to_domain))
    }

    fn overlapping(
        card_id: CardId,
        key: BucketKey,
    ) -> sea_orm::Select<card_usage_buckets::Entity> {
        let period: sea_orm_active_enums::PeriodType = key.period_type.into();
        let start: DateTime<FixedOffset> = key.window.start.into();
        let end: DateTime<FixedOffset> = key.window.end.into();
        card_usage_buckets::Entity::find()
            .filter(card_usage_buckets::Column::CardId.eq(card_id.into_inner()))
            .filter(card_usage_buckets::Column::PeriodType.eq(period))
            .filter(card_usage_buckets::Column::BucketStart.lt(end))
            .filter(card_usage_buckets::Column::BucketEnd.gt(start))
    }

    fn query(card_id: CardId, key: BucketKey) -> sea_orm::Select<card_usage_buckets::Entity> {
        let period: sea_orm_active_enums::PeriodType = key.period_type.into();
        let start: DateTime<FixedOffset> = key.window.start.into();
        let end: DateTime<FixedOffset> = key.window.end.into();
        card_usage_buckets::Entity::find()
            .filter(card_usage_buckets::Column::CardId.eq(card_id.into_inner()))
            .filter(card_usage_buckets::Column::PeriodType.eq(period))
            .filter(card_usage_buckets::Column::BucketStart.eq(start))
            .filter(card_usage_buckets::Column::BucketEnd.eq(end))
    }
}

fn to_domain(model: card_usage_buckets::Model) -> UsageBucket {
    UsageBucket {
        id: UsageBucketId::from_uuid(model.id),
        card_id: CardId::from_uuid(model.card_id),
        period_type: model.period_type.into(),
        window: Window {
            start: model.bucket_start.with_timezone(&Utc),
            end: model.bucket_end.with_timezone(&Utc),
        },
        spent: Money::from_minor(model.spent_cents),
        persisted: true,
        supersedes: Vec::new(),
    }
}

fn same_window(model: &card_usage_buckets::Model, window: Window) -> bool {
    model.bucket_start.with_timezone(&Utc) == window.start
        && model.bucket_end.with_timezone(&Utc) == window.end
}
