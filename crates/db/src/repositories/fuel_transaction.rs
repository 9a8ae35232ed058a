//! Fuel transaction repository.
//!
//! Transactions are immutable once written. Every authorization that resolved
//! a card and its organization leaves exactly one row, approved or rejected.

use chrono::{DateTime, FixedOffset, Utc};
use fuelgate_core::limits::{ApprovedSpend, Window};
use fuelgate_shared::types::{
    CardId, CurrencyCode, FuelTransactionId, Money, OrganizationId, StationId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, sea_query::Expr,
};

use crate::entities::{fuel_transactions, sea_orm_active_enums::FuelTransactionStatus};

/// A fuel transaction to record.
#[derive(Debug, Clone)]
pub struct NewFuelTransaction {
    /// Pre-assigned identifier.
    pub id: FuelTransactionId,
    /// Card used.
    pub card_id: CardId,
    /// Card's organization.
    pub organization_id: OrganizationId,
    /// Reporting station.
    pub station_id: Option<StationId>,
    /// Station or acquirer reference.
    pub external_ref: Option<String>,
    /// Positive amount.
    pub amount: Money,
    /// Currency of the amount.
    pub currency: CurrencyCode,
    /// When the purchase happened.
    pub occurred_at: DateTime<Utc>,
    /// Approved or rejected.
    pub status: FuelTransactionStatus,
    /// Decline code for rejections.
    pub decline_reason: Option<String>,
    /// Free-form context (decline message, webhook event).
    pub meta: serde_json::Value,
}

/// Fuel transaction repository.
#[derive(Debug, Clone)]
pub struct FuelTransactionRepository {
    db: DatabaseConnection,
}

impl FuelTransactionRepository {
    /// Creates a new fuel transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a transaction inside the caller's unit of work.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        input: NewFuelTransaction,
    ) -> Result<fuel_transactions::Model, DbErr> {
        let occurred_at: DateTime<FixedOffset> = input.occurred_at.into();
        fuel_transactions::ActiveModel {
            id: Set(input.id.into_inner()),
            occurred_at: Set(occurred_at),
            card_id: Set(input.card_id.into_inner()),
            organization_id: Set(input.organization_id.into_inner()),
            station_id: Set(input.station_id.map(StationId::into_inner)),
            external_ref: Set(input.external_ref),
            amount_cents: Set(input.amount.minor()),
            currency: Set(input.currency.to_string()),
            status: Set(input.status),
            decline_reason: Set(input.decline_reason),
            meta: Set(input.meta),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
    }

    /// The card's approved transactions with `occurred_at` in `window`.
    ///
    /// Backs ROLLING limits. Read under the organization account lock, which
    /// serializes every approval for the card.
    pub async fn approved_in_window<C: ConnectionTrait>(
        conn: &C,
        card_id: CardId,
        window: Window,
    ) -> Result<Vec<ApprovedSpend>, DbErr> {
        let start: DateTime<FixedOffset> = window.start.into();
        let end: DateTime<FixedOffset> = window.end.into();
        let rows: Vec<(DateTime<FixedOffset>, i64)> = fuel_transactions::Entity::find()
            .select_only()
            .column(fuel_transactions::Column::OccurredAt)
            .column(fuel_transactions::Column::AmountCents)
            .filter(fuel_transactions::Column::CardId.eq(card_id.into_inner()))
            .filter(fuel_transactions::Column::Status.eq(FuelTransactionStatus::Approved))
            .filter(fuel_transactions::Column::OccurredAt.gte(start))
            .filter(fuel_transactions::Column::OccurredAt.lt(end))
            .into_tuple()
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(occurred_at, amount)| ApprovedSpend {
                occurred_at: occurred_at.with_timezone(&Utc),
                amount: Money::from_minor(amount),
            })
            .collect())
    }

    /// Sum of the card's approved transactions with `occurred_at` in `window`.
    ///
    /// Seeds a usage bucket whose window replaces an older one.
    pub async fn approved_spend_in_window<C: ConnectionTrait>(
        conn: &C,
        card_id: CardId,
        window: Window,
    ) -> Result<Money, DbErr> {
        let start: DateTime<FixedOffset> = window.start.into();
        let end: DateTime<FixedOffset> = window.end.into();
        let total: Option<i64> = fuel_transactions::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(amount_cents), 0)::BIGINT"), "total")
            .filter(fuel_transactions::Column::CardId.eq(card_id.into_inner()))
            .filter(fuel_transactions::Column::Status.eq(FuelTransactionStatus::Approved))
            .filter(fuel_transactions::Column::OccurredAt.gte(start))
            .filter(fuel_transactions::Column::OccurredAt.lt(end))
            .into_tuple()
            .one(conn)
            .await?;
        Ok(Money::from_minor(total.unwrap_or(0)))
    }

    /// Finds a transaction by ID.
    pub async fn find_by_id(
        &self,
        id: FuelTransactionId,
    ) -> Result<Option<fuel_transactions::Model>, DbErr> {
        fuel_transactions::Entity::find()
            .filter(fuel_transactions::Column::Id.eq(id.into_inner()))
            .one(&self.db)
            .await
    }

    /// Counts the card's transactions with the given status.
    pub async fn count_for_card(
        &self,
        card_id: CardId,
        status: FuelTransactionStatus,
    ) -> Result<u64, DbErr> {
        fuel_transactions::Entity::find()
            .filter(fuel_transactions::Column::CardId.eq(card_id.into_inner()))
            .filter(fuel_transactions::Column::Status.eq(status))
            .count(&self.db)
            .await
    }
}
