//! Webhook event store and idempotency gate.
//!
//! An event is unique per `(station_id, idempotency_key)` when a key is
//! present. Registration only answers "have we already approved this?";
//! the authoritative check happens again under a row lock inside the
//! authorization transaction.

use chrono::Utc;
use fuelgate_core::idempotency::{
    GateDecision, IdempotencyError, IdempotencyKey, WebhookEventStatus,
};
use fuelgate_shared::types::{StationId, WebhookEventId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
    sea_query::OnConflict,
};

use crate::entities::{sea_orm_active_enums, webhook_events};

/// Error types for event processing.
#[derive(Debug, thiserror::Error)]
pub enum IdempotencyGateError {
    /// The event row disappeared between registration and processing.
    #[error("Webhook event not found: {0}")]
    EventNotFound(WebhookEventId),

    /// Illegal status change.
    #[error(transparent)]
    Transition(#[from] IdempotencyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of registering an inbound delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Event row tracking this delivery.
    pub event_id: WebhookEventId,
    /// Whether to authorize.
    pub decision: GateDecision,
}

/// Idempotency gate over the `webhook_events` table.
#[derive(Debug, Clone)]
pub struct IdempotencyGate {
    db: DatabaseConnection,
}

impl IdempotencyGate {
    /// Creates a new idempotency gate.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an inbound delivery.
    ///
    /// Without a key every delivery gets its own event. With a key the
    /// existing event is reused: `processed` answers `Duplicate`, `failed`
    /// is reset to `received` so the redelivery can be authorized.
    pub async fn register(
        &self,
        station_id: Option<StationId>,
        key: Option<&IdempotencyKey>,
        payload: serde_json::Value,
    ) -> Result<Registration, DbErr> {
        let model = webhook_events::ActiveModel {
            id: Set(WebhookEventId::new().into_inner()),
            station_id: Set(station_id.map(StationId::into_inner)),
            idempotency_key: Set(key.map(|k| k.as_str().to_string())),
            raw_payload: Set(payload),
            signature: Set(None),
            received_at: Set(Utc::now().into()),
            processed_at: Set(None),
            status: Set(sea_orm_active_enums::WebhookEventStatus::Received),
            error_message: Set(None),
        };

        let Some(key) = key else {
            let event = model.insert(&self.db).await?;
            return Ok(Registration {
                event_id: WebhookEventId::from_uuid(event.id),
                decision: GateDecision::Proceed,
            });
        };

        webhook_events::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    webhook_events::Column::StationId,
                    webhook_events::Column::IdempotencyKey,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let station_filter = match station_id {
            Some(id) => webhook_events::Column::StationId.eq(id.into_inner()),
            None => webhook_events::Column::StationId.is_null(),
        };
        let event = webhook_events::Entity::find()
            .filter(station_filter)
            .filter(webhook_events::Column::IdempotencyKey.eq(key.as_str()))
            .order_by_asc(webhook_events::Column::ReceivedAt)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("webhook event {key}")))?;

        let event_id = WebhookEventId::from_uuid(event.id);
        let status: WebhookEventStatus = event.status.into();
        let decision = WebhookEventStatus::gate(Some(status));

        if status == WebhookEventStatus::Failed {
            tracing::info!(event_id = %event_id, "Retrying failed webhook event");
            webhook_events::Entity::update_many()
                .col_expr(
                    webhook_events::Column::Status,
                    Expr::value(sea_orm_active_enums::WebhookEventStatus::Received),
                )
                .col_expr(webhook_events::Column::ErrorMessage, Expr::value(None::<String>))
                .filter(webhook_events::Column::Id.eq(event.id))
                .filter(
                    webhook_events::Column::Status
                        .eq(sea_orm_active_enums::WebhookEventStatus::Failed),
                )
                .exec(&self.db)
                .await?;
        }

        Ok(Registration { event_id, decision })
    }

    /// Locks the event row and returns its current status.
    pub async fn lock_for_processing(
        txn: &DatabaseTransaction,
        event_id: WebhookEventId,
    ) -> Result<WebhookEventStatus, IdempotencyGateError> {
        let event = webhook_events::Entity::find_by_id(event_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(IdempotencyGateError::EventNotFound(event_id))?;
        Ok(event.status.into())
    }

    /// Marks a locked event processed.
    pub async fn mark_processed(
        txn: &DatabaseTransaction,
        event_id: WebhookEventId,
    ) -> Result<(), IdempotencyGateError> {
        let status = Self::lock_for_processing(txn, event_id).await?;
        status.transition(WebhookEventStatus::Processed)?;

        webhook_events::ActiveModel {
            id: Set(event_id.into_inner()),
            status: Set(sea_orm_active_enums::WebhookEventStatus::Processed),
            processed_at: Set(Some(Utc::now().into())),
            error_message: Set(None),
            ..Default::default()
        }
        .update(txn)
        .await?;
        Ok(())
    }

    /// Marks an event failed with the outcome code.
    ///
    /// Works inside the authorization transaction or on its own after a
    /// rollback. A processed event is left alone.
    pub async fn mark_failed<C: ConnectionTrait>(
        conn: &C,
        event_id: WebhookEventId,
        code: &str,
    ) -> Result<(), DbErr> {
        webhook_events::Entity::update_many()
            .col_expr(
                webhook_events::Column::Status,
                Expr::value(sea_orm_active_enums::WebhookEventStatus::Failed),
            )
            .col_expr(
                webhook_events::Column::ProcessedAt,
                Expr::value(Some(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now()))),
            )
            .col_expr(webhook_events::Column::ErrorMessage, Expr::value(code))
            .filter(webhook_events::Column::Id.eq(event_id.into_inner()))
            .filter(
                webhook_events::Column::Status
                    .ne(sea_orm_active_enums::WebhookEventStatus::Processed),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Marks an event failed outside any authorization transaction.
    pub async fn fail(&self, event_id: WebhookEventId, code: &str) -> Result<(), DbErr> {
        Self::mark_failed(&self.db, event_id, code).await
    }

    /// Reads an event.
    pub async fn find(
        &self,
        event_id: WebhookEventId,
    ) -> Result<Option<webhook_events::Model>, DbErr> {
        webhook_events::Entity::find_by_id(event_id.into_inner())
            .one(&self.db)
            .await
    }
}
