//! Transaction authorization.
//!
//! One authorization is one database transaction with a bounded lock wait.
//! Locks are always taken in the same order: webhook event, organization
//! account, then usage buckets by (period type, window start).

use fuelgate_core::authorization::{
    AuthorizationOutcome, AuthorizationService, BadRequestCode, IncomingTransaction, Verdict,
};
use fuelgate_core::card::Card;
use fuelgate_core::idempotency::WebhookEventStatus;
use fuelgate_core::ledger::{LedgerError, OrgAccount};
use fuelgate_core::limits::LimitError;
use fuelgate_shared::AuthorizationConfig;
use fuelgate_shared::types::{CurrencyCode, FuelTransactionId, StationId, WebhookEventId};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr};

use crate::entities::sea_orm_active_enums::FuelTransactionStatus;
use crate::lock::{LockScope, is_lock_timeout};
use crate::repositories::{
    BalanceLedger, BalanceLedgerError, CardLookup, CardRepository, FuelTransactionRepository,
    IdempotencyGate, IdempotencyGateError, LimitRuleRepository, NewFuelTransaction,
    OrganizationRepository, UsageBucketStore,
};

use super::limit_evaluator::{LimitEvaluation, LimitEvaluationError, LimitRuleEvaluator};

/// Faults that abort an authorization.
///
/// Business outcomes never appear here; these all end in a rollback and a
/// `LOCK_TIMEOUT` or `INTERNAL_ERROR` answer.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    /// Database error, including lock timeouts.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The card's limit rules are misconfigured.
    #[error("Limit configuration error: {0}")]
    LimitConfiguration(#[from] LimitError),

    /// Balance arithmetic failed for a reason other than insufficient funds.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The locked account row changed underneath us.
    #[error("Account version conflict")]
    VersionConflict,

    /// The webhook event row vanished or is in an impossible state.
    #[error("Webhook event error: {0}")]
    Event(String),

    /// The organization row stores an unusable currency.
    #[error("Organization currency is invalid: {0}")]
    OrganizationCurrency(String),
}

impl AuthorizeError {
    /// Returns true if a row lock wait hit `lock_timeout`.
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Database(err) if is_lock_timeout(err))
    }

    /// Generic outcome reported to the station.
    #[must_use]
    pub fn outcome(&self) -> AuthorizationOutcome {
        if self.is_lock_timeout() {
            AuthorizationOutcome::lock_timeout()
        } else {
            AuthorizationOutcome::internal_error()
        }
    }
}

impl From<LimitEvaluationError> for AuthorizeError {
    fn from(err: LimitEvaluationError) -> Self {
        match err {
            LimitEvaluationError::Configuration(err) => Self::LimitConfiguration(err),
            LimitEvaluationError::Database(err) => Self::Database(err),
        }
    }
}

impl From<BalanceLedgerError> for AuthorizeError {
    fn from(err: BalanceLedgerError) -> Self {
        match err {
            BalanceLedgerError::Database(err) => Self::Database(err),
            BalanceLedgerError::Ledger(err) => Self::Ledger(err),
            BalanceLedgerError::VersionConflict(_) => Self::VersionConflict,
            BalanceLedgerError::AccountNotFound(id) => {
                Self::Event(format!("account of organization {id} disappeared"))
            }
        }
    }
}

impl From<IdempotencyGateError> for AuthorizeError {
    fn from(err: IdempotencyGateError) -> Self {
        match err {
            IdempotencyGateError::Database(err) => Self::Database(err),
            other => Self::Event(other.to_string()),
        }
    }
}

/// Facts established before the decision, carried into the transaction record.
struct Resolved<'a> {
    event_id: Option<WebhookEventId>,
    station_id: Option<StationId>,
    incoming: &'a IncomingTransaction,
    card: Card,
}

/// Authorizes fuel transactions.
#[derive(Debug, Clone)]
pub struct TransactionAuthorizer {
    db: DatabaseConnection,
    cards: CardRepository,
    organizations: OrganizationRepository,
    ledger: BalanceLedger,
    limits: LimitRuleEvaluator,
    config: AuthorizationConfig,
    lock_timeout_ms: u64,
}

impl TransactionAuthorizer {
    /// Creates an authorizer over the given pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AuthorizationConfig, lock_timeout_ms: u64) -> Self {
        Self {
            cards: CardRepository::new(db.clone()),
            organizations: OrganizationRepository::new(db.clone()),
            ledger: BalanceLedger::new(db.clone()),
            limits: LimitRuleEvaluator::new(LimitRuleRepository::new(db.clone())),
            db,
            config,
            lock_timeout_ms,
        }
    }

    /// Authorizes one transaction.
    ///
    /// Every path ends in an outcome. On a fault the unit of work is rolled
    /// back and the event is marked failed in a separate write, so a
    /// redelivery can try again.
    pub async fn authorize(
        &self,
        event_id: Option<WebhookEventId>,
        station_id: Option<StationId>,
        incoming: &IncomingTransaction,
    ) -> AuthorizationOutcome {
        match self.run(event_id, station_id, incoming).await {
            Ok(outcome) => {
                tracing::info!(
                    event_id = ?event_id,
                    amount = %incoming.amount,
                    outcome = outcome.kind(),
                    code = outcome.code().unwrap_or_default(),
                    "Authorization finished"
                );
                outcome
            }
            Err(err) => {
                let outcome = err.outcome();
                let code = outcome.code().unwrap_or_default();
                if err.is_lock_timeout() {
                    tracing::warn!(event_id = ?event_id, code, "Authorization lock wait timed out");
                } else {
                    tracing::error!(event_id = ?event_id, code, error = %err, "Authorization failed");
                }
                if let Some(event_id) = event_id {
                    if let Err(mark_err) = IdempotencyGate::mark_failed(&self.db, event_id, code).await {
                        tracing::error!(
                            event_id = %event_id,
                            error = %mark_err,
                            "Failed to mark webhook event failed"
                        );
                    }
                }
                outcome
            }
        }
    }

    async fn run(
        &self,
        event_id: Option<WebhookEventId>,
        station_id: Option<StationId>,
        incoming: &IncomingTransaction,
    ) -> Result<AuthorizationOutcome, AuthorizeError> {
        let scope = LockScope::begin(&self.db, self.lock_timeout_ms).await?;

        match self.decide(scope.transaction(), event_id, station_id, incoming).await {
            Ok(outcome) => {
                scope.commit().await?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = scope.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn decide(
        &self,
        txn: &DatabaseTransaction,
        event_id: Option<WebhookEventId>,
        station_id: Option<StationId>,
        incoming: &IncomingTransaction,
    ) -> Result<AuthorizationOutcome, AuthorizeError> {
        if let Some(event_id) = event_id {
            let status = IdempotencyGate::lock_for_processing(txn, event_id).await?;
            if status == WebhookEventStatus::Processed {
                return Ok(AuthorizationOutcome::Duplicate);
            }
        }

        let card = match self
            .cards
            .resolve(txn, &incoming.card, self.config.allow_last4_fallback)
            .await?
        {
            CardLookup::Found(card) => card,
            CardLookup::NotFound => {
                return bad_request(txn, event_id, BadRequestCode::CardNotFound, "Card not found")
                    .await;
            }
            CardLookup::Ambiguous => {
                tracing::warn!(last4 = %incoming.card.last4, "Card credentials are ambiguous");
                return bad_request(txn, event_id, BadRequestCode::CardNotFound, "Card not found")
                    .await;
            }
        };

        let Some(organization) = self.organizations.find_by_id(txn, card.organization_id).await?
        else {
            return bad_request(
                txn,
                event_id,
                BadRequestCode::OrganizationNotFound,
                "Organization not found",
            )
            .await;
        };
        let currency: CurrencyCode = organization
            .currency
            .parse()
            .map_err(|_| AuthorizeError::OrganizationCurrency(organization.currency.clone()))?;
        if let Err(outcome) = AuthorizationService::check_currency(&currency, &incoming.currency) {
            return finish(txn, event_id, outcome).await;
        }

        let Some(account) = self.ledger.lock(txn, card.organization_id).await? else {
            return bad_request(
                txn,
                event_id,
                BadRequestCode::AccountNotFound,
                "Organization account not found",
            )
            .await;
        };

        let resolved = Resolved {
            event_id,
            station_id,
            incoming,
            card,
        };

        if let Err(decline) = AuthorizationService::check_card(&resolved.card) {
            return self.reject(txn, &resolved, decline.into()).await;
        }

        let evaluation = self
            .limits
            .evaluate(txn, resolved.card.id, incoming.amount, incoming.occurred_at)
            .await?;

        match AuthorizationService::settle(&evaluation.decision(), &account, incoming.amount) {
            Verdict::Approve => self.approve(txn, &resolved, evaluation, account).await,
            Verdict::Decline(decline) => self.reject(txn, &resolved, decline.into()).await,
        }
    }

    async fn approve(
        &self,
        txn: &DatabaseTransaction,
        resolved: &Resolved<'_>,
        evaluation: LimitEvaluation,
        mut account: OrgAccount,
    ) -> Result<AuthorizationOutcome, AuthorizeError> {
        let amount = resolved.incoming.amount;
        let transaction_id = FuelTransactionId::new();
        FuelTransactionRepository::insert(
            txn,
            transaction_record(resolved, transaction_id, FuelTransactionStatus::Approved, None),
        )
        .await?;
        let change = self
            .ledger
            .debit(txn, &mut account, amount, transaction_id)
            .await?;

        if let LimitEvaluation::Pass { buckets } = evaluation {
            for bucket in &buckets {
                UsageBucketStore::increment(txn, bucket, amount).await?;
            }
        }

        if let Some(event_id) = resolved.event_id {
            IdempotencyGate::mark_processed(txn, event_id).await?;
        }

        tracing::info!(
            card_id = %resolved.card.id,
            organization_id = %resolved.card.organization_id,
            transaction_id = %transaction_id,
            amount = %amount,
            balance_after = %change.after,
            "Transaction approved"
        );
        Ok(AuthorizationOutcome::Approved { transaction_id })
    }

    async fn reject(
        &self,
        txn: &DatabaseTransaction,
        resolved: &Resolved<'_>,
        outcome: AuthorizationOutcome,
    ) -> Result<AuthorizationOutcome, AuthorizeError> {
        let code = outcome.code().unwrap_or_default();
        FuelTransactionRepository::insert(
            txn,
            transaction_record(
                resolved,
                FuelTransactionId::new(),
                FuelTransactionStatus::Rejected,
                outcome.message().map(str::to_string),
            ),
        )
        .await?;

        tracing::info!(
            card_id = %resolved.card.id,
            organization_id = %resolved.card.organization_id,
            amount = %resolved.incoming.amount,
            code,
            "Transaction rejected"
        );
        finish(txn, resolved.event_id, outcome).await
    }
}

/// Records a `BAD_REQUEST` decided inside the unit of work.
async fn bad_request(
    txn: &DatabaseTransaction,
    event_id: Option<WebhookEventId>,
    code: BadRequestCode,
    message: &str,
) -> Result<AuthorizationOutcome, AuthorizeError> {
    finish(txn, event_id, AuthorizationOutcome::bad_request(code, message)).await
}

/// Marks the event failed for a non-approved outcome and passes it through.
async fn finish(
    txn: &DatabaseTransaction,
    event_id: Option<WebhookEventId>,
    outcome: AuthorizationOutcome,
) -> Result<AuthorizationOutcome, AuthorizeError> {
    if let (Some(event_id), Some(code)) = (event_id, outcome.code()) {
        IdempotencyGate::mark_failed(txn, event_id, code).await?;
    }
    Ok(outcome)
}

fn transaction_record(
    resolved: &Resolved<'_>,
    id: FuelTransactionId,
    status: FuelTransactionStatus,
    decline_reason: Option<String>,
) -> NewFuelTransaction {
    let incoming = resolved.incoming;
    NewFuelTransaction {
        id,
        card_id: resolved.card.id,
        organization_id: resolved.card.organization_id,
        station_id: resolved.station_id,
        external_ref: incoming.external_ref.clone(),
        amount: incoming.amount,
        currency: incoming.currency.clone(),
        occurred_at: incoming.occurred_at,
        status,
        decline_reason,
        meta: serde_json::json!({
            "event_id": resolved.event_id,
            "station_code": incoming.station_code,
            "card_last4": incoming.card.last4,
        }),
    }
}
