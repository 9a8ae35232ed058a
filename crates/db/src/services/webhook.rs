//! Webhook intake: validation, station resolution, and the idempotency gate
//! in front of the authorizer.

use fuelgate_core::authorization::{
    AuthorizationOutcome, BadRequestCode, IncomingTransaction, RawIncomingTransaction,
};
use fuelgate_core::idempotency::{GateDecision, IdempotencyKey};
use fuelgate_shared::types::StationId;
use fuelgate_shared::{AppConfig, AuthorizationConfig};
use sea_orm::DatabaseConnection;

use crate::repositories::{IdempotencyGate, StationRepository};

use super::authorizer::TransactionAuthorizer;

/// Entry point for station webhooks.
#[derive(Clone)]
pub struct WebhookService {
    stations: StationRepository,
    gate: IdempotencyGate,
    authorizer: TransactionAuthorizer,
    config: AuthorizationConfig,
}

impl WebhookService {
    /// Wires the service from application configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            stations: StationRepository::new(db.clone(), &config.cache),
            gate: IdempotencyGate::new(db.clone()),
            authorizer: TransactionAuthorizer::new(
                db,
                config.authorization,
                config.database.lock_timeout_ms,
            ),
            config: config.authorization,
        }
    }

    /// Handles one delivery.
    ///
    /// Payloads that fail validation are answered without being stored.
    /// Everything else is recorded as a webhook event (PAN masked) before it
    /// reaches the authorizer.
    pub async fn handle(
        &self,
        raw: &RawIncomingTransaction,
        idempotency_header: Option<&str>,
    ) -> AuthorizationOutcome {
        let key = match IdempotencyKey::from_header(idempotency_header) {
            Ok(key) => key,
            Err(err) => {
                return AuthorizationOutcome::bad_request(
                    BadRequestCode::InvalidIdempotencyKey,
                    err.to_string(),
                );
            }
        };

        let incoming = match IncomingTransaction::parse(raw) {
            Ok(incoming) => incoming,
            Err(invalid) => {
                tracing::warn!(code = %invalid.code, payload = ?raw, "Rejected invalid webhook payload");
                return invalid.into();
            }
        };

        let station = match self
            .stations
            .resolve(&incoming.station_code, self.config.unknown_station)
            .await
        {
            Ok(Some(station)) => station,
            Ok(None) => {
                tracing::warn!(station_code = %incoming.station_code, "Unknown station rejected");
                return AuthorizationOutcome::bad_request(
                    BadRequestCode::StationInvalid,
                    format!("Unknown station: {}", incoming.station_code),
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "Station lookup failed");
                return AuthorizationOutcome::internal_error();
            }
        };
        let station_id = StationId::from_uuid(station.id);

        let registration = match self
            .gate
            .register(Some(station_id), key.as_ref(), raw.redacted_payload())
            .await
        {
            Ok(registration) => registration,
            Err(err) => {
                tracing::error!(error = %err, "Failed to record webhook event");
                return AuthorizationOutcome::internal_error();
            }
        };

        if registration.decision == GateDecision::Duplicate {
            tracing::info!(
                event_id = %registration.event_id,
                code = "DUPLICATE",
                "Duplicate webhook delivery"
            );
            return AuthorizationOutcome::Duplicate;
        }

        self.authorizer
            .authorize(Some(registration.event_id), Some(station_id), &incoming)
            .await
    }
}
