//! Inbound webhook payloads.
//!
//! [`RawIncomingTransaction`] is the JSON body exactly as a station sends it.
//! [`IncomingTransaction`] is the validated form the authorizer works with:
//! the PAN is hashed and dropped, the amount is integer minor units, and the
//! timestamp is UTC.

use chrono::{DateTime, Utc};
use fuelgate_shared::types::{CurrencyCode, Money};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::outcome::{AuthorizationOutcome, BadRequestCode};
use crate::card::{CardCredentials, mask_card_number};

/// Webhook body as received.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawIncomingTransaction {
    /// Station code, e.g. `STN-001`.
    #[validate(length(min = 1, max = 64))]
    pub station_code: String,
    /// Raw PAN.
    #[validate(length(min = 8, max = 32))]
    pub card_number: String,
    /// Amount in minor units as a decimal string.
    #[validate(length(min = 1, max = 19))]
    pub amount_cents: String,
    /// ISO 4217 code.
    pub currency: String,
    /// RFC 3339 timestamp of the purchase.
    pub occurred_at: String,
    /// Station or acquirer reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
}

impl std::fmt::Debug for RawIncomingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawIncomingTransaction")
            .field("station_code", &self.station_code)
            .field("card_number", &mask_card_number(&self.card_number))
            .field("amount_cents", &self.amount_cents)
            .field("currency", &self.currency)
            .field("occurred_at", &self.occurred_at)
            .field("external_ref", &self.external_ref)
            .finish()
    }
}

impl RawIncomingTransaction {
    /// JSON copy of the payload safe to persist: the PAN is masked.
    #[must_use]
    pub fn redacted_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "stationCode": self.station_code,
            "cardNumber": mask_card_number(&self.card_number),
            "amountCents": self.amount_cents,
            "currency": self.currency,
            "occurredAt": self.occurred_at,
        });
        if let Some(external_ref) = &self.external_ref {
            payload["externalRef"] = serde_json::Value::String(external_ref.clone());
        }
        payload
    }
}

/// A payload that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransaction {
    /// Which check failed.
    pub code: BadRequestCode,
    /// Detail for the caller.
    pub message: String,
}

impl InvalidTransaction {
    fn new(code: BadRequestCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<InvalidTransaction> for AuthorizationOutcome {
    fn from(err: InvalidTransaction) -> Self {
        Self::BadRequest {
            code: err.code,
            message: err.message,
        }
    }
}

/// A validated purchase event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingTransaction {
    /// Station code.
    pub station_code: String,
    /// Hashed card identity.
    pub card: CardCredentials,
    /// Positive amount in minor units.
    pub amount: Money,
    /// Upper-cased currency code.
    pub currency: CurrencyCode,
    /// When the purchase happened, in UTC.
    pub occurred_at: DateTime<Utc>,
    /// Station or acquirer reference.
    pub external_ref: Option<String>,
}

impl IncomingTransaction {
    /// Validates a raw payload.
    ///
    /// Shape errors are reported as `INVALID_PAYLOAD`; the amount, currency,
    /// and timestamp each have their own code.
    pub fn parse(raw: &RawIncomingTransaction) -> Result<Self, InvalidTransaction> {
        raw.validate().map_err(|errors| {
            InvalidTransaction::new(BadRequestCode::InvalidPayload, format!("Invalid payload: {errors}"))
        })?;

        let amount: Money = raw.amount_cents.parse().map_err(|_| {
            InvalidTransaction::new(
                BadRequestCode::InvalidAmount,
                "amountCents must be a positive integer string",
            )
        })?;
        if !amount.is_positive() {
            return Err(InvalidTransaction::new(
                BadRequestCode::InvalidAmount,
                "amountCents must be greater than zero",
            ));
        }

        let currency: CurrencyCode = raw.currency.parse().map_err(|_| {
            InvalidTransaction::new(
                BadRequestCode::InvalidCurrency,
                "currency must be a three-letter ISO code",
            )
        })?;

        let occurred_at = DateTime::parse_from_rfc3339(&raw.occurred_at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| {
                InvalidTransaction::new(
                    BadRequestCode::InvalidTimestamp,
                    "occurredAt must be an RFC 3339 timestamp",
                )
            })?;

        let card = CardCredentials::from_pan(&raw.card_number).map_err(|err| {
            InvalidTransaction::new(BadRequestCode::InvalidPayload, format!("cardNumber: {err}"))
        })?;

        Ok(Self {
            station_code: raw.station_code.trim().to_string(),
            card,
            amount,
            currency,
            occurred_at,
            external_ref: raw.external_ref.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn raw() -> RawIncomingTransaction {
        serde_json::from_value(serde_json::json!({
            "stationCode": "STN-001",
            "cardNumber": "4242424242424242",
            "amountCents": "10000",
            "currency": "usd",
            "occurredAt": "2025-09-03T10:00:00Z",
            "externalRef": "RRN-123456"
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_valid_payload() {
        let tx = IncomingTransaction::parse(&raw()).unwrap();
        assert_eq!(tx.station_code, "STN-001");
        assert_eq!(tx.amount, Money::from_minor(10_000));
        assert_eq!(tx.currency.as_str(), "USD");
        assert_eq!(tx.occurred_at, Utc.with_ymd_and_hms(2025, 9, 3, 10, 0, 0).unwrap());
        assert_eq!(tx.card.last4, "4242");
        assert!(tx.card.pan_hash.starts_with("sha256:"));
        assert_eq!(tx.external_ref.as_deref(), Some("RRN-123456"));
    }

    #[test]
    fn test_offset_timestamps_are_normalized_to_utc() {
        let mut payload = raw();
        payload.occurred_at = "2025-09-03T23:30:00-02:00".into();
        let tx = IncomingTransaction::parse(&payload).unwrap();
        assert_eq!(tx.occurred_at, Utc.with_ymd_and_hms(2025, 9, 4, 1, 30, 0).unwrap());
    }

    #[rstest]
    #[case::zero_amount("amountCents", "0", BadRequestCode::InvalidAmount)]
    #[case::negative_amount("amountCents", "-5", BadRequestCode::InvalidAmount)]
    #[case::decimal_amount("amountCents", "10.50", BadRequestCode::InvalidAmount)]
    #[case::long_currency("currency", "USDT", BadRequestCode::InvalidCurrency)]
    #[case::numeric_currency("currency", "840", BadRequestCode::InvalidCurrency)]
    #[case::bad_timestamp("occurredAt", "yesterday", BadRequestCode::InvalidTimestamp)]
    #[case::date_only("occurredAt", "2025-09-03", BadRequestCode::InvalidTimestamp)]
    #[case::short_pan("cardNumber", "4242", BadRequestCode::InvalidPayload)]
    #[case::letters_in_pan("cardNumber", "4242abcd42424242", BadRequestCode::InvalidPayload)]
    #[case::empty_station("stationCode", "", BadRequestCode::InvalidPayload)]
    fn test_parse_rejects(#[case] field: &str, #[case] value: &str, #[case] code: BadRequestCode) {
        let mut json = serde_json::to_value(raw()).unwrap();
        json[field] = serde_json::Value::String(value.to_string());
        let payload: RawIncomingTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(IncomingTransaction::parse(&payload).unwrap_err().code, code);
    }

    #[test]
    fn test_debug_and_payload_mask_pan() {
        let payload = raw();
        let debug = format!("{payload:?}");
        assert!(!debug.contains("4242424242424242"));
        assert!(debug.contains("************4242"));

        let stored = payload.redacted_payload();
        assert_eq!(stored["cardNumber"], "************4242");
        assert_eq!(stored["externalRef"], "RRN-123456");
        assert!(!stored.to_string().contains("4242424242424242"));
    }

    #[test]
    fn test_invalid_transaction_into_outcome() {
        let outcome: AuthorizationOutcome =
            InvalidTransaction::new(BadRequestCode::InvalidAmount, "bad").into();
        assert_eq!(outcome.code(), Some("INVALID_AMOUNT"));
    }
}
