//! Response envelope.
//!
//! Every webhook answer has the shape `{ data, message, error }`:
//! approvals carry `data`, everything else carries `error.code`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fuelgate_core::authorization::{AuthorizationOutcome, BadRequestCode};
use fuelgate_shared::AppError;
use serde::Serialize;
use serde_json::json;

/// Machine-readable error part of the envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Outcome or validation code, e.g. `DAILY_LIMIT_EXCEEDED`.
    pub code: &'static str,
}

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope {
    /// Payload on success.
    pub data: Option<serde_json::Value>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Error code on failure.
    pub error: Option<ErrorBody>,
}

impl Envelope {
    /// Envelope for an error response.
    #[must_use]
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            error: Some(ErrorBody { code }),
        }
    }
}

/// An authorization outcome rendered as an HTTP response.
#[derive(Debug)]
pub struct WebhookResponse(pub AuthorizationOutcome);

/// HTTP status for an outcome.
///
/// Infrastructure failures answer 503 so stations retry; every other
/// `BAD_REQUEST` is 400.
#[must_use]
pub const fn status_for(outcome: &AuthorizationOutcome) -> StatusCode {
    match outcome {
        AuthorizationOutcome::Approved { .. } => StatusCode::OK,
        AuthorizationOutcome::Duplicate => StatusCode::CONFLICT,
        AuthorizationOutcome::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AuthorizationOutcome::BadRequest {
            code: BadRequestCode::InternalError | BadRequestCode::LockTimeout,
            ..
        } => StatusCode::SERVICE_UNAVAILABLE,
        AuthorizationOutcome::BadRequest { .. } => StatusCode::BAD_REQUEST,
    }
}

impl From<&AuthorizationOutcome> for Envelope {
    fn from(outcome: &AuthorizationOutcome) -> Self {
        match outcome {
            AuthorizationOutcome::Approved { transaction_id } => Self {
                data: Some(json!({
                    "status": "approved",
                    "transactionId": transaction_id,
                })),
                message: Some("Approved".to_string()),
                error: None,
            },
            AuthorizationOutcome::Duplicate => {
                Self::error("DUPLICATE", "Duplicate webhook (idempotency key)")
            }
            AuthorizationOutcome::BadRequest { code, message } => {
                Self::error(code.as_str(), message.clone())
            }
            AuthorizationOutcome::Rejected { code, message } => {
                Self::error(code.as_str(), message.clone())
            }
        }
    }
}

/// An application fault rendered as an HTTP response.
#[derive(Debug)]
pub struct ErrorResponse(pub AppError);

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(Envelope::error(self.0.error_code(), self.0.to_string()))).into_response()
    }
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        (status_for(&self.0), Json(Envelope::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelgate_core::authorization::DeclineCode;
    use fuelgate_core::limits::PeriodType;
    use fuelgate_shared::types::FuelTransactionId;
    use rstest::rstest;

    #[rstest]
    #[case(AuthorizationOutcome::Duplicate, StatusCode::CONFLICT)]
    #[case(
        AuthorizationOutcome::rejected(DeclineCode::CardBlocked, "Card is blocked"),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(
        AuthorizationOutcome::rejected(DeclineCode::LimitExceeded(PeriodType::Daily), "limit"),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(
        AuthorizationOutcome::bad_request(BadRequestCode::CardNotFound, "Card not found"),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        AuthorizationOutcome::bad_request(BadRequestCode::StationInvalid, "Unknown station"),
        StatusCode::BAD_REQUEST
    )]
    #[case(AuthorizationOutcome::internal_error(), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(AuthorizationOutcome::lock_timeout(), StatusCode::SERVICE_UNAVAILABLE)]
    fn test_status_for(#[case] outcome: AuthorizationOutcome, #[case] expected: StatusCode) {
        assert_eq!(status_for(&outcome), expected);
    }

    #[test]
    fn test_approved_envelope() {
        let transaction_id = FuelTransactionId::new();
        let outcome = AuthorizationOutcome::Approved { transaction_id };
        assert_eq!(status_for(&outcome), StatusCode::OK);

        let body = serde_json::to_value(Envelope::from(&outcome)).unwrap();
        assert_eq!(body["data"]["status"], "approved");
        assert_eq!(body["data"]["transactionId"], transaction_id.to_string());
        assert_eq!(body["message"], "Approved");
        assert!(body["error"].is_null());
    }

    #[test]
    fn test_rejected_envelope() {
        let outcome = AuthorizationOutcome::rejected(
            DeclineCode::InsufficientFunds,
            "Insufficient funds: available 5000, requested 10000",
        );
        let body = serde_json::to_value(Envelope::from(&outcome)).unwrap();
        assert!(body["data"].is_null());
        assert_eq!(body["error"]["code"], "INSUFFICIENT_FUNDS");
        assert_eq!(
            body["message"],
            "Insufficient funds: available 5000, requested 10000"
        );
    }

    #[test]
    fn test_app_error_response_status() {
        let response =
            ErrorResponse(AppError::Unavailable("database ping failed".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_duplicate_envelope() {
        let body = serde_json::to_value(Envelope::from(&AuthorizationOutcome::Duplicate)).unwrap();
        assert_eq!(body["error"]["code"], "DUPLICATE");
        assert_eq!(body["message"], "Duplicate webhook (idempotency key)");
    }
}
