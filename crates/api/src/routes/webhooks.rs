//! Station webhook routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use fuelgate_core::authorization::{BadRequestCode, RawIncomingTransaction};
use tracing::warn;

use crate::AppState;
use crate::response::{Envelope, WebhookResponse};

/// Header carrying the station's idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

/// Creates the webhook router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/transactions", post(receive_transaction))
}

/// POST /webhooks/transactions - Authorize a fuel purchase.
async fn receive_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RawIncomingTransaction>, JsonRejection>,
) -> Response {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(Envelope::error(
                    BadRequestCode::InvalidPayload.as_str(),
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    let idempotency_key = match headers.get(IDEMPOTENCY_HEADER).map(|value| value.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(Envelope::error(
                    BadRequestCode::InvalidIdempotencyKey.as_str(),
                    "x-idempotency-key must be visible ASCII",
                )),
            )
                .into_response();
        }
    };

    WebhookResponse(state.webhooks.handle(&raw, idempotency_key).await).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::test_support::app;

    async fn post(body: &str, key: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/transactions")
            .header("content-type", "application/json");
        if let Some(key) = key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }
        let response = app()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn payload(amount: &str) -> String {
        serde_json::json!({
            "stationCode": "STN-001",
            "cardNumber": "4242424242424242",
            "amountCents": amount,
            "currency": "USD",
            "occurredAt": "2025-09-03T10:00:00Z",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_payload() {
        let (status, body) = post("{not json", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PAYLOAD");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_missing_field_is_invalid_payload() {
        let (status, body) = post(r#"{"stationCode":"STN-001"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PAYLOAD");
    }

    #[tokio::test]
    async fn test_invalid_amount() {
        let (status, body) = post(&payload("12.50"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_AMOUNT");
    }

    #[tokio::test]
    async fn test_invalid_idempotency_key() {
        let (status, body) = post(&payload("10000"), Some("has spaces inside")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_IDEMPOTENCY_KEY");
    }
}
