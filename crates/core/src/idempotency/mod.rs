//! Webhook delivery deduplication.
//!
//! Each `(station, idempotency key)` pair owns one webhook event. The event's
//! status decides whether a redelivery is processed again:
//!
//! ```text
//! received ──► processed   (terminal, redeliveries are DUPLICATE)
//!    │  ▲
//!    ▼  │
//!   failed                 (retryable)
//! ```

pub mod key;
pub mod state;

pub use key::{IdempotencyKey, InvalidIdempotencyKey};
pub use state::{GateDecision, IdempotencyError, WebhookEventStatus};
