//! Authorization outcomes.
//!
//! Every webhook delivery ends in exactly one of these. Business declines and
//! validation failures are values, not errors.

use fuelgate_shared::types::FuelTransactionId;

use crate::idempotency::WebhookEventStatus;
use crate::limits::PeriodType;

/// Codes for `BAD_REQUEST` outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadRequestCode {
    /// Body is malformed or a field fails shape validation.
    InvalidPayload,
    /// `amountCents` is not a positive integer.
    InvalidAmount,
    /// `currency` is not a three-letter code.
    InvalidCurrency,
    /// `occurredAt` is not an RFC 3339 timestamp.
    InvalidTimestamp,
    /// `x-idempotency-key` header is unusable.
    InvalidIdempotencyKey,
    /// Station code is unknown and registration is disabled.
    StationInvalid,
    /// No card matches the PAN.
    CardNotFound,
    /// The card's organization does not exist.
    OrganizationNotFound,
    /// The organization has no prepaid account.
    AccountNotFound,
    /// Transaction currency differs from the organization's.
    CurrencyMismatch,
    /// A row lock could not be acquired in time.
    LockTimeout,
    /// Unexpected failure; details only in logs.
    InternalError,
}

impl BadRequestCode {
    /// Returns the wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidCurrency => "INVALID_CURRENCY",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::InvalidIdempotencyKey => "INVALID_IDEMPOTENCY_KEY",
            Self::StationInvalid => "STATION_INVALID",
            Self::CardNotFound => "CARD_NOT_FOUND",
            Self::OrganizationNotFound => "ORGANIZATION_NOT_FOUND",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::CurrencyMismatch => "CURRENCY_MISMATCH",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Infrastructure failures: the same delivery may succeed later.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::LockTimeout | Self::InternalError)
    }
}

impl std::fmt::Display for BadRequestCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codes for `REJECTED` outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclineCode {
    /// The card is blocked.
    CardBlocked,
    /// A limit of the given period would be exceeded.
    LimitExceeded(PeriodType),
    /// The organization's balance does not cover the amount.
    InsufficientFunds,
}

impl DeclineCode {
    /// Returns the wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CardBlocked => "CARD_BLOCKED",
            Self::LimitExceeded(PeriodType::Daily) => "DAILY_LIMIT_EXCEEDED",
            Self::LimitExceeded(PeriodType::Weekly) => "WEEKLY_LIMIT_EXCEEDED",
            Self::LimitExceeded(PeriodType::Monthly) => "MONTHLY_LIMIT_EXCEEDED",
            Self::LimitExceeded(PeriodType::Custom) => "CUSTOM_LIMIT_EXCEEDED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
        }
    }
}

impl std::fmt::Display for DeclineCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of authorizing one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// The idempotency key was already processed successfully.
    Duplicate,
    /// The delivery could not be evaluated.
    BadRequest {
        /// Reason code.
        code: BadRequestCode,
        /// Human-readable message.
        message: String,
    },
    /// The transaction was evaluated and declined.
    Rejected {
        /// Decline code.
        code: DeclineCode,
        /// Human-readable message.
        message: String,
    },
    /// The transaction was approved and the balance debited.
    Approved {
        /// Persisted fuel transaction.
        transaction_id: FuelTransactionId,
    },
}

impl AuthorizationOutcome {
    /// Builds a `BAD_REQUEST` outcome.
    pub fn bad_request(code: BadRequestCode, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// Builds a `REJECTED` outcome.
    pub fn rejected(code: DeclineCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Generic internal error; the cause is logged, never returned.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::bad_request(BadRequestCode::InternalError, "Internal error, please retry")
    }

    /// Lock wait exceeded the configured timeout.
    #[must_use]
    pub fn lock_timeout() -> Self {
        Self::bad_request(BadRequestCode::LockTimeout, "Timed out waiting for a lock, please retry")
    }

    /// Outcome kind: `DUPLICATE`, `BAD_REQUEST`, `REJECTED`, or `APPROVED`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Rejected { .. } => "REJECTED",
            Self::Approved { .. } => "APPROVED",
        }
    }

    /// Reason code, if the outcome carries one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::BadRequest { code, .. } => Some(code.as_str()),
            Self::Rejected { code, .. } => Some(code.as_str()),
            Self::Duplicate | Self::Approved { .. } => None,
        }
    }

    /// Message, if the outcome carries one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::BadRequest { message, .. } | Self::Rejected { message, .. } => Some(message),
            Self::Duplicate | Self::Approved { .. } => None,
        }
    }

    /// Returns true for approvals.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// Status the webhook event ends in. Duplicates leave the event alone.
    #[must_use]
    pub const fn event_status(&self) -> Option<WebhookEventStatus> {
        match self {
            Self::Duplicate => None,
            Self::Approved { .. } => Some(WebhookEventStatus::Processed),
            Self::BadRequest { .. } | Self::Rejected { .. } => Some(WebhookEventStatus::Failed),
        }
    }
}
