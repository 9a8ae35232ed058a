//! Webhook event status machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Processing status of a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventStatus {
    /// Stored, not yet decided.
    Received,
    /// Authorization approved; terminal.
    Processed,
    /// Rejected or errored; a redelivery may try again.
    Failed,
}

/// Whether a delivery should be authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Authorize the delivery.
    Proceed,
    /// The key was already processed successfully.
    Duplicate,
}

/// Illegal status transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdempotencyError {
    /// A processed event can never change again.
    #[error("Webhook event already processed")]
    AlreadyProcessed,
}

impl WebhookEventStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }

    /// Returns true for the terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Gate decision for a delivery given the status of an existing event
    /// with the same key, if any.
    #[must_use]
    pub const fn gate(existing: Option<Self>) -> GateDecision {
        match existing {
            Some(Self::Processed) => GateDecision::Duplicate,
            Some(Self::Received | Self::Failed) | None => GateDecision::Proceed,
        }
    }

    /// Validates a status change.
    ///
    /// Anything may happen to a non-terminal event, including repeating its
    /// current status (a retry re-entering `received`, a second failure).
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` when leaving `processed`.
    pub const fn transition(self, next: Self) -> Result<Self, IdempotencyError> {
        if self.is_terminal() {
            Err(IdempotencyError::AlreadyProcessed)
        } else {
            Ok(next)
        }
    }
}

impl std::fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WebhookEventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown webhook event status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, GateDecision::Proceed)]
    #[case(Some(WebhookEventStatus::Received), GateDecision::Proceed)]
    #[case(Some(WebhookEventStatus::Failed), GateDecision::Proceed)]
    #[case(Some(WebhookEventStatus::Processed), GateDecision::Duplicate)]
    fn test_gate(#[case] existing: Option<WebhookEventStatus>, #[case] expected: GateDecision) {
        assert_eq!(WebhookEventStatus::gate(existing), expected);
    }

    #[rstest]
    #[case(WebhookEventStatus::Received, WebhookEventStatus::Processed)]
    #[case(WebhookEventStatus::Received, WebhookEventStatus::Failed)]
    #[case(WebhookEventStatus::Failed, WebhookEventStatus::Received)]
    #[case(WebhookEventStatus::Failed, WebhookEventStatus::Processed)]
    #[case(WebhookEventStatus::Failed, WebhookEventStatus::Failed)]
    fn test_allowed_transitions(#[case] from: WebhookEventStatus, #[case] to: WebhookEventStatus) {
        assert_eq!(from.transition(to), Ok(to));
    }

    #[rstest]
    #[case(WebhookEventStatus::Received)]
    #[case(WebhookEventStatus::Processed)]
    #[case(WebhookEventStatus::Failed)]
    fn test_processed_is_terminal(#[case] to: WebhookEventStatus) {
        assert_eq!(
            WebhookEventStatus::Processed.transition(to),
            Err(IdempotencyError::AlreadyProcessed)
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("failed".parse::<WebhookEventStatus>().unwrap(), WebhookEventStatus::Failed);
        assert!("done".parse::<WebhookEventStatus>().is_err());
    }
}
