//! Database-backed services.
//!
//! These compose repositories into units of work; the decisions themselves
//! live in `fuelgate_core`.

pub mod authorizer;
pub mod limit_evaluator;
pub mod webhook;

pub use authorizer::{AuthorizeError, TransactionAuthorizer};
pub use limit_evaluator::{LimitEvaluation, LimitEvaluationError, LimitRuleEvaluator};
pub use webhook::WebhookService;
