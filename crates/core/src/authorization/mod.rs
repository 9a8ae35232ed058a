//! Transaction authorization policy.
//!
//! - Inbound webhook payloads and their validation
//! - The closed set of authorization outcomes and their codes
//! - Pure authorization decisions (currency, card status, limits, balance)

pub mod incoming;
pub mod outcome;
pub mod service;

pub use incoming::{IncomingTransaction, InvalidTransaction, RawIncomingTransaction};
pub use outcome::{AuthorizationOutcome, BadRequestCode, DeclineCode};
pub use service::{AuthorizationService, Decline, Verdict};
