//! PAN normalization, hashing, and masking.
//!
//! The stored identifier is `sha256:` followed by the lowercase hex digest of
//! the PAN digits. Spaces and dashes are separators and are dropped before
//! hashing, so `4242 4242 4242 4242` and `4242424242424242` resolve to the
//! same card.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Prefix of every stored PAN hash.
pub const PAN_HASH_PREFIX: &str = "sha256:";

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 19;

/// Errors from PAN normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanError {
    /// Something other than digits, spaces, or dashes.
    #[error("Card number contains invalid characters")]
    InvalidCharacters,

    /// Too few or too many digits once separators are removed.
    #[error("Card number must have between {MIN_DIGITS} and {MAX_DIGITS} digits, got {0}")]
    InvalidLength(usize),
}

/// Hashed card identity derived from a raw PAN.
///
/// `Debug` is safe to log: it only ever holds the hash and the last four digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardCredentials {
    /// `sha256:<hex>` digest of the PAN digits.
    pub pan_hash: String,
    /// Last four digits.
    pub last4: String,
}

impl CardCredentials {
    /// Normalizes and hashes a raw PAN.
    pub fn from_pan(raw: &str) -> Result<Self, PanError> {
        let digits = normalize(raw)?;
        let last4 = digits[digits.len() - 4..].to_string();
        Ok(Self {
            pan_hash: digest(&digits),
            last4,
        })
    }
}

/// Returns the `sha256:`-prefixed hash of a PAN.
pub fn hash_card_number(raw: &str) -> Result<String, PanError> {
    normalize(raw).map(|digits| digest(&digits))
}

/// Masks all but the last four characters of a card number.
///
/// Used when a payload has to be persisted. Inputs of four characters or
/// fewer are masked completely.
#[must_use]
pub fn mask_card_number(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible = chars.len() - 4;
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

fn normalize(raw: &str) -> Result<String, PanError> {
    let mut digits = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' => {}
            _ => return Err(PanError::InvalidCharacters),
        }
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
        return Err(PanError::InvalidLength(digits.len()));
    }
    Ok(digits)
}

fn digest(digits: &str) -> String {
    let hash = Sha256::digest(digits.as_bytes());
    format!("{PAN_HASH_PREFIX}{}", hex::encode(hash))
}
