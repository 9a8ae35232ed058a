//! Idempotency key header values.

use thiserror::Error;

/// Upper bound on key length.
pub const MAX_KEY_LEN: usize = 255;

/// The `x-idempotency-key` value is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Idempotency key must be 1 to {MAX_KEY_LEN} visible ASCII characters")]
pub struct InvalidIdempotencyKey;

/// A station-supplied idempotency key.
///
/// Surrounding whitespace is trimmed; the rest must be visible ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Parses an optional header value. A missing or blank header means the
    /// delivery carries no key and is never deduplicated.
    pub fn from_header(value: Option<&str>) -> Result<Option<Self>, InvalidIdempotencyKey> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(key) => key.parse().map(Some),
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for IdempotencyKey {
    type Err = InvalidIdempotencyKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if key.is_empty() || key.len() > MAX_KEY_LEN || !key.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(InvalidIdempotencyKey);
        }
        Ok(Self(key.to_string()))
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(IdempotencyKey::from_header(None), Ok(None));
        assert_eq!(IdempotencyKey::from_header(Some("   ")), Ok(None));
        let key = IdempotencyKey::from_header(Some(" evt-001 ")).unwrap().unwrap();
        assert_eq!(key.as_str(), "evt-001");
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert_eq!(IdempotencyKey::from_header(Some("two words")), Err(InvalidIdempotencyKey));
        assert!("ключ".parse::<IdempotencyKey>().is_err());
        assert!("k".repeat(MAX_KEY_LEN + 1).parse::<IdempotencyKey>().is_err());
        assert!("k".repeat(MAX_KEY_LEN).parse::<IdempotencyKey>().is_ok());
    }
}
