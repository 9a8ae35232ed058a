//! Money in integer minor units and ISO 4217 currency codes.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `i64` counts of the currency's smallest unit (e.g., cents);
//! `rust_decimal::Decimal` is only used to render major units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing money or currency codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Empty amount string.
    #[error("Amount is empty")]
    Empty,

    /// Amount contains something other than ASCII digits.
    #[error("Amount must contain digits only: {0}")]
    InvalidDigits(String),

    /// Amount does not fit into 64 bits.
    #[error("Amount is too large: {0}")]
    Overflow(String),

    /// Currency is not a three-letter code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// An amount of money in minor units.
///
/// Currency is carried separately (by the account or transaction row), the
/// engine never converts between currencies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero minor units.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Subtracts `other`, returning `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(diff) => Some(Self(diff)),
            None => None,
        }
    }

    /// Renders the amount in major units of `currency` (e.g., `1000.00`).
    #[must_use]
    pub fn to_major(self, currency: &CurrencyCode) -> Decimal {
        Decimal::new(self.0, currency.minor_unit_exponent())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a non-negative amount in minor units from a plain digit string,
/// the way stations send `amountCents`.
impl std::str::FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(MoneyError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::InvalidDigits(s.to_string()));
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| MoneyError::Overflow(s.to_string()))
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

/// ISO 4217 alphabetic currency code, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of decimal places of the currency's minor unit.
    #[must_use]
    pub fn minor_unit_exponent(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(Self(s.to_ascii_uppercase()))
        } else {
            Err(MoneyError::InvalidCurrency(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(100_000);
        let b = Money::from_minor(150_000);
        assert_eq!(a.checked_add(b), Some(Money::from_minor(250_000)));
        assert_eq!(a.checked_sub(b), Some(Money::from_minor(-50_000)));
        assert!(a.checked_sub(b).unwrap().is_negative());
        assert_eq!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)), None);
    }

    #[test]
    fn test_money_predicates() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
    }

    #[rstest]
    #[case("0", 0)]
    #[case("10000", 10_000)]
    #[case("5000000", 5_000_000)]
    #[case("0042", 42)]
    fn test_money_parse(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(input.parse::<Money>().unwrap(), Money::from_minor(expected));
    }

    #[rstest]
    #[case("", MoneyError::Empty)]
    #[case("-100", MoneyError::InvalidDigits("-100".into()))]
    #[case("10.50", MoneyError::InvalidDigits("10.50".into()))]
    #[case("1e5", MoneyError::InvalidDigits("1e5".into()))]
    #[case(" 100", MoneyError::InvalidDigits(" 100".into()))]
    #[case("99999999999999999999", MoneyError::Overflow("99999999999999999999".into()))]
    fn test_money_parse_errors(#[case] input: &str, #[case] expected: MoneyError) {
        assert_eq!(input.parse::<Money>().unwrap_err(), expected);
    }

    #[test]
    fn test_money_to_major() {
        let usd: CurrencyCode = "USD".parse().unwrap();
        let jpy: CurrencyCode = "JPY".parse().unwrap();
        let kwd: CurrencyCode = "KWD".parse().unwrap();
        assert_eq!(Money::from_minor(5_000_000).to_major(&usd), dec!(50000.00));
        assert_eq!(Money::from_minor(1500).to_major(&jpy), dec!(1500));
        assert_eq!(Money::from_minor(1500).to_major(&kwd), dec!(1.500));
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap().as_str(), "USD");
        assert_eq!("EUR".parse::<CurrencyCode>().unwrap().to_string(), "EUR");
        assert!("US".parse::<CurrencyCode>().is_err());
        assert!("USDX".parse::<CurrencyCode>().is_err());
        assert!("U5D".parse::<CurrencyCode>().is_err());
        assert!("".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_code_serde() {
        let code: CurrencyCode = serde_json::from_str("\"idr\"").unwrap();
        assert_eq!(code.as_str(), "IDR");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"IDR\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"dollars\"").is_err());
    }
}
