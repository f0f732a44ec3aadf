//! Type-safe price representation using decimal arithmetic.
//!
//! The shop is single-currency; prices come from the remote API as decimal
//! amounts and are never computed with floats on the client.

use core::fmt;
use std::iter::Sum;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input could not be parsed as a decimal number.
    #[error("not a valid amount: {0}")]
    Invalid(String),
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A unit price or price total.
///
/// Wraps a non-negative `Decimal`. Construction from untrusted input goes
/// through [`Price::parse`]; values deserialized from the API are trusted
/// as-is, since the server is the pricing authority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a raw decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a price from a user-entered string (e.g. an admin form field).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Price::parse("4.50").unwrap().to_string(), "$4.50");
        assert_eq!(Price::parse(" 10 ").unwrap().to_string(), "$10.00");
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
        assert!(matches!(Price::parse(""), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Price::parse("-1.00"), Err(PriceError::Negative));
    }

    #[test]
    fn test_times() {
        let unit = Price::parse("2.25").unwrap();
        assert_eq!(unit.times(4).to_string(), "$9.00");
        assert_eq!(unit.times(0), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::parse("10").unwrap().times(2), Price::parse("5").unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "$25.00");
    }

    #[test]
    fn test_serde_accepts_number_and_string() {
        let from_number: Price = serde_json::from_str("4.5").unwrap();
        let from_string: Price = serde_json::from_str("\"4.5\"").unwrap();
        assert_eq!(from_number, from_string);
    }
}
