//! Decimal money amounts.
//!
//! The backend sends prices as JSON numbers in a single store currency, so
//! `Money` carries no currency code. Arithmetic stays in `Decimal` to avoid
//! float drift when totals are recomputed from cart lines.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-currency-tagged monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a count of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply a unit price by a quantity, saturating at the decimal range.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Whether the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Self;

    /// Saturates at the decimal range.
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<u32> for Money {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

impl core::str::FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parse `"19.99"` or `"$19.99"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_prefix('$').unwrap_or(s).parse().map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_places() {
        assert_eq!(Money::from(30).to_string(), "$30.00");
        assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Money::from_cents(1050).times(2), Money::from(3).times(1)];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total, Money::from_cents(2400));
    }

    #[test]
    fn test_huge_totals_saturate() {
        let line = Money::from(Decimal::MAX).times(2);
        assert_eq!(line.amount(), Decimal::MAX);

        let total: Money = [line, line, Money::from(1)].into_iter().sum();
        assert_eq!(total.amount(), Decimal::MAX);
    }

    #[test]
    fn test_deserializes_json_numbers() {
        let price: Money = serde_json::from_str("10").unwrap();
        assert_eq!(price, Money::from(10));

        let price: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(price, Money::from_cents(1999));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::from(10)).unwrap();
        assert_eq!(json, "10.0");
    }

    #[test]
    fn test_parses_with_or_without_symbol() {
        assert_eq!("19.99".parse::<Money>().unwrap(), Money::from_cents(1999));
        assert_eq!(" $5 ".parse::<Money>().unwrap(), Money::from(5));
        assert!("five".parse::<Money>().is_err());
    }

    #[test]
    fn test_is_negative() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::ZERO.is_negative());
    }
}
