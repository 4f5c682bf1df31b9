//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The REST backend speaks JSON numbers:                                  │
//! │    { "price": 59.99, "quantity": 3 }                                    │
//! │                                                                         │
//! │  Summing floats for a sale total drifts:                                │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    59.99 on the wire ──► Money(5999) in memory ──► 59.99 on the wire    │
//! │    All arithmetic happens on i64 cents                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//! assert_eq!(doubled.to_string(), "21.98");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Wire Format
/// Serialized as a JSON number of major units: `Money(5999)` ↔ `59.99`,
/// `Money(6000)` ↔ `60`. Whole amounts are written as integers so exported
/// CSV text matches what the backend sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use stockbook_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal amount received from the backend.
    ///
    /// Rounds to the nearest cent; this is the only place a float enters.
    pub fn from_major(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as decimal major units (for the wire only).
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a line-item quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies by a line-item quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows a plain decimal amount ("59.99", "-5.50").
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Parses user input such as `"59.99"`, `"60"` or `"0.5"`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let amount: f64 = trimmed.parse().map_err(|_| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("'{}' is not a number", trimmed),
        })?;

        if !amount.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "price".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        Ok(Money::from_major(amount))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| Money(acc.0.saturating_add(m.0)))
    }
}

// =============================================================================
// Serde (decimal number on the wire)
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_major())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(v * 100))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map(|v| Money(v * 100))
            .map_err(|_| E::custom("amount out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_major(v))
    }

    // Form payloads echoed back by the backend sometimes carry strings.
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(59.99).cents(), 5999);
        assert_eq!(Money::from_major(0.1 + 0.2).cents(), 30);
        assert_eq!(Money::from_major(-5.5).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((b * 3).cents(), 750);
        assert_eq!(b.multiply_quantity(4).cents(), 1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 1500);
    }

    #[test]
    fn test_quantity_overflow() {
        let price = Money::from_cents(1000);
        assert_eq!(price.checked_multiply_quantity(3), Some(Money::from_cents(3000)));
        assert_eq!(price.checked_multiply_quantity(i64::MAX), None);
        assert_eq!(price.multiply_quantity(i64::MAX).cents(), i64::MAX);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(price), None);

        let total: Money = vec![Money::from_cents(i64::MAX), price].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!("59.99".parse::<Money>().unwrap().cents(), 5999);
        assert_eq!(" 60 ".parse::<Money>().unwrap().cents(), 6000);
        assert!("abc".parse::<Money>().is_err());
        assert!("NaN".parse::<Money>().is_err());
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&Money::from_cents(5999)).unwrap(), "59.99");
        assert_eq!(serde_json::to_string(&Money::from_cents(6000)).unwrap(), "60");

        let m: Money = serde_json::from_str("59.99").unwrap();
        assert_eq!(m.cents(), 5999);
        let m: Money = serde_json::from_str("12").unwrap();
        assert_eq!(m.cents(), 1200);
        let m: Money = serde_json::from_str("\"7.5\"").unwrap();
        assert_eq!(m.cents(), 750);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
    }
}
