//! # Quantity Module
//!
//! Fixed-point decimal quantities for stock levels and cart lines.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stock is a decimal: 2 bottles, 1.5 kg of rice, 0.25 m of cable.       │
//! │                                                                         │
//! │  Stored as INTEGER thousandths ("milli-units"):                         │
//! │                                                                         │
//! │     2      → 2000                                                       │
//! │     1.5    → 1500                                                       │
//! │     0.25   → 250                                                        │
//! │                                                                         │
//! │  `stock = stock - qty` in SQL stays exact, and `stock >= 0` holds       │
//! │  without epsilon comparisons.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the wire a quantity is a JSON number (`1.5`). Integers, floats and
//! numeric strings are accepted on input.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Number of stored units per whole unit.
pub const MILLI_PER_UNIT: i64 = 1000;

/// Number of fractional digits a quantity can carry.
pub const QUANTITY_SCALE: u32 = 3;

/// A decimal quantity with three fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(#[ts(type = "number")] i64);

impl Quantity {
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Converts a float, rounding to the nearest thousandth.
    ///
    /// Returns `None` for NaN, infinities and values out of range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let milli = (value * MILLI_PER_UNIT as f64).round();
        if milli.abs() > i64::MAX as f64 / 2.0 {
            return None;
        }
        Some(Quantity(milli as i64))
    }

    /// Returns the raw thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Lossy conversion for display and JSON output.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MILLI_PER_UNIT as f64
    }
}

impl fmt::Display for Quantity {
    /// Prints the shortest exact decimal: `2`, `1.5`, `0.125`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MILLI_PER_UNIT as u64;
        let frac = abs % MILLI_PER_UNIT as u64;
        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    /// Parses `"2"`, `"1.5"`, `"-0.25"`. More than three fractional digits
    /// is an error rather than a silent rounding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "qty".to_string(),
            reason: reason.to_string(),
        };

        // plain decimals only: no exponents, no digit separators
        let s = s.trim();
        if !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+')) {
            return Err(invalid("must be a number"));
        }
        let value = Decimal::from_str_exact(s).map_err(|_| invalid("must be a number"))?;

        if value.normalize().scale() > QUANTITY_SCALE {
            return Err(invalid("at most 3 decimal places"));
        }

        value
            .checked_mul(Decimal::from(MILLI_PER_UNIT))
            .and_then(|milli| milli.to_i64())
            .map(Quantity)
            .ok_or_else(|| invalid("too large"))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MILLI_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / MILLI_PER_UNIT)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal quantity with at most 3 fractional digits")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        v.checked_mul(MILLI_PER_UNIT)
            .map(Quantity)
            .ok_or_else(|| E::custom("quantity out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        i64::try_from(v)
            .map_err(|_| E::custom("quantity out of range"))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        Quantity::from_f64(v).ok_or_else(|| E::custom("quantity out of range"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("2".parse::<Quantity>().unwrap(), Quantity::from_units(2));
        assert_eq!("1.5".parse::<Quantity>().unwrap(), Quantity::from_milli(1500));
        assert_eq!("0.125".parse::<Quantity>().unwrap(), Quantity::from_milli(125));
        assert_eq!(".5".parse::<Quantity>().unwrap(), Quantity::from_milli(500));
        assert_eq!("-0.25".parse::<Quantity>().unwrap(), Quantity::from_milli(-250));

        assert!("".parse::<Quantity>().is_err());
        assert!("abc".parse::<Quantity>().is_err());
        assert!("1.2345".parse::<Quantity>().is_err());
        assert!("1,5".parse::<Quantity>().is_err());
        assert!("1e3".parse::<Quantity>().is_err());
        assert!("1_000".parse::<Quantity>().is_err());
        assert!("1.2.3".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_parse_edges() {
        // trailing zeros carry no extra precision
        assert_eq!("1.5000".parse::<Quantity>().unwrap(), Quantity::from_milli(1500));
        assert_eq!(" 4 ".parse::<Quantity>().unwrap(), Quantity::from_units(4));

        let err = "99999999999999999999".parse::<Quantity>().unwrap_err();
        assert!(err.to_string().contains("too large"));
        let err = "0.0001".parse::<Quantity>().unwrap_err();
        assert!(err.to_string().contains("3 decimal places"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::from_units(2).to_string(), "2");
        assert_eq!(Quantity::from_milli(1500).to_string(), "1.5");
        assert_eq!(Quantity::from_milli(125).to_string(), "0.125");
        assert_eq!(Quantity::from_milli(-250).to_string(), "-0.25");
    }

    #[test]
    fn test_json_accepts_numbers_and_strings() {
        let q: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(q, Quantity::from_units(3));
        let q: Quantity = serde_json::from_str("0.75").unwrap();
        assert_eq!(q, Quantity::from_milli(750));
        let q: Quantity = serde_json::from_str("\"1.5\"").unwrap();
        assert_eq!(q, Quantity::from_milli(1500));
        assert!(serde_json::from_str::<Quantity>("true").is_err());
    }

    #[test]
    fn test_json_output() {
        assert_eq!(serde_json::to_string(&Quantity::from_units(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&Quantity::from_milli(1500)).unwrap(), "1.5");
    }

    #[test]
    fn test_sum() {
        let total: Quantity = [Quantity::from_units(1), Quantity::from_milli(500)]
            .into_iter()
            .sum();
        assert_eq!(total, Quantity::from_milli(1500));
    }
}
