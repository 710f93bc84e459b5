//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A checkout compares  Σ(qty × price) − discount  against  grand_total   │
//! │  and  cash − grand_total  against  change. With floats those equalities │
//! │  drift. With integer cents they hold exactly.                           │
//! │                                                                         │
//! │  Every amount (price, sell price, cash, change, discount, profit) is    │
//! │  a Money stored as INTEGER cents in SQLite.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::quantity::Quantity;
//!
//! let price = Money::from_cents(1000); // 10.00
//! let line = price.checked_times(Quantity::from_units(2)).unwrap();
//! assert_eq!(line.cents(), 2000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::quantity::{Quantity, MILLI_PER_UNIT};
use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.sell_price ──► CartLine.price (frozen) ──► OrderLine.price     │
/// │                                                                         │
/// │  Σ line totals ──► subtotal ──► − discount ──► grand_total             │
/// │                                                   │                     │
/// │                                     cash − grand_total ──► change       │
/// │                                                                         │
/// │  (Product.sell_price − Product.price) × qty ──► ProfitEntry.total       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole and fractional parts.
    ///
    /// `from_major_minor(10, 50)` is 10.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        Money(major * 100 + minor)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a fixed-point quantity.
    ///
    /// ## Rounding
    /// `cents × milli / 1000`, rounded half away from zero. Whole
    /// quantities are always exact.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::quantity::Quantity;
    ///
    /// let price = Money::from_cents(299);
    /// assert_eq!(price.checked_times(Quantity::from_units(3)).unwrap().cents(), 897);
    /// // 1.5 × 2.99 = 4.485 → 4.49
    /// assert_eq!(price.checked_times(Quantity::from_milli(1500)).unwrap().cents(), 449);
    /// assert!(Money::from_cents(i64::MAX).checked_times(Quantity::from_units(2)).is_none());
    /// ```
    ///
    /// `None` when the result doesn't fit in `i64` cents.
    pub fn checked_times(&self, qty: Quantity) -> Option<Money> {
        let product = self.0 as i128 * qty.milli() as i128;
        i64::try_from(div_round(product, MILLI_PER_UNIT as i128))
            .ok()
            .map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Returns the discount amount for a percentage rate.
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`, the +5000 rounds
    /// half up.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::DiscountRate;
    ///
    /// let subtotal = Money::from_cents(2500);
    /// let rate = DiscountRate::from_bps(1000); // 10%
    /// assert_eq!(subtotal.discount_amount(rate).cents(), 250);
    /// ```
    ///
    /// Never larger in magnitude than `self` for rates up to 100%.
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        let amount = div_round(self.0 as i128 * rate.bps() as i128, 10_000);
        Money(amount as i64)
    }
}

/// Integer division rounding half away from zero. `divisor` must be positive.
fn div_round(value: i128, divisor: i128) -> i128 {
    if value >= 0 {
        (value + divisor / 2) / divisor
    } else {
        (value - divisor / 2) / divisor
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `12.34`. Currency symbols are a front-end concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2250).to_string(), "22.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-750).to_string(), "-7.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_major_minor(10, 0);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((-b).cents(), -250);

        assert_eq!(a.checked_add(b), Some(Money::from_cents(1250)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(b), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(b), None);
    }

    #[test]
    fn test_times_fractional_quantity() {
        let price = Money::from_cents(1000);
        assert_eq!(price.checked_times(Quantity::from_milli(250)), Some(Money::from_cents(250)));
        // 0.333 × 10.00 = 3.33
        assert_eq!(price.checked_times(Quantity::from_milli(333)), Some(Money::from_cents(333)));
        // negative margins round away from zero too
        assert_eq!(
            Money::from_cents(-299).checked_times(Quantity::from_milli(1500)),
            Some(Money::from_cents(-449))
        );
    }

    #[test]
    fn test_times_overflow_is_none() {
        // 10^16 cents × 999 wraps an i64
        let price = Money::from_cents(10_000_000_000_000_000);
        assert_eq!(price.checked_times(Quantity::from_units(999)), None);
    }

    #[test]
    fn test_discount_amount() {
        let subtotal = Money::from_cents(2500);
        assert_eq!(subtotal.discount_amount(DiscountRate::from_bps(1000)).cents(), 250);
        assert_eq!(subtotal.discount_amount(DiscountRate::zero()).cents(), 0);
        assert_eq!(subtotal.discount_amount(DiscountRate::from_bps(10_000)).cents(), 2500);
        // 3.33% of 0.99 = 0.0329 → 0.03
        assert_eq!(Money::from_cents(99).discount_amount(DiscountRate::from_bps(333)).cents(), 3);
    }

    #[test]
    fn test_serializes_as_plain_cents() {
        let json = serde_json::to_string(&Money::from_cents(1099)).unwrap();
        assert_eq!(json, "1099");
    }
}
