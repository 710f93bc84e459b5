//! # Checkout Math
//!
//! Pure calculations behind a checkout commit. The transaction that applies
//! them lives in `tally-db`; everything here is deterministic.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart = [A 10.00 × 2, B 5.00 × 1], discount 10%, cash 30.00            │
//! │                                                                         │
//! │  subtotal     = Σ price × qty           = 25.00                         │
//! │  discount     = subtotal × 10%          =  2.50                         │
//! │  grand_total  = subtotal − discount     = 22.50                         │
//! │  change       = cash − grand_total      =  7.50   (< 0 → InsufficientCash)
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{CartItem, CartLine, DiscountRate, OrderLine};

// =============================================================================
// Priced Lines
// =============================================================================

/// Anything that carries a product, a quantity and a frozen unit price.
pub trait PricedLine {
    fn product_id(&self) -> i64;
    fn qty(&self) -> Quantity;
    fn price(&self) -> Money;

    /// `price × qty`, rounded to the cent.
    fn line_total(&self) -> CoreResult<Money> {
        self.price()
            .checked_times(self.qty())
            .ok_or_else(|| overflow("line total"))
    }
}

impl PricedLine for CartLine {
    fn product_id(&self) -> i64 {
        self.product_id
    }
    fn qty(&self) -> Quantity {
        self.qty
    }
    fn price(&self) -> Money {
        self.price
    }
}

impl PricedLine for CartItem {
    fn product_id(&self) -> i64 {
        self.product_id
    }
    fn qty(&self) -> Quantity {
        self.qty
    }
    fn price(&self) -> Money {
        self.price
    }
}

impl PricedLine for OrderLine {
    fn product_id(&self) -> i64 {
        self.product_id
    }
    fn qty(&self) -> Quantity {
        self.qty
    }
    fn price(&self) -> Money {
        self.price
    }
}

/// Sum of line totals.
///
/// ## Returns
/// * `Err(Validation)` - A line total or the sum doesn't fit in `i64` cents
pub fn subtotal<L: PricedLine>(lines: &[L]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.line_total()?)
            .ok_or_else(|| overflow("subtotal"))
    })
}

fn overflow(field: &str) -> CoreError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
    .into()
}

/// Total quantity requested per product.
///
/// A cart may hold several lines for the same product, so stock has to be
/// checked against the sum, not line by line.
pub fn quantity_by_product<L: PricedLine>(lines: &[L]) -> BTreeMap<i64, Quantity> {
    let mut totals = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product_id()).or_insert_with(Quantity::zero) += line.qty();
    }
    totals
}

// =============================================================================
// Totals
// =============================================================================

/// Money totals of one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub grand_total: Money,
    pub change: Money,
}

impl CheckoutTotals {
    /// Computes the totals for a set of cart lines.
    ///
    /// ## Returns
    /// * `Err(CoreError::EmptyCart)` - No lines
    /// * `Err(CoreError::InsufficientCash)` - Change would be negative
    /// * `Err(CoreError::Validation)` - Totals overflow
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::checkout::CheckoutTotals;
    /// use tally_core::types::{CartItem, DiscountRate};
    /// use tally_core::{Money, Quantity};
    ///
    /// let line = |product_id, cents, qty| CartItem {
    ///     id: product_id,
    ///     product_id,
    ///     title: String::new(),
    ///     barcode: String::new(),
    ///     qty: Quantity::from_units(qty),
    ///     price: Money::from_cents(cents),
    /// };
    /// let totals = CheckoutTotals::compute(
    ///     &[line(1, 1000, 2), line(2, 500, 1)],
    ///     DiscountRate::from_bps(1000),
    ///     Money::from_cents(3000),
    /// )
    /// .unwrap();
    /// assert_eq!(totals.grand_total.cents(), 2250);
    /// assert_eq!(totals.change.cents(), 750);
    /// ```
    pub fn compute<L: PricedLine>(lines: &[L], rate: DiscountRate, cash: Money) -> CoreResult<Self> {
        if lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let subtotal = subtotal(lines)?;
        let discount = subtotal.discount_amount(rate);
        let grand_total = subtotal
            .checked_sub(discount)
            .ok_or_else(|| overflow("grand_total"))?;
        let change = cash
            .checked_sub(grand_total)
            .ok_or_else(|| overflow("change"))?;

        if change.is_negative() {
            return Err(CoreError::InsufficientCash { grand_total, cash });
        }

        Ok(CheckoutTotals {
            subtotal,
            discount,
            grand_total,
            change,
        })
    }
}

// =============================================================================
// Profit & Invoice
// =============================================================================

/// Profit for one order line: `(sell_price − cost) × qty`.
///
/// Uses the product's prices at commit time, not the frozen cart price.
pub fn line_profit(sell_price: Money, cost: Money, qty: Quantity) -> CoreResult<Money> {
    sell_price
        .checked_sub(cost)
        .and_then(|margin| margin.checked_times(qty))
        .ok_or_else(|| overflow("profit"))
}

/// Builds the invoice code for an order.
///
/// Format: two-digit year, month (unpadded), `INV/ORD/`, order id.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tally_core::checkout::invoice_code;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
/// assert_eq!(invoice_code(at, 42), "26.3.INV/ORD/42");
/// ```
pub fn invoice_code(created_at: DateTime<Utc>, order_id: i64) -> String {
    format!(
        "{:02}.{}.INV/ORD/{}",
        created_at.year().rem_euclid(100),
        created_at.month(),
        order_id
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
