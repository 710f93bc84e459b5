//! # Domain Types
//!
//! Core domain types used throughout the back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode        │   │  user_id        │   │  invoice        │       │
//! │  │  stock (Qty)    │◄──│  product_id     │   │  cash / change  │       │
//! │  │  price (cost)   │   │  qty            │   │  discount       │       │
//! │  │  sell_price     │   │  price (frozen) │   │  grand_total    │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ 1..n            │
//! │                         ┌─────────────────┐   ┌───────┴─────────┐       │
//! │                         │  ProfitEntry    │──►│   OrderLine     │       │
//! │                         │  total          │1:1│  qty / price    │       │
//! │                         └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     User        │──►│      Role       │◄─►│   Permission    │       │
//! │  │  role_id        │   │  name           │n:m│  view_products  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by its SQLite row id (`i64`). The order id is part
//! of the human-readable invoice code, so ids are sequential, not UUIDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::validation::ValidationResult;
use crate::PAGE_SIZE;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount rate from a percentage (`10.0` = 10%).
    ///
    /// ## Rules
    /// - Must be finite
    /// - Must be between 0 and 100
    pub fn from_percentage(pct: f64) -> ValidationResult<Self> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: "discount_percent".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(DiscountRate((pct * 100.0).round() as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Unique scan code. Generated when the product is created without one.
    pub barcode: String,

    pub title: String,

    pub description: String,

    /// Units on hand. Never negative.
    pub stock: Quantity,

    /// Cost basis per unit.
    pub price: Money,

    /// Price charged to the customer per unit.
    pub sell_price: Money,

    /// Object storage URL of the product image.
    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Margin per unit at the current prices.
    #[inline]
    pub fn unit_margin(&self) -> Money {
        self.sell_price - self.price
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A pending purchase request owned by one user.
///
/// `price` is the product's sell price at the moment the line was added
/// and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub qty: Quantity,
    pub price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A cart line joined with the product it points at, as shown to the cashier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub title: String,
    pub barcode: String,
    pub qty: Quantity,
    pub price: Money,
}

/// A user's cart with its total computed on read.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: Money,
}

// =============================================================================
// Order
// =============================================================================

/// A committed sale.
///
/// Immutable after creation except for the one-time invoice back-fill.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,

    /// Cashier who ran the checkout.
    pub user_id: i64,

    /// `None` for walk-in customers.
    pub customer_id: Option<i64>,

    /// `"{yy}.{m}.INV/ORD/{id}"`, assigned once inside the checkout transaction.
    pub invoice: Option<String>,

    pub cash: Money,
    pub change: Money,

    /// Absolute discount derived from the percentage at checkout.
    pub discount: Money,

    pub grand_total: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub lines: Vec<OrderLine>,

    /// Echo of the requested discount percentage. Not persisted.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub discount_percent: Option<f64>,
}

/// One line of a committed order, priced from the cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub qty: Quantity,
    pub price: Money,
}

/// Margin recorded for one order line, at the product prices current at
/// commit time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProfitEntry {
    pub id: i64,
    pub order_id: i64,
    pub order_line_id: i64,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Roles & Permissions
// =============================================================================

/// A named `verb_resource` grant, e.g. `edit_products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Permission {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// A role with its full permission set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoleDetail {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<Permission>,
}

// =============================================================================
// People
// =============================================================================

/// A staff account. The password hash never leaves the database crate.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_id: i64,
    pub role_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// ```json
/// { "total": 12, "page": 2, "last_page": 3 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub last_page: u32,
}

impl PageMeta {
    /// `last_page = ceil(total / PAGE_SIZE)`, at least 1.
    pub fn new(total: i64, page: u32) -> Self {
        let size = PAGE_SIZE as i64;
        let last_page = ((total.max(0) + size - 1) / size).max(1);
        PageMeta {
            total,
            page,
            last_page: last_page as u32,
        }
    }
}

/// Normalizes a requested page number (0 and absent both mean 1).
#[inline]
pub fn normalize_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

/// Row offset for a normalized page number.
#[inline]
pub fn page_offset(page: u32) -> i64 {
    (page.max(1) as i64 - 1) * PAGE_SIZE as i64
}

// =============================================================================
// Reports
// =============================================================================

/// One order in the sales report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesRow {
    pub order_id: i64,
    pub invoice: Option<String>,
    pub cashier: String,
    pub customer: Option<String>,
    pub line_count: i64,
    pub discount: Money,
    pub grand_total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One profit entry in the profit report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProfitRow {
    pub id: i64,
    pub order_id: i64,
    pub invoice: Option<String>,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Report rows plus their aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Report<T> {
    pub rows: Vec<T>,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
