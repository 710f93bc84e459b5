//! # tally-core: Pure Business Logic for the Tally Back Office
//!
//! Everything the back office decides without touching storage lives here:
//! money and quantity arithmetic, checkout totals, invoice codes, the
//! permission predicate and request validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tally Back Office Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              backoffice-api (axum, cookie session)              │   │
//! │  │   auth ─► permission gate ─► handlers ─► JSON / CSV export      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  money   │ │ checkout │ │permission│ │ validation/input │  │   │
//! │  │   │ quantity │ │  totals  │ │ evaluate │ │   rules, bodies  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │      SQLite pool, repositories, cart / checkout / authorizer    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartLine, Order, Role, Page, etc.)
//! - [`money`] - Money in integer cents
//! - [`quantity`] - Fractional quantities in integer thousandths
//! - [`checkout`] - Totals, per-line profit, invoice codes
//! - [`permission`] - `view_`/`edit_` permission predicate
//! - [`validation`] / [`input`] - Field rules and typed request bodies
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{Money, Quantity};
//! use tally_core::types::DiscountRate;
//!
//! let price = Money::from_cents(1000);
//! let line = price.checked_times(Quantity::from_units(2)).unwrap();
//! let discount = line.discount_amount(DiscountRate::from_bps(1000));
//!
//! assert_eq!(line.cents(), 2000);
//! assert_eq!(discount.cents(), 200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod input;
pub mod money;
pub mod permission;
pub mod quantity;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rows per page on every paginated listing.
pub const PAGE_SIZE: u32 = 5;

/// Maximum quantity of a single cart line, in whole units.
///
/// ## Business Reason
/// Catches typos like 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest price or cash amount a request may carry, in cents (one billion
/// whole units). Line totals and sums are still computed with checked
/// arithmetic on top of this bound.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Maximum length of person, customer and role names.
pub const MAX_NAME_LEN: usize = 50;

/// Maximum length of a product title.
pub const MAX_TITLE_LEN: usize = 200;

/// Minimum password length for new and changed passwords.
pub const MIN_PASSWORD_LEN: usize = 6;
