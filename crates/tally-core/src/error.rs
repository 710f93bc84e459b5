//! # Error Types
//!
//! Rule and input failures raised by the pure domain code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tally-core                                                             │
//! │  ├── CoreError        - cart, checkout and permission rules             │
//! │  └── ValidationError  - malformed request fields                        │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage failures                               │
//! │  └── ServiceError     - Core | Db, classified into ErrorKind           │
//! │                                                                         │
//! │  backoffice-api errors (in app)                                        │
//! │  └── ApiError         - JSON { code, message } + HTTP status           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by cart, checkout and authorization rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A customer, product or cart line the request names is gone.
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// Caller does not own the resource it tried to touch.
    ///
    /// ## When This Occurs
    /// - Removing a cart line that belongs to another user
    /// - A token whose subject no longer exists
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// Caller's role lacks the permission for this verb on this resource.
    #[error("required permission '{required}'")]
    PermissionDenied { required: String },

    /// Checkout requested with no cart lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Stock cannot cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: Coffee × 3  (added while stock was 5)
    ///      │
    ///      ▼
    /// Another register sells 4
    ///      │
    ///      ▼
    /// Checkout re-reads stock inside the transaction: 1
    ///      │
    ///      ▼
    /// OutOfStock { product: "Coffee", available: 1, requested: 3 }
    /// ```
    #[error("stock not enough for product '{product}': available {available}, requested {requested}")]
    OutOfStock {
        product: String,
        available: Quantity,
        requested: Quantity,
    },

    /// Cash tendered is less than the grand total.
    #[error("cash is not enough: grand total {grand_total}, cash {cash}")]
    InsufficientCash { grand_total: Money, cash: Money },

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A request field the caller got wrong. Checked before anything is written,
/// so a rejected request leaves no trace.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    /// Length in characters, after trimming.
    #[error("{field} needs {min} characters or more")]
    TooShort { field: String, min: usize },

    #[error("{field} allows {max} characters at most")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero is rejected too (quantities, ids).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Zero is fine (prices, cash, stock).
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Unparseable value: dates, emails, decimal quantities.
    #[error("{field}: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A computed total left the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },

    /// Password confirmation and the like.
    #[error("{field} does not match {other}")]
    Mismatch { field: String, other: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_stock_names_product() {
        let err = CoreError::OutOfStock {
            product: "Coffee".to_string(),
            available: Quantity::from_units(1),
            requested: Quantity::from_milli(2500),
        };
        assert_eq!(
            err.to_string(),
            "stock not enough for product 'Coffee': available 1, requested 2.5"
        );
    }

    #[test]
    fn test_permission_denied_message() {
        let err = CoreError::PermissionDenied {
            required: "edit_products".to_string(),
        };
        assert_eq!(err.to_string(), "required permission 'edit_products'");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "title is required");
    }
}
