//! # Validation Module
//!
//! Input validation utilities for the back office.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── Type validation (JSON / multipart deserialization)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, formats                                 │
//! │  └── Ranges (qty > 0, discount 0-100, cash ≥ 0, dates)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (email, barcode, role name, invoice)                       │
//! │  ├── CHECK (stock >= 0, qty > 0)                                       │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_NAME_LEN, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Date format accepted by report filters.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, length-limited text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_text;
///
/// assert_eq!(validate_text("title", "  Coffee ", 200).unwrap(), "Coffee");
/// assert!(validate_text("title", "   ", 200).is_err());
/// ```
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a person or role name.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    validate_text(field, value, MAX_NAME_LEN)
}

/// Validates an email address and returns it trimmed and lowercased.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part
/// - Domain contains a dot that is neither first nor last
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_text("email", email, 254)?.to_lowercase();

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates a password's length.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a new password and its confirmation.
pub fn validate_new_password(password: &str, confirm: &str) -> ValidationResult<()> {
    validate_password(password)?;

    if password != confirm {
        return Err(ValidationError::Mismatch {
            field: "password_confirm".to_string(),
            other: "password".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional barcode.
///
/// Blank input means "generate one", so it maps to `None`.
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(barcode) = barcode.map(str::trim).filter(|b| !b.is_empty()) else {
        return Ok(None);
    };

    if barcode.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if barcode.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(Some(barcode.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY whole units
///
/// ## User Workflow
/// ```text
/// Cashier scans product, enters qty 1.5
///      │
///      ▼
/// validate_quantity(1.5) ← THIS FUNCTION
///      │
///      ├── qty <= 0?  → "qty must be positive"
///      ├── qty > 999? → "qty must be between 0 and 999"
///      └── OK → CartStore::add_line
/// ```
pub fn validate_quantity(qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level set by product management.
pub fn validate_stock(stock: Quantity) -> ValidationResult<()> {
    if stock.is_negative() {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount (prices, cash): `0..=MAX_AMOUNT_CENTS`.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_amount;
/// use tally_core::Money;
///
/// assert!(validate_amount("price", Money::from_cents(0)).is_ok());
/// assert!(validate_amount("price", Money::from_cents(-1)).is_err());
/// assert!(validate_amount("price", Money::from_cents(i64::MAX)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a row id supplied by a client.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` report date.
pub fn parse_report_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(value, REPORT_DATE_FORMAT).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

/// Parses an inclusive report range; `start` must not be after `end`.
pub fn parse_date_range(start: &str, end: &str) -> ValidationResult<(NaiveDate, NaiveDate)> {
    let start = parse_report_date("start_date", start)?;
    let end = parse_report_date("end_date", end)?;

    if start > end {
        return Err(ValidationError::InvalidFormat {
            field: "start_date".to_string(),
            reason: "must not be after end_date".to_string(),
        });
    }

    Ok((start, end))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("title", "Coffee", 10).unwrap(), "Coffee");
        assert!(matches!(
            validate_text("title", "", 10),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_text("title", &"A".repeat(11), 10),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ana@Shop.io ").unwrap(), "ana@shop.io");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@shop.io").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@b@c.io").is_err());
        assert!(validate_email("a b@c.io").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("secret", "secret").is_ok());
        assert!(matches!(
            validate_new_password("abc", "abc"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_new_password("secret", "secrets"),
            Err(ValidationError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode(None).unwrap(), None);
        assert_eq!(validate_barcode(Some("  ")).unwrap(), None);
        assert_eq!(validate_barcode(Some(" 8991 ")).unwrap(), Some("8991".to_string()));
        assert!(validate_barcode(Some("89 91")).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Quantity::from_units(1)).is_ok());
        assert!(validate_quantity(Quantity::from_milli(1)).is_ok());
        assert!(validate_quantity(Quantity::from_units(999)).is_ok());

        assert!(validate_quantity(Quantity::zero()).is_err());
        assert!(validate_quantity(Quantity::from_units(-1)).is_err());
        assert!(validate_quantity(Quantity::from_milli(999_001)).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(Quantity::zero()).is_ok());
        assert!(validate_stock(Quantity::from_milli(-1)).is_err());
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount("price", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());

        let err = validate_amount("sell_price", Money::from_cents(MAX_AMOUNT_CENTS + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "sell_price"));

        let err = validate_amount("cash", Money::from_cents(-1)).unwrap_err();
        assert!(matches!(err, ValidationError::Negative { .. }));
    }

    #[test]
    fn test_parse_date_range() {
        let (start, end) = parse_date_range("2026-01-01", "2026-01-31").unwrap();
        assert!(start < end);
        assert!(parse_date_range("2026-01-01", "2026-01-01").is_ok());

        assert!(parse_date_range("2026-02-01", "2026-01-01").is_err());
        assert!(parse_date_range("01/02/2026", "2026-01-01").is_err());
        assert!(parse_date_range("", "2026-01-01").is_err());
        assert!(parse_date_range("2026-02-30", "2026-03-01").is_err());
    }
}
