//! # Request Inputs
//!
//! Typed request bodies accepted by the API, each with its own validation.
//! Handlers deserialize into these and call `validate()` before touching
//! the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::DiscountRate;
use crate::validation::{
    parse_date_range, validate_amount, validate_barcode, validate_email, validate_id,
    validate_name, validate_new_password, validate_password, validate_quantity, validate_stock, validate_text,
    ValidationResult,
};
use crate::MAX_TITLE_LEN;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub price: Money,
    pub sell_price: Money,
    pub stock: Quantity,
}

impl ProductInput {
    /// Trims text fields and checks ranges. A blank barcode becomes `None`.
    pub fn validate(self) -> ValidationResult<Self> {
        validate_amount("price", self.price)?;
        validate_amount("sell_price", self.sell_price)?;
        validate_stock(self.stock)?;

        Ok(ProductInput {
            title: validate_text("title", &self.title, MAX_TITLE_LEN)?,
            description: self.description.trim().to_string(),
            barcode: validate_barcode(self.barcode.as_deref())?,
            ..self
        })
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
}

impl CustomerInput {
    pub fn validate(self) -> ValidationResult<Self> {
        Ok(CustomerInput {
            name: validate_name("name", &self.name)?,
            email: validate_email(&self.email)?,
        })
    }
}

// =============================================================================
// Users & Auth
// =============================================================================

/// Self-service sign-up.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterInput {
    pub fn validate(self) -> ValidationResult<Self> {
        validate_new_password(&self.password, &self.password_confirm)?;
        Ok(RegisterInput {
            first_name: validate_name("first_name", &self.first_name)?,
            last_name: validate_name("last_name", &self.last_name)?,
            email: validate_email(&self.email)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Staff account created by an administrator.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role_id: i64,
}

impl NewUserInput {
    pub fn validate(self) -> ValidationResult<Self> {
        validate_password(&self.password)?;
        validate_id("role_id", self.role_id)?;
        Ok(NewUserInput {
            first_name: validate_name("first_name", &self.first_name)?,
            last_name: validate_name("last_name", &self.last_name)?,
            email: validate_email(&self.email)?,
            ..self
        })
    }
}

/// Administrator edit of a staff account.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct UserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_id: i64,
}

impl UserInput {
    pub fn validate(self) -> ValidationResult<Self> {
        validate_id("role_id", self.role_id)?;
        Ok(UserInput {
            first_name: validate_name("first_name", &self.first_name)?,
            last_name: validate_name("last_name", &self.last_name)?,
            email: validate_email(&self.email)?,
            ..self
        })
    }
}

/// A user editing their own profile.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct ProfileInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileInput {
    pub fn validate(self) -> ValidationResult<Self> {
        Ok(ProfileInput {
            first_name: validate_name("first_name", &self.first_name)?,
            last_name: validate_name("last_name", &self.last_name)?,
            email: validate_email(&self.email)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct PasswordInput {
    pub password: String,
    pub password_confirm: String,
}

impl PasswordInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_new_password(&self.password, &self.password_confirm)
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Create or update body for a role. Both fields are optional on the wire;
/// creation requires both, an update applies whichever is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoleInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<i64>>,
}

/// A role input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChanges {
    pub name: Option<String>,
    /// Sorted and deduplicated.
    pub permission_ids: Option<Vec<i64>>,
}

impl RoleInput {
    /// Validates for creation: name and permission list are both required.
    pub fn validate_for_create(self) -> ValidationResult<(String, Vec<i64>)> {
        let changes = self.validate_for_update()?;
        let name = changes.name.ok_or_else(|| ValidationError::Required {
            field: "name".to_string(),
        })?;
        let permission_ids = changes.permission_ids.ok_or_else(|| ValidationError::Required {
            field: "permissions".to_string(),
        })?;
        Ok((name, permission_ids))
    }

    /// Validates whichever fields are present.
    pub fn validate_for_update(self) -> ValidationResult<RoleChanges> {
        let name = self
            .name
            .as_deref()
            .map(|name| validate_name("name", name))
            .transpose()?;

        let permission_ids = match self.permissions {
            Some(mut ids) => {
                for id in &ids {
                    validate_id("permissions", *id)?;
                }
                ids.sort_unstable();
                ids.dedup();
                Some(ids)
            }
            None => None,
        };

        Ok(RoleChanges {
            name,
            permission_ids,
        })
    }
}

// =============================================================================
// Cart & Checkout
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddCartLineInput {
    pub product_id: i64,
    pub qty: Quantity,
}

impl AddCartLineInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("product_id", self.product_id)?;
        validate_quantity(self.qty)
    }
}

/// `{ customer_id, discount_percent, cash }`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub discount_percent: f64,
    pub cash: Money,
}

impl CheckoutRequest {
    /// Checks the request and returns the parsed discount rate.
    pub fn validate(&self) -> ValidationResult<DiscountRate> {
        if let Some(customer_id) = self.customer_id {
            validate_id("customer_id", customer_id)?;
        }
        validate_amount("cash", self.cash)?;
        DiscountRate::from_percentage(self.discount_percent)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`, both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportRange {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl ReportRange {
    pub fn parse(&self) -> ValidationResult<(NaiveDate, NaiveDate)> {
        parse_date_range(&self.start_date, &self.end_date)
    }
}
