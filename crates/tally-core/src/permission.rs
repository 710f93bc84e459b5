//! # Permission Predicate
//!
//! Decides whether a set of granted permission names covers a verb on a
//! resource. Loading the set is the caller's job; this module only answers
//! the question.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /api/products   ──► view_products                               │
//! │  POST   /api/products   ──► edit_products                               │
//! │  PUT    /api/roles/3    ──► edit_roles                                  │
//! │  DELETE /api/users/9    ──► edit_users                                  │
//! │                                                                         │
//! │  granted ∋ required  ?  Ok  :  PermissionDenied { required }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Resources that carry `view_` and `edit_` permissions.
pub const RESOURCES: &[&str] = &[
    "users",
    "roles",
    "products",
    "customers",
    "transactions",
    "reports",
];

/// Read or write access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessVerb {
    View,
    Edit,
}

impl AccessVerb {
    /// Maps an HTTP method to a verb. GET and HEAD read; everything else edits.
    pub fn from_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
            AccessVerb::View
        } else {
            AccessVerb::Edit
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessVerb::View => "view",
            AccessVerb::Edit => "edit",
        }
    }
}

impl fmt::Display for AccessVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the permission needed for `verb` on `resource`.
///
/// ## Example
/// ```rust
/// use tally_core::permission::{required_permission, AccessVerb};
///
/// assert_eq!(required_permission("products", AccessVerb::View), "view_products");
/// assert_eq!(required_permission("products", AccessVerb::Edit), "edit_products");
/// ```
pub fn required_permission(resource: &str, verb: AccessVerb) -> String {
    format!("{}_{}", verb.as_str(), resource)
}

/// Grants iff the required permission name is in `granted`.
///
/// ## Returns
/// * `Ok(())` - Access granted
/// * `Err(CoreError::PermissionDenied)` - Names the missing permission
pub fn evaluate<I, S>(granted: I, resource: &str, verb: AccessVerb) -> CoreResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let required = required_permission(resource, verb);
    if granted.into_iter().any(|name| name.as_ref() == required) {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied { required })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_from_method() {
        assert_eq!(AccessVerb::from_method("GET"), AccessVerb::View);
        assert_eq!(AccessVerb::from_method("head"), AccessVerb::View);
        assert_eq!(AccessVerb::from_method("POST"), AccessVerb::Edit);
        assert_eq!(AccessVerb::from_method("PUT"), AccessVerb::Edit);
        assert_eq!(AccessVerb::from_method("PATCH"), AccessVerb::Edit);
        assert_eq!(AccessVerb::from_method("DELETE"), AccessVerb::Edit);
    }

    #[test]
    fn test_evaluate_grants_matching_permission() {
        let granted = ["view_products", "edit_transactions"];
        assert!(evaluate(granted, "products", AccessVerb::View).is_ok());
        assert!(evaluate(granted, "transactions", AccessVerb::Edit).is_ok());
    }

    #[test]
    fn test_view_does_not_imply_edit() {
        let granted = vec!["view_products".to_string()];
        let err = evaluate(&granted, "products", AccessVerb::Edit).unwrap_err();
        match err {
            CoreError::PermissionDenied { required } => assert_eq!(required, "edit_products"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_grant_set_denies() {
        let granted: Vec<String> = Vec::new();
        assert!(evaluate(&granted, "users", AccessVerb::View).is_err());
    }
}
