//! # Database Error Types
//!
//! Error types for storage and store-backed service operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← constraint name parsed out of the SQLite message            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError ← DbError or CoreError (empty cart, out of stock, ...)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ErrorKind ← one flat category the HTTP layer maps to a status         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind as SqlxErrorKind;
use tally_core::CoreError;
use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Failure reported by SQLite or the pool.
///
/// Constraint failures get their own variants because the service layer turns
/// them into `Conflict`; everything else ends up as an internal error.
#[derive(Debug, Error)]
pub enum DbError {
    /// A lookup or keyed UPDATE/DELETE matched no row.
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row. `column` is `table.column`.
    #[error("{column} is already taken")]
    UniqueViolation { column: String },

    /// The row is still referenced (sold product, role in use) or points at
    /// a missing parent.
    #[error("row is referenced elsewhere: {detail}")]
    ForeignKeyViolation { detail: String },

    /// Negative stock, non-positive quantity and the like.
    #[error("check constraint failed: {detail}")]
    CheckViolation { detail: String },

    #[error("cannot open database: {0}")]
    ConnectionFailed(String),

    #[error("migration failed: {0}")]
    MigrationFailed(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("no free database connection")]
    PoolExhausted,

    #[error("database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(column: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            column: column.into(),
        }
    }
}

/// `"UNIQUE constraint failed: users.email"` → `users.email`
fn unique_column(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, column)| column.to_string())
        .unwrap_or_else(|| "value".to_string())
}

/// SQLite extended result code of a foreign key failure. A RESTRICT hit on
/// DELETE can come back with only the primary `SQLITE_CONSTRAINT` code, so
/// the message is checked as well.
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

fn classify(kind: SqlxErrorKind, code: Option<&str>, detail: String) -> DbError {
    match kind {
        SqlxErrorKind::UniqueViolation => DbError::duplicate(unique_column(&detail)),
        SqlxErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { detail },
        SqlxErrorKind::CheckViolation => DbError::CheckViolation { detail },
        _ if code == Some(SQLITE_CONSTRAINT_FOREIGNKEY)
            || detail.contains("FOREIGN KEY constraint failed") =>
        {
            DbError::ForeignKeyViolation { detail }
        }
        _ if detail.starts_with("UNIQUE constraint failed") => {
            DbError::duplicate(unique_column(&detail))
        }
        _ if detail.starts_with("CHECK constraint failed") => DbError::CheckViolation { detail },
        _ => DbError::QueryFailed(detail),
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("row", "?"),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|code| code.into_owned());
                classify(db_err.kind(), code.as_deref(), db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Service Errors
// =============================================================================

/// Error returned by the store-backed services and the repositories that
/// enforce domain rules (cart ownership, role associations).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Storage(err.into())
    }
}

impl From<tally_core::ValidationError> for ServiceError {
    fn from(err: tally_core::ValidationError) -> Self {
        ServiceError::Domain(err.into())
    }
}

/// Flat failure category, one per HTTP status family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    EmptyCart,
    OutOfStock,
    InsufficientCash,
    Conflict,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(err) => match err {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::Forbidden { .. } | CoreError::PermissionDenied { .. } => {
                    ErrorKind::Forbidden
                }
                CoreError::EmptyCart => ErrorKind::EmptyCart,
                CoreError::OutOfStock { .. } => ErrorKind::OutOfStock,
                CoreError::InsufficientCash { .. } => ErrorKind::InsufficientCash,
                CoreError::Validation(_) => ErrorKind::Validation,
            },
            ServiceError::Storage(err) => match err {
                DbError::NotFound { .. } => ErrorKind::NotFound,
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                    ErrorKind::Conflict
                }
                _ => ErrorKind::Internal,
            },
        }
    }

    /// True for failures caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Quantity;

    #[test]
    fn test_service_error_kinds() {
        let err: ServiceError = CoreError::EmptyCart.into();
        assert_eq!(err.kind(), ErrorKind::EmptyCart);

        let err: ServiceError = CoreError::OutOfStock {
            product: "Rice".to_string(),
            available: Quantity::from_units(1),
            requested: Quantity::from_units(2),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::OutOfStock);

        let err: ServiceError = DbError::duplicate("users.email").into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: ServiceError = DbError::not_found("Product", 9).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_client_error());

        let err: ServiceError = DbError::PoolExhausted.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_restrict_failure_is_a_foreign_key_violation() {
        let err = classify(
            SqlxErrorKind::Other,
            Some("19"),
            "FOREIGN KEY constraint failed".to_string(),
        );
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err = classify(SqlxErrorKind::Other, Some(SQLITE_CONSTRAINT_FOREIGNKEY), String::new());
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err: ServiceError = err.into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = classify(SqlxErrorKind::Other, Some("1"), "no such table: carts".to_string());
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[test]
    fn test_unique_column_from_message() {
        assert_eq!(unique_column("UNIQUE constraint failed: users.email"), "users.email");
        assert_eq!(unique_column("UNIQUE"), "value");
    }
}
