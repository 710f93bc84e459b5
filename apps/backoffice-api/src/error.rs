//! Error types for the back office API.
//!
//! Every handler returns `ApiResult<T>`. Errors render as
//! `{ "code": "OUT_OF_STOCK", "message": "..." }` with a matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::{DbError, ErrorKind, ServiceError};

use crate::reports::RenderError;
use crate::storage::StorageError;

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    Forbidden,
    Unauthenticated,
    Validation,
    Conflict,
    EmptyCart,
    OutOfStock,
    InsufficientCash,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::EmptyCart | ErrorCode::OutOfStock | ErrorCode::InsufficientCash => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
            ErrorKind::Validation => ErrorCode::Validation,
            ErrorKind::EmptyCart => ErrorCode::EmptyCart,
            ErrorKind::OutOfStock => ErrorCode::OutOfStock,
            ErrorKind::InsufficientCash => ErrorCode::InsufficientCash,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

/// API error body.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    /// Logs `detail` and hides it from the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        ApiError::new(ErrorCode::Internal, "internal server error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        if !err.is_client_error() {
            return ApiError::internal(&err);
        }
        ApiError::new(err.kind().into(), err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::not_found(err.to_string()),
            StorageError::InvalidUrl(_) => ApiError::validation(err.to_string()),
            StorageError::Io(_) => ApiError::internal(err),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Money, Quantity};

    #[test]
    fn test_checkout_failures_are_unprocessable() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::EmptyCart);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = CoreError::InsufficientCash {
            grand_total: Money::from_cents(2250),
            cash: Money::from_cents(1000),
        }
        .into();
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = CoreError::OutOfStock {
            product: "Rice".to_string(),
            available: Quantity::from_units(1),
            requested: Quantity::from_units(3),
        }
        .into();
        assert_eq!(err.code, ErrorCode::OutOfStock);
        assert!(err.message.contains("Rice"));
    }

    #[test]
    fn test_storage_errors_map_to_status() {
        let err: ApiError = DbError::duplicate("users.email").into();
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::not_found("Product", 4).into();
        assert_eq!(err.code.status(), StatusCode::NOT_FOUND);

        let err: ApiError = CoreError::PermissionDenied {
            required: "edit_roles".to_string(),
        }
        .into();
        assert_eq!(err.code.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.message, "required permission 'edit_roles'");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".to_string()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "internal server error");
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let body = serde_json::to_value(ApiError::new(ErrorCode::InsufficientCash, "x")).unwrap();
        assert_eq!(body["code"], "INSUFFICIENT_CASH");
    }
}
