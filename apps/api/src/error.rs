//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  code              status   typical source                              │
//! │  ───────────────   ──────   ─────────────────────────────────────────── │
//! │  VALIDATION_ERROR    400    bad input, ExceedsBalance, InvalidAmount    │
//! │  NOT_FOUND           404    unknown client/lot/sale/installment         │
//! │  CONFLICT            409    lot already reserved, intent already paid   │
//! │  FORBIDDEN           403    PATCH on a pagado installment               │
//! │  RATE_LIMITED        429    fixed-window counter exhausted              │
//! │  INTERNAL            500    storage failures (processor retries)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write endpoints serialize errors as `{"errors":[{"message","code"}]}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use predio_core::CoreError;
use predio_db::{DbError, ServiceError};

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Duplicate / already-processed / unavailable resource (409)
    Conflict,

    /// Operation not allowed on this record (403)
    Forbidden,

    /// Too many requests in the window (429)
    RateLimited,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates a rate-limited error.
    pub fn rate_limited() -> Self {
        ApiError::new(ErrorCode::RateLimited, "Too many requests")
    }

    /// Creates an internal error with a generic message (the detail goes to
    /// the log, never to the client).
    pub fn internal() -> Self {
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = json!({
            "errors": [{ "message": self.message, "code": self.code }]
        });
        (status, Json(body)).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ClientNotFound(_)
            | CoreError::LotNotFound(_)
            | CoreError::SellerNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::InstallmentNotFound(_) => ErrorCode::NotFound,

            CoreError::LotNotAvailable { .. } => ErrorCode::Conflict,

            CoreError::InstallmentClosed(_) => ErrorCode::Forbidden,

            CoreError::InvalidAmount { .. }
            | CoreError::ExceedsBalance { .. }
            | CoreError::NoPendingInstallments(_)
            | CoreError::InvalidAssociation { .. }
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            other => {
                // Log the detail, return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::internal()
            }
        }
    }
}

/// Converts service errors to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

/// Converts validation errors directly (pre-transaction input checks).
impl From<predio_core::ValidationError> for ApiError {
    fn from(err: predio_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorCode::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::LotNotFound("l-1".to_string()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = CoreError::LotNotAvailable {
            lot_id: "l-1".to_string(),
            status: "reserved".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = CoreError::NoPendingInstallments("v-1".to_string()).into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = CoreError::InstallmentClosed("p-1".to_string()).into();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
