use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::envelope::ErrorEnvelope;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these,
// never on the human-readable message string.

/// Stable error code constants.
///
/// Clients should match on `code` from
/// `{"success": false, "code": "NOT_FOUND", "message": "...", "timestamp": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const QUANTITY_EXCEEDED: &str = "QUANTITY_EXCEEDED";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Message returned to clients in place of storage/internal details.
const GENERIC_FAILURE: &str = "internal server error";

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all modules.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. The JSON response is the error envelope:
///
/// ```json
/// {"success": false, "code": "NOT_FOUND", "message": "tropa 'T-9' not found", "timestamp": "..."}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key / resource already exists. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// A head count would exceed what is available. HTTP 409.
    #[error("{message}")]
    QuantityExceeded {
        message: String,
        details: serde_json::Value,
    },

    /// Storage backend failure. HTTP 500, detail is logged but not returned.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500, detail is logged but not returned.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Validation(_) => error_code::VALIDATION_ERROR,
            ServiceError::QuantityExceeded { .. } => error_code::QUANTITY_EXCEEDED,
            ServiceError::Storage(_) => error_code::DATABASE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL_ERROR,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::QuantityExceeded { .. } => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message may be shown to the caller as-is.
    pub fn is_public(&self) -> bool {
        !matches!(self, ServiceError::Storage(_) | ServiceError::Internal(_))
    }

    /// Build the error envelope for this error.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let message = if self.is_public() {
            self.to_string()
        } else {
            GENERIC_FAILURE.to_string()
        };
        let details = match self {
            ServiceError::QuantityExceeded { details, .. } => Some(details.clone()),
            _ => None,
        };
        ErrorEnvelope::new(self.error_code(), message, details)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if !self.is_public() {
            error!(code = self.error_code(), "request failed: {self}");
        }
        let status = self.status_code();
        (status, axum::Json(self.to_envelope())).into_response()
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}
