//! Error codes carried in every error body.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Machine-readable error identifier plus a stable integer for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000s)
    ValidationError,
    InvalidJson,
    InvalidQuery,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    PayloadTooLarge,
    MethodNotAllowed,
    BadRequest,

    // Server errors
    InternalError,
    ServiceUnavailable,

    // Database errors (2000s)
    DatabaseError,

    // Storage errors (4000s)
    StorageError,

    // Serialization errors (5000s)
    SerdeJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidJson => 1002,
            Self::InvalidQuery => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::PayloadTooLarge => 1009,
            Self::MethodNotAllowed => 1010,
            Self::BadRequest => 1011,
            Self::ServiceUnavailable => 1012,
            Self::DatabaseError => 2001,
            Self::StorageError => 4001,
            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "The given data was invalid.",
            Self::InvalidJson => "Malformed JSON body.",
            Self::InvalidQuery => "Malformed query string.",
            Self::NotFound => "Resource not found.",
            Self::Unauthorized => "Unauthenticated.",
            Self::Forbidden => "This action is unauthorized.",
            Self::Conflict => "Resource already exists.",
            Self::PayloadTooLarge => "Request body is too large.",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource.",
            Self::BadRequest => "Bad request.",
            Self::InternalError => "Server Error",
            Self::ServiceUnavailable => "Service temporarily unavailable.",
            Self::DatabaseError => "Server Error",
            Self::StorageError => "Server Error",
            Self::SerdeJsonError => "Server Error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
