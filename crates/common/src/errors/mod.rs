//! Error types for ScholarCheck services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidArgument,
    UnsupportedMediaType,
    PayloadTooLarge,

    // Authentication errors (2xxx)
    Unauthorized,
    ExpiredToken,

    // Authorization errors (3xxx)
    Forbidden,

    // Resource errors (4xxx)
    NotFound,

    // Conflict errors (5xxx)
    Conflict,

    // External service errors (8xxx)
    EmbeddingProviderError,

    // Database errors (7xxx)
    DatabaseError,

    // Internal errors (9xxx)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidArgument => 1001,
            ErrorCode::UnsupportedMediaType => 1002,
            ErrorCode::PayloadTooLarge => 1003,
            ErrorCode::Unauthorized => 2001,
            ErrorCode::ExpiredToken => 2002,
            ErrorCode::Forbidden => 3001,
            ErrorCode::NotFound => 4001,
            ErrorCode::Conflict => 5001,
            ErrorCode::DatabaseError => 7001,
            ErrorCode::EmbeddingProviderError => 8001,
            ErrorCode::InternalError => 9001,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("Invalid file type. Only PDF and DOCX allowed.")]
    UnsupportedMediaType,

    #[error("File too large. Maximum allowed size is {limit_bytes} bytes.")]
    PayloadTooLarge { limit_bytes: usize },

    // Authentication errors
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Could not validate credentials")]
    Forbidden,

    // Resource errors
    #[error("{resource} not found.")]
    NotFound { resource: &'static str },

    // Conflict errors
    #[error("A user with this email or student ID already exists")]
    DuplicateAccount,

    #[error("An analysis result already exists for this assignment")]
    DuplicateResult,

    // External service errors
    #[error("Embedding provider error: {message}")]
    EmbeddingProvider { message: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            AppError::UnsupportedMediaType => ErrorCode::UnsupportedMediaType,
            AppError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::DuplicateAccount | AppError::DuplicateResult => ErrorCode::Conflict,
            AppError::EmbeddingProvider { .. } => ErrorCode::EmbeddingProviderError,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::InvalidArgument { .. }
            | AppError::UnsupportedMediaType
            | AppError::PayloadTooLarge { .. }
            | AppError::DuplicateAccount => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::DuplicateResult => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Database(_) | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::EmbeddingProvider { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::NotFound {
            resource: "Assignment",
        };
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upload_validation_errors_map_to_400() {
        assert_eq!(
            AppError::UnsupportedMediaType.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge {
                limit_bytes: 5 * 1024 * 1024
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_conflict_split() {
        // Duplicate registration keeps the original 400 semantics, duplicate
        // result ingestion is a true 409.
        assert_eq!(
            AppError::DuplicateAccount.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateResult.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::DuplicateResult.code(), ErrorCode::Conflict);
    }

    #[test]
    fn test_embedding_provider_is_bad_gateway() {
        let err = AppError::EmbeddingProvider {
            message: "connection refused".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_not_found_message_does_not_leak_ownership() {
        // Absent and not-owned submissions must be indistinguishable.
        let err = AppError::NotFound {
            resource: "Assignment",
        };
        assert_eq!(err.to_string(), "Assignment not found.");
    }
}
