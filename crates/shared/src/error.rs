//! Application-wide error types.
//!
//! Domain crates keep their own error enums; handlers fold them into `AppError`
//! so that every response carries a stable machine code next to the message.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input. Never retried automatically.
    #[error("Validation error: {message}")]
    Validation {
        /// Machine-readable code (e.g. `NON_POSITIVE_AMOUNT`).
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The entity exists but belongs to another user.
    #[error("Access denied: {message}")]
    Forbidden {
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// The entity id does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// I/O failure from the persistence layer. Safe to retry.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a validation error with the given code.
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    /// Creates a not-found error with the given code.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// Creates an access-denied error with the given code.
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. } => code,
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may safely retry the request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::validation("X", "").status_code(), 400);
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::forbidden("X", "").status_code(), 403);
        assert_eq!(AppError::not_found("X", "").status_code(), 404);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::validation("NON_POSITIVE_AMOUNT", "").error_code(),
            "NON_POSITIVE_AMOUNT"
        );
        assert_eq!(
            AppError::not_found("ACCOUNT_NOT_FOUND", "").error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            AppError::forbidden("ACCESS_DENIED", "").error_code(),
            "ACCESS_DENIED"
        );
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::validation("X", "msg").to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::forbidden("X", "msg").to_string(),
            "Access denied: msg"
        );
        assert_eq!(AppError::not_found("X", "msg").to_string(), "Not found: msg");
        assert_eq!(
            AppError::Database("msg".into()).to_string(),
            "Database error: msg"
        );
    }

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(AppError::Database(String::new()).is_retryable());
        assert!(!AppError::validation("X", "").is_retryable());
        assert!(!AppError::not_found("X", "").is_retryable());
    }
}
