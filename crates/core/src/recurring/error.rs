//! Recurring scheduler error types.

use bux_shared::types::RecurringTransactionId;
use thiserror::Error;

use crate::balance::BalanceError;

/// Errors that can occur while managing or firing recurring rules.
#[derive(Debug, Error)]
pub enum RecurringError {
    /// Frequency is not daily, weekly, monthly or yearly.
    #[error("Invalid frequency '{0}'")]
    InvalidFrequency(String),

    /// Rule not found.
    #[error("Recurring transaction not found: {0}")]
    NotFound(RecurringTransactionId),

    /// Rule belongs to another user.
    #[error("Access denied to recurring transaction {0}")]
    AccessDenied(RecurringTransactionId),

    /// Rule is inactive and cannot be executed.
    #[error("Recurring transaction {0} is inactive")]
    Inactive(RecurringTransactionId),

    /// Advancing the cursor left the supported date range.
    #[error("Next date is out of range")]
    DateOverflow,

    /// The template or its posting was rejected by the balance mutator.
    #[error(transparent)]
    Transaction(#[from] BalanceError),
}

impl RecurringError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFrequency(_) => "INVALID_FREQUENCY",
            Self::NotFound(_) => "RECURRING_NOT_FOUND",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::Inactive(_) => "RECURRING_INACTIVE",
            Self::DateOverflow => "DATE_OVERFLOW",
            Self::Transaction(inner) => inner.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidFrequency(_) | Self::Inactive(_) | Self::DateOverflow => 400,
            Self::AccessDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::Transaction(inner) => inner.http_status_code(),
        }
    }
}
