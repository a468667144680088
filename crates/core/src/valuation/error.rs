//! Valuation error types.

use thiserror::Error;

/// Errors raised while ingesting prices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    /// One of open, high, low or close is negative.
    #[error("Price field '{0}' cannot be negative")]
    NegativePrice(&'static str),

    /// A price field has more decimal places or digits than the column stores.
    #[error("Price field '{0}' exceeds the stored precision")]
    OutOfRange(&'static str),

    /// Volume is negative.
    #[error("Volume cannot be negative")]
    NegativeVolume,
}

impl ValuationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativePrice(_) => "NEGATIVE_PRICE",
            Self::OutOfRange(_) => "VALUE_OUT_OF_RANGE",
            Self::NegativeVolume => "NEGATIVE_VOLUME",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        400
    }
}
