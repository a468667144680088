//! Holding engine error types.

use bux_shared::types::{PortfolioId, SecurityId, TradeId};
use thiserror::Error;

/// Errors that can occur while recording trades or rebuilding holdings.
#[derive(Debug, Error)]
pub enum HoldingError {
    // ========== Validation Errors ==========
    /// Side is neither "buy" nor "sell".
    #[error("Invalid trade side '{0}', expected 'buy' or 'sell'")]
    InvalidSide(String),

    /// Quantity must be strictly positive.
    #[error("Trade quantity must be greater than zero")]
    NonPositiveQuantity,

    /// Price must be strictly positive.
    #[error("Trade price must be greater than zero")]
    NonPositivePrice,

    /// Fee cannot be negative.
    #[error("Trade fee cannot be negative")]
    NegativeFee,

    /// A field has more decimal places or digits than its column stores.
    #[error("Trade {0} exceeds the stored precision")]
    OutOfRange(&'static str),

    // ========== Lookup Errors ==========
    /// Portfolio not found.
    #[error("Portfolio not found: {0}")]
    PortfolioNotFound(PortfolioId),

    /// Security not found.
    #[error("Security not found: {0}")]
    SecurityNotFound(SecurityId),

    /// Portfolio belongs to another user.
    #[error("Access denied to portfolio {0}")]
    AccessDenied(PortfolioId),

    // ========== Cache Errors ==========
    /// The trade is durable but the holding could not be rebuilt.
    #[error("Trade {trade_id} was recorded but the holding is stale, retry recalculation")]
    HoldingStale {
        /// The trade that was written.
        trade_id: TradeId,
    },
}

impl HoldingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSide(_) => "INVALID_TRADE_SIDE",
            Self::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            Self::NonPositivePrice => "NON_POSITIVE_PRICE",
            Self::NegativeFee => "NEGATIVE_FEE",
            Self::OutOfRange(_) => "VALUE_OUT_OF_RANGE",
            Self::PortfolioNotFound(_) => "PORTFOLIO_NOT_FOUND",
            Self::SecurityNotFound(_) => "SECURITY_NOT_FOUND",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::HoldingStale { .. } => "HOLDING_STALE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidSide(_)
            | Self::NonPositiveQuantity
            | Self::NonPositivePrice
            | Self::NegativeFee
            | Self::OutOfRange(_) => 400,
            Self::AccessDenied(_) => 403,
            Self::PortfolioNotFound(_) | Self::SecurityNotFound(_) => 404,
            Self::HoldingStale { .. } => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::HoldingStale { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            HoldingError::InvalidSide("x".into()).error_code(),
            "INVALID_TRADE_SIDE"
        );
        assert_eq!(
            HoldingError::NonPositiveQuantity.error_code(),
            "NON_POSITIVE_QUANTITY"
        );
        assert_eq!(
            HoldingError::HoldingStale {
                trade_id: TradeId::new(1)
            }
            .error_code(),
            "HOLDING_STALE"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(HoldingError::NegativeFee.http_status_code(), 400);
        assert_eq!(HoldingError::OutOfRange("quantity").http_status_code(), 400);
        assert_eq!(
            HoldingError::AccessDenied(PortfolioId::new(1)).http_status_code(),
            403
        );
        assert_eq!(
            HoldingError::PortfolioNotFound(PortfolioId::new(1)).http_status_code(),
            404
        );
        assert_eq!(
            HoldingError::HoldingStale {
                trade_id: TradeId::new(1)
            }
            .http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            HoldingError::HoldingStale {
                trade_id: TradeId::new(9)
            }
            .is_retryable()
        );
        assert!(!HoldingError::NonPositivePrice.is_retryable());
    }
}
