//! Trade validation and holding reconstruction.

use bux_shared::types::{MONEY, PortfolioId, QUANTITY, UserId};
use rust_decimal::Decimal;

use super::error::HoldingError;
use super::types::{HoldingSnapshot, NewTrade, TradeRecord};
use crate::replay::replay;

/// Allowed gap between `quantity * average_cost` and `total_cost`.
pub const COST_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Holding engine for business logic.
pub struct HoldingEngine;

impl HoldingEngine {
    /// Validates a trade before it is appended.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveQuantity`, `NonPositivePrice` or `NegativeFee`, and
    /// `OutOfRange` when a value would be rounded or overflow on storage.
    pub fn validate_trade(trade: &NewTrade) -> Result<(), HoldingError> {
        if trade.quantity <= Decimal::ZERO {
            return Err(HoldingError::NonPositiveQuantity);
        }
        if trade.price <= Decimal::ZERO {
            return Err(HoldingError::NonPositivePrice);
        }
        if trade.fee < Decimal::ZERO {
            return Err(HoldingError::NegativeFee);
        }
        if !QUANTITY.fits(trade.quantity) {
            return Err(HoldingError::OutOfRange("quantity"));
        }
        if !MONEY.fits(trade.price) {
            return Err(HoldingError::OutOfRange("price"));
        }
        if !MONEY.fits(trade.fee) {
            return Err(HoldingError::OutOfRange("fee"));
        }
        Ok(())
    }

    /// Checks that a portfolio exists and belongs to `user_id`, in that order.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioNotFound` when `owner` is `None`, `AccessDenied` on mismatch.
    pub fn check_owner(
        portfolio_id: PortfolioId,
        owner: Option<UserId>,
        user_id: UserId,
    ) -> Result<(), HoldingError> {
        match owner {
            None => Err(HoldingError::PortfolioNotFound(portfolio_id)),
            Some(owner) if owner != user_id => Err(HoldingError::AccessDenied(portfolio_id)),
            Some(_) => Ok(()),
        }
    }

    /// Replays every trade of one (portfolio, security) pair.
    ///
    /// Trades are ordered by `trade_date`, then by id, before folding. Returns
    /// `None` when the position is settled and the holding row must not exist.
    #[must_use]
    pub fn rebuild(mut trades: Vec<TradeRecord>) -> Option<HoldingSnapshot> {
        trades.sort_by(|a, b| {
            a.trade_date
                .cmp(&b.trade_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        replay(&trades).snapshot()
    }
}
