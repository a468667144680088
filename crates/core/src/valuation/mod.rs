//! Portfolio valuation.
//!
//! Joins open holdings with the latest close price of each security and derives
//! market value and unrealized P&L, per holding and for the whole portfolio.

pub mod error;
pub mod types;
pub mod valuator;

#[cfg(test)]
mod valuator_props;

pub use error::ValuationError;
pub use types::{DailyPrice, HoldingValuation, PortfolioSummary, ValuedHolding};
pub use valuator::PortfolioValuator;
