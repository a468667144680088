//! Valuation input and output types.

use bux_shared::types::{PortfolioId, SecurityId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// An open holding together with its security's display fields.
#[derive(Debug, Clone)]
pub struct ValuedHolding {
    /// Security held.
    pub security_id: SecurityId,
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Units held.
    pub quantity: Decimal,
    /// Average cost per unit.
    pub average_cost: Decimal,
    /// Cost basis.
    pub total_cost: Decimal,
}

/// Market view of one holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingValuation {
    /// Security held.
    pub security_id: SecurityId,
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Units held.
    pub quantity: Decimal,
    /// Average cost per unit.
    pub average_cost: Decimal,
    /// Cost basis.
    pub total_cost: Decimal,
    /// Latest close, or the average cost when no price is known.
    pub current_price: Decimal,
    /// `quantity * current_price`.
    pub market_value: Decimal,
    /// `market_value - total_cost`.
    pub unrealized_pnl: Decimal,
    /// P&L as a percentage of cost, two decimal places.
    pub unrealized_pct: Decimal,
}

/// Aggregated valuation of a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    /// Portfolio valued.
    pub portfolio_id: PortfolioId,
    /// Sum of cost bases.
    pub total_cost: Decimal,
    /// Sum of market values.
    pub total_market_value: Decimal,
    /// `total_market_value - total_cost`.
    pub total_unrealized_pnl: Decimal,
    /// Portfolio-level P&L percentage, two decimal places.
    pub total_unrealized_pct: Decimal,
    /// Per-holding breakdown.
    pub holdings: Vec<HoldingValuation>,
}

/// One day of OHLCV data for a security.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPrice {
    /// Security priced.
    pub security_id: SecurityId,
    /// Trading day.
    pub date: NaiveDate,
    /// Opening price.
    pub open: Decimal,
    /// Session high.
    pub high: Decimal,
    /// Session low.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Units traded.
    pub volume: i64,
}
