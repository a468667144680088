//! Trade and position types.

use bux_shared::types::{PortfolioId, SecurityId, TradeId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::HoldingError;
use crate::replay::LedgerEvent;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Acquire units.
    Buy,
    /// Dispose of units.
    Sell,
}

impl TradeSide {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradeSide {
    type Err = HoldingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(HoldingError::InvalidSide(other.to_string())),
        }
    }
}

/// A trade about to be appended to the ledger.
#[derive(Debug, Clone)]
pub struct NewTrade {
    /// Portfolio the trade belongs to.
    pub portfolio_id: PortfolioId,
    /// Security traded.
    pub security_id: SecurityId,
    /// Buy or sell.
    pub side: TradeSide,
    /// Units traded, strictly positive.
    pub quantity: Decimal,
    /// Price per unit, strictly positive.
    pub price: Decimal,
    /// Commission, zero or more.
    pub fee: Decimal,
    /// When the trade happened.
    pub trade_date: DateTime<Utc>,
    /// Free-form note.
    pub note: Option<String>,
}

/// A persisted trade, as seen by the replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    /// Database id; breaks ties between trades on the same date.
    pub id: TradeId,
    /// Buy or sell.
    pub side: TradeSide,
    /// Units traded.
    pub quantity: Decimal,
    /// Price per unit.
    pub price: Decimal,
    /// Commission.
    pub fee: Decimal,
    /// When the trade happened.
    pub trade_date: DateTime<Utc>,
}

/// Running position while replaying trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Units held.
    pub quantity: Decimal,
    /// Cost basis of the units held.
    pub total_cost: Decimal,
}

impl LedgerEvent for TradeRecord {
    type State = Position;

    fn apply(&self, position: &mut Position) {
        match self.side {
            TradeSide::Buy => {
                position.quantity += self.quantity;
                position.total_cost += self.quantity * self.price + self.fee;
            }
            TradeSide::Sell => {
                let average_cost = if position.quantity > Decimal::ZERO {
                    position.total_cost / position.quantity
                } else {
                    Decimal::ZERO
                };
                position.quantity -= self.quantity;
                if position.quantity > Decimal::ZERO {
                    position.total_cost = position.quantity * average_cost;
                } else {
                    position.quantity = Decimal::ZERO;
                    position.total_cost = Decimal::ZERO;
                }
            }
        }
    }
}

/// The cached holding row for an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HoldingSnapshot {
    /// Units held, strictly positive.
    pub quantity: Decimal,
    /// `total_cost / quantity`.
    pub average_cost: Decimal,
    /// Cost basis.
    pub total_cost: Decimal,
}

impl HoldingSnapshot {
    /// Returns true when `total_cost == quantity * average_cost` within `tolerance`.
    #[must_use]
    pub fn is_consistent(&self, tolerance: Decimal) -> bool {
        (self.quantity * self.average_cost - self.total_cost).abs() <= tolerance
    }
}

impl Position {
    /// Converts the final replay state into a holding row, or `None` if settled.
    #[must_use]
    pub fn snapshot(&self) -> Option<HoldingSnapshot> {
        if self.quantity <= Decimal::ZERO {
            return None;
        }
        Some(HoldingSnapshot {
            quantity: self.quantity,
            average_cost: self.total_cost / self.quantity,
            total_cost: self.total_cost,
        })
    }
}
