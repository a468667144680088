//! Holding engine.
//!
//! Rebuilds the current position of one security inside one portfolio from its
//! complete trade history, using weighted-average cost:
//! - Buys blend into a single running cost basis, fee included
//! - Sells consume at the pre-sell average cost; sell fees do not touch the basis
//! - A position that reaches zero (or below) is settled and has no holding row

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::HoldingEngine;
pub use error::HoldingError;
pub use types::{HoldingSnapshot, NewTrade, Position, TradeRecord, TradeSide};
