//! Core business logic for Bux.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage adapters load rows, hand them to the functions here, and persist what
//! comes back.
//!
//! # Modules
//!
//! - `replay` - Folding an append-only event log into derived state
//! - `holding` - Weighted-average position reconstruction from trades
//! - `valuation` - Market value and unrealized P&L of a portfolio
//! - `balance` - Signed balance deltas for income, expense and transfers
//! - `recurring` - Recurrence cursor advancement and firing decisions
//! - `analytics` - Income/expense aggregates and budget status

pub mod analytics;
pub mod balance;
pub mod holding;
pub mod recurring;
pub mod replay;
pub mod valuation;
