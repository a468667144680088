//! Income/expense aggregates and budget tracking.
//!
//! Storage runs the grouping queries; this module shapes their rows into
//! summaries and derives budget remaining and utilization.

pub mod error;
pub mod service;
pub mod types;

pub use error::AnalyticsError;
pub use service::AnalyticsService;
pub use types::{
    Budget, BudgetPeriod, BudgetStatus, CategoryTotal, MonthlyRow, MonthlyTotal,
    TransactionSummary, TrendItem,
};
