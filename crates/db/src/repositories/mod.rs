//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod analytics;
pub mod holding;
pub mod portfolio;
pub mod price;
pub mod recurring;
pub mod transaction;

pub use account::{AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use analytics::{AnalyticsRepository, CreateBudgetInput, ReportError, UpdateBudgetInput};
pub use holding::{HoldingRepository, TradeOutcome};
pub use portfolio::{CreatePortfolioInput, CreateSecurityInput, InvestmentError, PortfolioRepository};
pub use price::PriceRepository;
pub use recurring::{ExecutedRule, RecurringRepository, SchedulerError};
pub use transaction::{PostedTransaction, TransactionError, TransactionRepository};
