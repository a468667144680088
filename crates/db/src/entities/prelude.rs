//! `SeaORM` entity prelude.

pub use super::accounts::Entity as Accounts;
pub use super::budgets::Entity as Budgets;
pub use super::categories::Entity as Categories;
pub use super::holdings::Entity as Holdings;
pub use super::portfolios::Entity as Portfolios;
pub use super::price_history::Entity as PriceHistory;
pub use super::recurring_transactions::Entity as RecurringTransactions;
pub use super::securities::Entity as Securities;
pub use super::trades::Entity as Trades;
pub use super::transactions::Entity as Transactions;
