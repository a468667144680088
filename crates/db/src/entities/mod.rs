//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod holdings;
pub mod portfolios;
pub mod price_history;
pub mod recurring_transactions;
pub mod sea_orm_active_enums;
pub mod securities;
pub mod trades;
pub mod transactions;
