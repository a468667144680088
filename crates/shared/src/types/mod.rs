//! Common types used across the application.

pub mod currency;
pub mod id;
pub mod numeric;

pub use currency::{CurrencyCode, InvalidCurrencyCode};
pub use id::*;
pub use numeric::{MONEY, NumericColumn, QUANTITY};
