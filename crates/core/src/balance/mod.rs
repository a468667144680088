//! Balance mutation for ledger transactions.
//!
//! Account balances are a cache over the transaction ledger. This module decides
//! which accounts a transaction touches and by how much; storage adapters apply
//! the resulting plan together with the transaction row in one unit.
//!
//! - Income credits the source account
//! - Expense debits the source account
//! - Transfer debits the source and credits the destination
//! - Only completed transactions move balances; overdrafts are allowed

pub mod error;
pub mod mutator;
pub mod types;

#[cfg(test)]
mod mutator_props;

pub use error::BalanceError;
pub use mutator::BalanceMutator;
pub use types::{
    AccountReconciliation, AccountSnapshot, BalanceChange, BalanceDelta, BalancePlan, LedgerEntry,
    NewTransaction, TransactionStatus, TransactionType,
};
