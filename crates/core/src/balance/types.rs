//! Transaction and balance domain types.

use bux_shared::types::{AccountId, CategoryId, CurrencyCode, TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BalanceError;
use crate::replay::LedgerEvent;

/// Kind of ledger transaction. The amount is always positive; direction comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming into the account.
    Income,
    /// Money leaving the account.
    Expense,
    /// Money moving between two accounts of the same user.
    Transfer,
}

impl TransactionType {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(BalanceError::InvalidTransactionType(other.to_string())),
        }
    }
}

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, not yet settled.
    Pending,
    /// Settled; the only status that moves balances.
    #[default]
    Completed,
    /// Did not go through.
    Failed,
}

impl TransactionStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true if a transaction in this status affects balances.
    #[must_use]
    pub const fn moves_balance(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(BalanceError::InvalidTransactionStatus(other.to_string())),
        }
    }
}

/// A transaction about to be posted.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// User posting the transaction.
    pub user_id: UserId,
    /// Source account.
    pub account_id: AccountId,
    /// Destination account, transfers only.
    pub destination_account_id: Option<AccountId>,
    /// Category, for analytics.
    pub category_id: Option<CategoryId>,
    /// Income, expense or transfer.
    pub transaction_type: TransactionType,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Currency label.
    pub currency: CurrencyCode,
    /// Free-form description.
    pub description: Option<String>,
    /// Effective date.
    pub transaction_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: TransactionStatus,
}

/// The part of an account the mutator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Account id.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Cached balance at the time of reading.
    pub balance: Decimal,
}

/// A single account balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceChange {
    /// Account updated.
    pub account_id: AccountId,
    /// Balance before the transaction.
    pub previous: Decimal,
    /// Signed change.
    pub delta: Decimal,
    /// Balance after the transaction.
    pub new_balance: Decimal,
}

/// Every balance update one transaction causes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancePlan {
    /// Updates, source account first.
    pub changes: Vec<BalanceChange>,
}

impl BalancePlan {
    /// Returns true if the transaction does not move any balance.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the new balance of `account_id`, if the plan touches it.
    #[must_use]
    pub fn new_balance(&self, account_id: AccountId) -> Option<Decimal> {
        self.changes
            .iter()
            .find(|c| c.account_id == account_id)
            .map(|c| c.new_balance)
    }
}

/// A persisted transaction touching some account, as read back for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Transaction id.
    pub id: TransactionId,
    /// Source account.
    pub account_id: AccountId,
    /// Destination account, transfers only.
    pub destination_account_id: Option<AccountId>,
    /// Income, expense or transfer.
    pub transaction_type: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: TransactionStatus,
}

/// The signed effect of one transaction on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    /// Transaction that caused it.
    pub transaction_id: TransactionId,
    /// Signed amount.
    pub delta: Decimal,
}

impl LedgerEvent for BalanceDelta {
    type State = Decimal;

    fn apply(&self, balance: &mut Decimal) {
        *balance += self.delta;
    }
}

/// Cached balance compared against a full ledger replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountReconciliation {
    /// Account checked.
    pub account_id: AccountId,
    /// Balance the account was opened with.
    pub opening_balance: Decimal,
    /// Balance stored on the account row.
    pub cached_balance: Decimal,
    /// `opening_balance` plus every completed delta.
    pub ledger_balance: Decimal,
    /// `cached_balance - ledger_balance`.
    pub drift: Decimal,
}

impl AccountReconciliation {
    /// Returns true when the cache matches the ledger exactly.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}
