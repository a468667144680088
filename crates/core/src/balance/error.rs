//! Balance mutator error types.

use bux_shared::types::{AccountId, CategoryId, InvalidCurrencyCode, TransactionId};
use thiserror::Error;

/// Errors that can occur while posting a transaction.
#[derive(Debug, Error)]
pub enum BalanceError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// A value has more decimal places or digits than its column stores.
    #[error("{0} exceeds the stored precision")]
    OutOfRange(&'static str),

    /// Currency is not a three-letter code.
    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    /// Type is not income, expense or transfer.
    #[error("Invalid transaction type '{0}'")]
    InvalidTransactionType(String),

    /// Status is not pending, completed or failed.
    #[error("Invalid transaction status '{0}'")]
    InvalidTransactionStatus(String),

    /// Transfer destination equals its source.
    #[error("Transfer destination must differ from the source account")]
    SameAccountTransfer,

    /// A destination was supplied for income or expense.
    #[error("Only transfers may have a destination account")]
    DestinationOnNonTransfer,

    /// Transfer without a destination.
    #[error("Transfer requires a destination account")]
    DestinationAccountRequired,

    // ========== Account Errors ==========
    /// Source account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Destination account not found.
    #[error("Destination account not found: {0}")]
    DestinationAccountNotFound(AccountId),

    /// Account belongs to another user.
    #[error("Access denied to account {0}")]
    AccessDenied(AccountId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Transaction belongs to another user.
    #[error("Access denied to transaction {0}")]
    TransactionAccessDenied(TransactionId),

    // ========== Category Errors ==========
    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Category belongs to another user.
    #[error("Access denied to category {0}")]
    CategoryAccessDenied(CategoryId),
}

impl From<InvalidCurrencyCode> for BalanceError {
    fn from(err: InvalidCurrencyCode) -> Self {
        Self::InvalidCurrency(err.0)
    }
}

impl BalanceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::OutOfRange(_) => "VALUE_OUT_OF_RANGE",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::InvalidTransactionType(_) => "INVALID_TRANSACTION_TYPE",
            Self::InvalidTransactionStatus(_) => "INVALID_TRANSACTION_STATUS",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::DestinationOnNonTransfer => "DESTINATION_ON_NON_TRANSFER",
            Self::DestinationAccountRequired => "DESTINATION_ACCOUNT_REQUIRED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DestinationAccountNotFound(_) => "DESTINATION_ACCOUNT_NOT_FOUND",
            Self::AccessDenied(_)
            | Self::TransactionAccessDenied(_)
            | Self::CategoryAccessDenied(_) => "ACCESS_DENIED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NonPositiveAmount
            | Self::OutOfRange(_)
            | Self::InvalidCurrency(_)
            | Self::InvalidTransactionType(_)
            | Self::InvalidTransactionStatus(_)
            | Self::SameAccountTransfer
            | Self::DestinationOnNonTransfer
            | Self::DestinationAccountRequired => 400,

            // 403 Forbidden
            Self::AccessDenied(_)
            | Self::TransactionAccessDenied(_)
            | Self::CategoryAccessDenied(_) => 403,

            // 404 Not Found
            Self::AccountNotFound(_)
            | Self::DestinationAccountNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::CategoryNotFound(_) => 404,

        }
    }
}
