//! Analytics error types.

use bux_shared::types::{BudgetId, CategoryId};
use thiserror::Error;

/// Errors that can occur in analytics, budget and category operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Period is not monthly or yearly.
    #[error("Invalid budget period '{0}'")]
    InvalidPeriod(String),

    /// Budget amount must be strictly positive.
    #[error("Budget amount must be greater than zero")]
    NonPositiveBudget,

    /// Budget amount has more decimal places or digits than the column stores.
    #[error("Budget amount exceeds the stored precision")]
    BudgetOutOfRange,

    /// Range start is after its end, or a date is out of range.
    #[error("Invalid date range")]
    InvalidDateRange,

    /// Trend window is outside 1..=24 months.
    #[error("Trend window must be between 1 and 24 months, got {0}")]
    InvalidTrendMonths(u32),

    /// Top-category limit is outside 1..=100.
    #[error("Limit must be between 1 and 100, got {0}")]
    InvalidLimit(usize),

    /// Insights rank income or expense only.
    #[error("Invalid insight type '{0}', expected 'income' or 'expense'")]
    InvalidInsightType(String),

    /// Category name is blank.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Category belongs to another user.
    #[error("Access denied to category {0}")]
    AccessDenied(CategoryId),

    /// Budget not found.
    #[error("Budget not found: {0}")]
    BudgetNotFound(BudgetId),

    /// Budget belongs to another user.
    #[error("Access denied to budget {0}")]
    BudgetAccessDenied(BudgetId),
}

impl AnalyticsError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod(_) => "INVALID_BUDGET_PERIOD",
            Self::NonPositiveBudget => "NON_POSITIVE_BUDGET",
            Self::BudgetOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::InvalidTrendMonths(_) => "INVALID_TREND_MONTHS",
            Self::InvalidLimit(_) => "INVALID_LIMIT",
            Self::InvalidInsightType(_) => "INVALID_INSIGHT_TYPE",
            Self::EmptyCategoryName => "EMPTY_CATEGORY_NAME",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::BudgetNotFound(_) => "BUDGET_NOT_FOUND",
            Self::AccessDenied(_) | Self::BudgetAccessDenied(_) => "ACCESS_DENIED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod(_)
            | Self::NonPositiveBudget
            | Self::BudgetOutOfRange
            | Self::InvalidDateRange
            | Self::InvalidTrendMonths(_)
            | Self::InvalidLimit(_)
            | Self::InvalidInsightType(_)
            | Self::EmptyCategoryName => 400,
            Self::AccessDenied(_) | Self::BudgetAccessDenied(_) => 403,
            Self::CategoryNotFound(_) | Self::BudgetNotFound(_) => 404,
        }
    }
}
