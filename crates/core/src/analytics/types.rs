//! Analytics data types.

use bux_shared::types::{BudgetId, CategoryId, UserId};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AnalyticsError;
use crate::balance::TransactionType;

/// Total of completed transactions for one (category, type) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Category, `None` for uncategorised transactions.
    pub category_id: Option<CategoryId>,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Sum of amounts.
    pub total: Decimal,
    /// Number of transactions.
    pub count: i64,
}

/// Raw month aggregate as returned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRow {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Sum of amounts.
    pub total: Decimal,
}

/// Income and expense of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Sum of income.
    pub income: Decimal,
    /// Sum of expenses.
    pub expense: Decimal,
    /// `income - expense`.
    pub net: Decimal,
}

/// One month of a trend, with the preceding month for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendItem {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Sum of income.
    pub income: Decimal,
    /// Sum of expenses.
    pub expense: Decimal,
    /// `income - expense`.
    pub net: Decimal,
    /// Income of the preceding month, `None` for the first item.
    pub prev_income: Option<Decimal>,
    /// Expenses of the preceding month, `None` for the first item.
    pub prev_expense: Option<Decimal>,
}

/// Income/expense summary over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    /// Sum of income.
    pub total_income: Decimal,
    /// Sum of expenses.
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub net: Decimal,
    /// Totals per category, largest first.
    pub by_category: Vec<CategoryTotal>,
    /// Totals per month, oldest first.
    pub by_month: Vec<MonthlyTotal>,
}

/// Budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// Calendar month.
    Monthly,
    /// Calendar year.
    Yearly,
}

impl BudgetPeriod {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Returns the half-open `[start, end)` window containing `month`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if the window end is not representable.
    pub fn window(self, month: NaiveDate) -> Result<(NaiveDate, NaiveDate), AnalyticsError> {
        let start = match self {
            Self::Monthly => NaiveDate::from_ymd_opt(month.year(), month.month(), 1),
            Self::Yearly => NaiveDate::from_ymd_opt(month.year(), 1, 1),
        }
        .ok_or(AnalyticsError::InvalidDateRange)?;
        let months = match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        };
        let end = start
            .checked_add_months(chrono::Months::new(months))
            .ok_or(AnalyticsError::InvalidDateRange)?;
        Ok((start, end))
    }
}

impl std::str::FromStr for BudgetPeriod {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(AnalyticsError::InvalidPeriod(other.to_string())),
        }
    }
}

/// A spending budget for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Budget {
    /// Budget id.
    pub id: BudgetId,
    /// Owning user.
    pub user_id: UserId,
    /// Category whose expenses count against the budget.
    pub category_id: CategoryId,
    /// Budgeted amount per period.
    pub amount: Decimal,
    /// Period length.
    pub period: BudgetPeriod,
}

/// Budget versus actual spending for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    /// Budget id.
    pub budget_id: BudgetId,
    /// Category tracked.
    pub category_id: CategoryId,
    /// Period length.
    pub period: BudgetPeriod,
    /// First day of the evaluated window.
    pub period_start: NaiveDate,
    /// Budgeted amount.
    pub budget_amount: Decimal,
    /// Completed expenses in the window.
    pub spent: Decimal,
    /// `budget_amount - spent`; negative when over budget.
    pub remaining: Decimal,
    /// `spent / budget_amount * 100`, two places; zero for a zero budget.
    pub spent_percent: Decimal,
}
