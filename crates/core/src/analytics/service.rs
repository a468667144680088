//! Analytics service for summaries and budget status.

use std::collections::BTreeMap;

use bux_shared::types::MONEY;
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use super::error::AnalyticsError;
use super::types::{
    Budget, BudgetStatus, CategoryTotal, MonthlyRow, MonthlyTotal, TransactionSummary, TrendItem,
};
use crate::balance::TransactionType;

/// Longest trend window, in months.
pub const MAX_TREND_MONTHS: u32 = 24;

/// Largest top-category ranking.
pub const MAX_TOP_CATEGORIES: usize = 100;

/// Analytics service for business logic.
pub struct AnalyticsService;

impl AnalyticsService {
    /// Validates an inclusive `[from, to]` reporting range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when `from` is after `to`.
    pub fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<(), AnalyticsError> {
        if from > to {
            return Err(AnalyticsError::InvalidDateRange);
        }
        Ok(())
    }

    /// Validates a budget amount.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveBudget` unless the amount is strictly positive,
    /// `BudgetOutOfRange` if it does not fit a money column.
    pub fn validate_budget_amount(amount: Decimal) -> Result<(), AnalyticsError> {
        if amount <= Decimal::ZERO {
            return Err(AnalyticsError::NonPositiveBudget);
        }
        if !MONEY.fits(amount) {
            return Err(AnalyticsError::BudgetOutOfRange);
        }
        Ok(())
    }

    /// Validates and trims a category name.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCategoryName` for a blank name.
    pub fn normalize_category_name(name: &str) -> Result<String, AnalyticsError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AnalyticsError::EmptyCategoryName);
        }
        Ok(trimmed.to_string())
    }

    /// Merges per-type month rows into one row per month, oldest first.
    ///
    /// Transfer rows are ignored; they move money without earning or spending it.
    #[must_use]
    pub fn fold_months(rows: Vec<MonthlyRow>) -> Vec<MonthlyTotal> {
        let mut months: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
        for row in rows {
            let entry = months.entry((row.year, row.month)).or_default();
            match row.transaction_type {
                TransactionType::Income => entry.0 += row.total,
                TransactionType::Expense => entry.1 += row.total,
                TransactionType::Transfer => {}
            }
        }
        months
            .into_iter()
            .map(|((year, month), (income, expense))| MonthlyTotal {
                year,
                month,
                income,
                expense,
                net: income - expense,
            })
            .collect()
    }

    /// Builds the range summary from the category and month aggregates.
    #[must_use]
    pub fn summarize(
        mut by_category: Vec<CategoryTotal>,
        by_month: Vec<MonthlyTotal>,
    ) -> TransactionSummary {
        by_category.sort_by(|a, b| b.total.cmp(&a.total));

        let total_of = |kind: TransactionType| -> Decimal {
            by_category
                .iter()
                .filter(|c| c.transaction_type == kind)
                .map(|c| c.total)
                .sum()
        };
        let total_income = total_of(TransactionType::Income);
        let total_expense = total_of(TransactionType::Expense);

        TransactionSummary {
            total_income,
            total_expense,
            net: total_income - total_expense,
            by_category,
            by_month,
        }
    }

    /// Returns the inclusive `[first day, today]` range covering the last
    /// `months` calendar months, the current one included.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTrendMonths` outside `1..=24`.
    pub fn trend_window(months: u32, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AnalyticsError> {
        if months == 0 || months > MAX_TREND_MONTHS {
            return Err(AnalyticsError::InvalidTrendMonths(months));
        }
        let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
            .and_then(|first| first.checked_sub_months(Months::new(months - 1)))
            .ok_or(AnalyticsError::InvalidDateRange)?;
        Ok((start, today))
    }

    /// Lays `months` consecutive calendar months from `start` over the month
    /// totals. Months without transactions appear with zero totals.
    #[must_use]
    pub fn trends(start: NaiveDate, months: u32, totals: &[MonthlyTotal]) -> Vec<TrendItem> {
        let mut items: Vec<TrendItem> = Vec::new();
        for offset in 0..months {
            let Some(day) = start.checked_add_months(Months::new(offset)) else {
                break;
            };
            let (year, month) = (day.year(), day.month());
            let (income, expense) = totals
                .iter()
                .find(|t| t.year == year && t.month == month)
                .map_or((Decimal::ZERO, Decimal::ZERO), |t| (t.income, t.expense));
            let previous = items.last();
            items.push(TrendItem {
                year,
                month,
                income,
                expense,
                net: income - expense,
                prev_income: previous.map(|p| p.income),
                prev_expense: previous.map(|p| p.expense),
            });
        }
        items
    }

    /// Ranks the categories of one transaction type by total, largest first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInsightType` for transfers, `InvalidLimit` outside `1..=100`.
    pub fn top_categories(
        mut by_category: Vec<CategoryTotal>,
        transaction_type: TransactionType,
        limit: usize,
    ) -> Result<Vec<CategoryTotal>, AnalyticsError> {
        if transaction_type == TransactionType::Transfer {
            return Err(AnalyticsError::InvalidInsightType(
                transaction_type.as_str().to_string(),
            ));
        }
        if limit == 0 || limit > MAX_TOP_CATEGORIES {
            return Err(AnalyticsError::InvalidLimit(limit));
        }
        by_category.retain(|c| c.transaction_type == transaction_type);
        by_category.sort_by(|a, b| b.total.cmp(&a.total));
        by_category.truncate(limit);
        Ok(by_category)
    }

    /// Compares a budget with what was spent in the window starting at `period_start`.
    #[must_use]
    pub fn budget_status(budget: &Budget, period_start: NaiveDate, spent: Decimal) -> BudgetStatus {
        let spent_percent = if budget.amount.is_zero() {
            Decimal::ZERO
        } else {
            (spent / budget.amount * Decimal::ONE_HUNDRED).round_dp(2)
        };

        BudgetStatus {
            budget_id: budget.id,
            category_id: budget.category_id,
            period: budget.period,
            period_start,
            budget_amount: budget.amount,
            spent,
            remaining: budget.amount - spent,
            spent_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::BudgetPeriod;
    use bux_shared::types::{BudgetId, CategoryId, UserId};
    use rust_decimal_macros::dec;

    fn budget(amount: Decimal) -> Budget {
        Budget {
            id: BudgetId::new(1),
            user_id: UserId::new(1),
            category_id: CategoryId::new(4),
            amount,
            period: BudgetPeriod::Monthly,
        }
    }

    fn month_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_budget_under_spent() {
        let status = AnalyticsService::budget_status(&budget(dec!(500)), month_start(), dec!(125));
        assert_eq!(status.remaining, dec!(375));
        assert_eq!(status.spent_percent, dec!(25.00));
    }

    #[test]
    fn test_budget_over_spent() {
        let status = AnalyticsService::budget_status(&budget(dec!(300)), month_start(), dec!(400));
        assert_eq!(status.remaining, dec!(-100));
        assert_eq!(status.spent_percent, dec!(133.33));
    }

    #[test]
    fn test_zero_budget_percent_is_zero() {
        let status = AnalyticsService::budget_status(&budget(dec!(0)), month_start(), dec!(50));
        assert_eq!(status.spent_percent, Decimal::ZERO);
        assert_eq!(status.remaining, dec!(-50));
    }

    #[test]
    fn test_fold_months_merges_and_orders() {
        let row = |year, month, kind, total| MonthlyRow {
            year,
            month,
            transaction_type: kind,
            total,
        };
        let months = AnalyticsService::fold_months(vec![
            row(2024, 3, TransactionType::Expense, dec!(40)),
            row(2024, 1, TransactionType::Income, dec!(100)),
            row(2024, 3, TransactionType::Income, dec!(70)),
            row(2023, 12, TransactionType::Expense, dec!(5)),
            row(2024, 1, TransactionType::Transfer, dec!(999)),
        ]);
        assert_eq!(months.len(), 3);
        assert_eq!((months[0].year, months[0].month), (2023, 12));
        assert_eq!(months[0].net, dec!(-5));
        assert_eq!(months[1].income, dec!(100));
        assert_eq!(months[1].expense, dec!(0));
        assert_eq!(months[2].net, dec!(30));
    }

    #[test]
    fn test_summarize_totals_and_ordering() {
        let total = |cat: i64, kind, amount| CategoryTotal {
            category_id: Some(CategoryId::new(cat)),
            transaction_type: kind,
            total: amount,
            count: 1,
        };
        let summary = AnalyticsService::summarize(
            vec![
                total(1, TransactionType::Expense, dec!(20)),
                total(2, TransactionType::Income, dec!(500)),
                total(3, TransactionType::Expense, dec!(80)),
            ],
            Vec::new(),
        );
        assert_eq!(summary.total_income, dec!(500));
        assert_eq!(summary.total_expense, dec!(100));
        assert_eq!(summary.net, dec!(400));
        assert_eq!(summary.by_category[0].total, dec!(500));
        assert_eq!(summary.by_category[2].total, dec!(20));
    }

    #[test]
    fn test_validation_helpers() {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        assert!(AnalyticsService::validate_range(d(1), d(2)).is_ok());
        assert!(AnalyticsService::validate_range(d(1), d(1)).is_ok());
        assert!(matches!(
            AnalyticsService::validate_range(d(3), d(2)),
            Err(AnalyticsError::InvalidDateRange)
        ));
        assert!(AnalyticsService::validate_budget_amount(dec!(0)).is_err());
        assert!(matches!(
            AnalyticsService::validate_budget_amount(dec!(10.00001)),
            Err(AnalyticsError::BudgetOutOfRange)
        ));
        assert_eq!(
            AnalyticsService::normalize_category_name("  Groceries ").unwrap(),
            "Groceries"
        );
        assert!(AnalyticsService::normalize_category_name("   ").is_err());
    }

    #[test]
    fn test_trend_window_spans_whole_months() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 18).unwrap();
        assert_eq!(
            AnalyticsService::trend_window(6, today).unwrap(),
            (NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(), today)
        );
        assert_eq!(
            AnalyticsService::trend_window(1, today).unwrap().0,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(matches!(
            AnalyticsService::trend_window(0, today),
            Err(AnalyticsError::InvalidTrendMonths(0))
        ));
        assert!(AnalyticsService::trend_window(25, today).is_err());
    }

    #[test]
    fn test_trends_fill_gaps_and_carry_previous_month() {
        let month = |year, month, income, expense| MonthlyTotal {
            year,
            month,
            income,
            expense,
            net: income - expense,
        };
        let start = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let items = AnalyticsService::trends(
            start,
            4,
            &[
                month(2023, 11, dec!(100), dec!(40)),
                month(2024, 1, dec!(80), dec!(90)),
            ],
        );
        let months: Vec<(i32, u32)> = items.iter().map(|i| (i.year, i.month)).collect();
        assert_eq!(months, vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]);
        assert_eq!(items[0].prev_income, None);
        assert_eq!(items[1].income, dec!(0));
        assert_eq!(items[1].prev_expense, Some(dec!(40)));
        assert_eq!(items[2].net, dec!(-10));
        assert_eq!(items[3].prev_income, Some(dec!(80)));
    }

    #[test]
    fn test_top_categories_filters_ranks_and_limits() {
        let total = |cat: i64, kind, amount| CategoryTotal {
            category_id: Some(CategoryId::new(cat)),
            transaction_type: kind,
            total: amount,
            count: 1,
        };
        let rows = vec![
            total(1, TransactionType::Expense, dec!(20)),
            total(2, TransactionType::Income, dec!(500)),
            total(3, TransactionType::Expense, dec!(80)),
            total(4, TransactionType::Expense, dec!(50)),
        ];
        let top = AnalyticsService::top_categories(rows.clone(), TransactionType::Expense, 2).unwrap();
        let ids: Vec<i64> = top
            .iter()
            .filter_map(|c| c.category_id.map(CategoryId::into_inner))
            .collect();
        assert_eq!(ids, vec![3, 4]);

        assert!(matches!(
            AnalyticsService::top_categories(rows.clone(), TransactionType::Transfer, 5),
            Err(AnalyticsError::InvalidInsightType(_))
        ));
        assert!(matches!(
            AnalyticsService::top_categories(rows, TransactionType::Income, 0),
            Err(AnalyticsError::InvalidLimit(0))
        ));
    }
}
