//! Analytics repository: categories, budgets and income/expense aggregates.
//!
//! Only completed income and expense transactions count. Transfers move money
//! between a user's own accounts and are excluded from every aggregate.

use bux_core::analytics::{
    AnalyticsError, AnalyticsService, Budget, BudgetPeriod, BudgetStatus, CategoryTotal,
    MonthlyRow, TransactionSummary, TrendItem,
};
use bux_core::balance::TransactionType as CoreTransactionType;
use bux_shared::types::{BudgetId, CategoryId, UserId};
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement,
};

use crate::entities::sea_orm_active_enums::{TransactionStatus, TransactionType};
use crate::entities::{budgets, categories, transactions};

/// Error types for analytics, category and budget operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Validation, lookup or ownership failure.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// A category with this name already exists for the user.
    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),

    /// The category already has a budget for this period.
    #[error("A budget for this category and period already exists")]
    DuplicateBudget,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Analytics(e) => e.error_code(),
            Self::DuplicateCategory(_) => "DUPLICATE_CATEGORY",
            Self::DuplicateBudget => "DUPLICATE_BUDGET",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Analytics(e) => e.http_status_code(),
            Self::DuplicateCategory(_) | Self::DuplicateBudget => 409,
            Self::Database(_) => 500,
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Converts a calendar day to midnight UTC.
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Owning user.
    pub user_id: UserId,
    /// Category tracked.
    pub category_id: CategoryId,
    /// Amount per period, strictly positive.
    pub amount: Decimal,
    /// Period length.
    pub period: BudgetPeriod,
}

/// Changes to a budget. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetInput {
    /// New amount per period, strictly positive.
    pub amount: Option<Decimal>,
    /// New period length.
    pub period: Option<BudgetPeriod>,
}

#[derive(Debug, FromQueryResult)]
struct CategoryRow {
    category_id: Option<i64>,
    transaction_type: TransactionType,
    total: Decimal,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct MonthRow {
    year: i32,
    month: i32,
    transaction_type: TransactionType,
    total: Decimal,
}

/// Monthly totals, grouped in UTC.
const MONTHLY_TOTALS_SQL: &str = r"
SELECT
    EXTRACT(YEAR FROM transaction_date AT TIME ZONE 'UTC')::int4 AS year,
    EXTRACT(MONTH FROM transaction_date AT TIME ZONE 'UTC')::int4 AS month,
    transaction_type::text AS transaction_type,
    SUM(amount) AS total
FROM transactions
WHERE user_id = $1
  AND status = 'completed'
  AND transaction_type <> 'transfer'
  AND transaction_date >= $2
  AND transaction_date < $3
GROUP BY 1, 2, 3
ORDER BY 1, 2
";

/// Analytics repository for categories, budgets and summaries.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    db: DatabaseConnection,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Creates a category; names are trimmed and unique per user.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCategoryName`, `DuplicateCategory` or a database error.
    pub async fn create_category(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<categories::Model, ReportError> {
        let name = AnalyticsService::normalize_category_name(name)?;
        let category = categories::ActiveModel {
            user_id: Set(user_id.into()),
            name: Set(name.clone()),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        match category.insert(&self.db).await {
            Ok(category) => Ok(category),
            Err(e) if is_unique_violation(&e) => Err(ReportError::DuplicateCategory(name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists a user's categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories(
        &self,
        user_id: UserId,
    ) -> Result<Vec<categories::Model>, ReportError> {
        let rows = categories::Entity::find()
            .filter(categories::Column::UserId.eq(i64::from(user_id)))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    /// Creates a budget for one of the user's categories.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveBudget`, `CategoryNotFound`, `AccessDenied`,
    /// `DuplicateBudget` or a database error.
    pub async fn create_budget(
        &self,
        input: CreateBudgetInput,
    ) -> Result<budgets::Model, ReportError> {
        AnalyticsService::validate_budget_amount(input.amount)?;

        let category = categories::Entity::find_by_id(i64::from(input.category_id))
            .one(&self.db)
            .await?
            .ok_or(AnalyticsError::CategoryNotFound(input.category_id))?;
        if category.user_id != i64::from(input.user_id) {
            return Err(AnalyticsError::AccessDenied(input.category_id).into());
        }

        let now = Utc::now().fixed_offset();
        let budget = budgets::ActiveModel {
            user_id: Set(input.user_id.into()),
            category_id: Set(input.category_id.into()),
            amount: Set(input.amount),
            period: Set(input.period.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match budget.insert(&self.db).await {
            Ok(budget) => {
                tracing::info!(
                    budget_id = budget.id,
                    category_id = %input.category_id,
                    period = input.period.as_str(),
                    "Budget created"
                );
                Ok(budget)
            }
            Err(e) if is_unique_violation(&e) => Err(ReportError::DuplicateBudget),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists a user's budgets by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_budgets(&self, user_id: UserId) -> Result<Vec<budgets::Model>, ReportError> {
        let rows = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(i64::from(user_id)))
            .order_by_asc(budgets::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Loads a budget, checking existence before ownership.
    ///
    /// # Errors
    ///
    /// Returns `BudgetNotFound` (404), `BudgetAccessDenied` (403) or a database error.
    pub async fn get_budget(
        &self,
        budget_id: BudgetId,
        user_id: UserId,
    ) -> Result<budgets::Model, ReportError> {
        let budget = budgets::Entity::find_by_id(i64::from(budget_id))
            .one(&self.db)
            .await?
            .ok_or(AnalyticsError::BudgetNotFound(budget_id))?;
        if budget.user_id != i64::from(user_id) {
            return Err(AnalyticsError::BudgetAccessDenied(budget_id).into());
        }
        Ok(budget)
    }

    /// Changes a budget's amount and/or period.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveBudget`, `BudgetOutOfRange`, `BudgetNotFound`,
    /// `BudgetAccessDenied`, `DuplicateBudget` when the category already has a
    /// budget for the new period, or a database error.
    pub async fn update_budget(
        &self,
        budget_id: BudgetId,
        user_id: UserId,
        input: UpdateBudgetInput,
    ) -> Result<budgets::Model, ReportError> {
        if let Some(amount) = input.amount {
            AnalyticsService::validate_budget_amount(amount)?;
        }
        let budget = self.get_budget(budget_id, user_id).await?;

        let mut budget: budgets::ActiveModel = budget.into();
        if let Some(amount) = input.amount {
            budget.amount = Set(amount);
        }
        if let Some(period) = input.period {
            budget.period = Set(period.into());
        }
        budget.updated_at = Set(Utc::now().fixed_offset());

        match budget.update(&self.db).await {
            Ok(budget) => {
                tracing::info!(budget_id = %budget_id, "Budget updated");
                Ok(budget)
            }
            Err(e) if is_unique_violation(&e) => Err(ReportError::DuplicateBudget),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetNotFound`, `BudgetAccessDenied` or a database error.
    pub async fn delete_budget(&self, budget_id: BudgetId, user_id: UserId) -> Result<(), ReportError> {
        self.get_budget(budget_id, user_id).await?;
        budgets::Entity::delete_by_id(i64::from(budget_id))
            .exec(&self.db)
            .await?;

        tracing::info!(budget_id = %budget_id, "Budget deleted");
        Ok(())
    }

    /// Compares every budget of a user with spending in the period containing `month`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a database error.
    pub async fn budget_status(
        &self,
        user_id: UserId,
        month: NaiveDate,
    ) -> Result<Vec<BudgetStatus>, ReportError> {
        let rows = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(i64::from(user_id)))
            .order_by_asc(budgets::Column::Id)
            .all(&self.db)
            .await?;

        let mut statuses = Vec::with_capacity(rows.len());
        for row in rows {
            let budget = Budget {
                id: BudgetId::new(row.id),
                user_id: UserId::new(row.user_id),
                category_id: CategoryId::new(row.category_id),
                amount: row.amount,
                period: row.period.into(),
            };
            let (start, end) = budget.period.window(month)?;
            let spent = self
                .spent(user_id, budget.category_id, day_start(start), day_start(end))
                .await?;
            statuses.push(AnalyticsService::budget_status(&budget, start, spent));
        }
        Ok(statuses)
    }

    /// Sum of completed expenses in a category over `[from, to)`.
    async fn spent(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, ReportError> {
        let total: Option<Option<Decimal>> = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::Amount).sum(), "total")
            .filter(transactions::Column::UserId.eq(i64::from(user_id)))
            .filter(transactions::Column::CategoryId.eq(i64::from(category_id)))
            .filter(transactions::Column::TransactionType.eq(TransactionType::Expense))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .filter(transactions::Column::TransactionDate.gte(from.fixed_offset()))
            .filter(transactions::Column::TransactionDate.lt(to.fixed_offset()))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or_default())
    }

    // ========================================================================
    // Summaries
    // ========================================================================

    /// Income/expense summary over the inclusive day range `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a database error.
    pub async fn summary(
        &self,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TransactionSummary, ReportError> {
        AnalyticsService::validate_range(from, to)?;
        let start = day_start(from);
        let end = to
            .checked_add_days(Days::new(1))
            .map(day_start)
            .ok_or(AnalyticsError::InvalidDateRange)?;

        let by_category = self.summary_by_category(user_id, start, end).await?;
        let by_month = self.summary_by_month(user_id, start, end).await?;
        Ok(AnalyticsService::summarize(
            by_category,
            AnalyticsService::fold_months(by_month),
        ))
    }

    /// Month-by-month income and expense for the `months` calendar months
    /// ending with the one containing `today`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTrendMonths` or a database error.
    pub async fn trends(
        &self,
        user_id: UserId,
        months: u32,
        today: NaiveDate,
    ) -> Result<Vec<TrendItem>, ReportError> {
        let (start, last) = AnalyticsService::trend_window(months, today)?;
        let end = last
            .checked_add_days(Days::new(1))
            .map(day_start)
            .ok_or(AnalyticsError::InvalidDateRange)?;

        let rows = self.summary_by_month(user_id, day_start(start), end).await?;
        Ok(AnalyticsService::trends(
            start,
            months,
            &AnalyticsService::fold_months(rows),
        ))
    }

    /// The largest categories of one transaction type over the inclusive day
    /// range `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `InvalidInsightType`, `InvalidLimit` or a
    /// database error.
    pub async fn top_categories(
        &self,
        user_id: UserId,
        transaction_type: CoreTransactionType,
        limit: usize,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotal>, ReportError> {
        AnalyticsService::validate_range(from, to)?;
        // Reject bad parameters before querying.
        AnalyticsService::top_categories(Vec::new(), transaction_type, limit)?;
        let end = to
            .checked_add_days(Days::new(1))
            .map(day_start)
            .ok_or(AnalyticsError::InvalidDateRange)?;

        let by_category = self.summary_by_category(user_id, day_start(from), end).await?;
        AnalyticsService::top_categories(by_category, transaction_type, limit).map_err(Into::into)
    }

    async fn summary_by_category(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CategoryTotal>, ReportError> {
        let rows = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::CategoryId)
            .column(transactions::Column::TransactionType)
            .column_as(Expr::col(transactions::Column::Amount).sum(), "total")
            .column_as(Expr::col(transactions::Column::Id).count(), "count")
            .filter(transactions::Column::UserId.eq(i64::from(user_id)))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .filter(transactions::Column::TransactionType.ne(TransactionType::Transfer))
            .filter(transactions::Column::TransactionDate.gte(from.fixed_offset()))
            .filter(transactions::Column::TransactionDate.lt(to.fixed_offset()))
            .group_by(transactions::Column::CategoryId)
            .group_by(transactions::Column::TransactionType)
            .into_model::<CategoryRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryTotal {
                category_id: r.category_id.map(CategoryId::new),
                transaction_type: r.transaction_type.into(),
                total: r.total,
                count: r.count,
            })
            .collect())
    }

    async fn summary_by_month(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MonthlyRow>, ReportError> {
        let rows = MonthRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            MONTHLY_TOTALS_SQL,
            [
                i64::from(user_id).into(),
                from.fixed_offset().into(),
                to.fixed_offset().into(),
            ],
        ))
        .all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                Some(MonthlyRow {
                    year: r.year,
                    month: u32::try_from(r.month).ok()?,
                    transaction_type: r.transaction_type.into(),
                    total: r.total,
                })
            })
            .collect())
    }
}
