//! Category, budget and summary routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use bux_core::analytics::{
    AnalyticsError, BudgetPeriod, BudgetStatus, CategoryTotal, TransactionSummary, TrendItem,
};
use bux_core::balance::TransactionType;
use bux_db::entities::{budgets, categories};
use bux_db::repositories::{AnalyticsRepository, CreateBudgetInput, UpdateBudgetInput};
use bux_shared::AppError;
use bux_shared::types::{BudgetId, CategoryId};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/status", get(budget_status))
        .route("/budgets/{budget_id}", put(update_budget).delete(delete_budget))
        .route("/analytics/summary", get(summary))
        .route("/analytics/insights/trends", get(trends))
        .route("/analytics/insights/top-categories", get(top_categories))
}

/// Default trend window in months.
const DEFAULT_TREND_MONTHS: u32 = 6;

/// Default number of ranked categories.
const DEFAULT_TOP_LIMIT: usize = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name, unique per user.
    pub name: String,
}

/// Request body for creating a budget.
#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    /// Category tracked.
    pub category_id: i64,
    /// Amount per period.
    pub amount: Decimal,
    /// `monthly` or `yearly`; defaults to `monthly`.
    pub period: Option<String>,
}

/// Request body for changing a budget.
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    /// New amount per period.
    pub amount: Option<Decimal>,
    /// `monthly` or `yearly`.
    pub period: Option<String>,
}

/// Query parameters for monthly trends.
#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    /// Number of months, 1-24; defaults to 6.
    pub months: Option<u32>,
}

/// Query parameters for top categories.
#[derive(Debug, Deserialize)]
pub struct TopCategoriesQuery {
    /// `income` or `expense`; defaults to `expense`.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Number of categories, 1-100; defaults to 10.
    pub limit: Option<usize>,
    /// First day, inclusive; defaults to the first of the current month.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive; defaults to today.
    pub to: Option<NaiveDate>,
}

/// Query parameters for the income/expense summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// First day, inclusive (YYYY-MM-DD).
    pub from: NaiveDate,
    /// Last day, inclusive (YYYY-MM-DD).
    pub to: NaiveDate,
}

/// Query parameters for budget status.
#[derive(Debug, Deserialize)]
pub struct BudgetStatusQuery {
    /// Any day of the month to evaluate; defaults to the current month.
    pub month: Option<NaiveDate>,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: i64,
    /// Name.
    pub name: String,
}

impl From<categories::Model> for CategoryResponse {
    fn from(c: categories::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

/// Response for a budget.
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    /// Budget ID.
    pub id: i64,
    /// Category tracked.
    pub category_id: i64,
    /// Amount per period.
    pub amount: Decimal,
    /// Period length.
    pub period: &'static str,
}

impl From<budgets::Model> for BudgetResponse {
    fn from(b: budgets::Model) -> Self {
        Self {
            id: b.id,
            category_id: b.category_id,
            amount: b.amount,
            period: BudgetPeriod::from(b.period).as_str(),
        }
    }
}

fn repo(state: &AppState) -> AnalyticsRepository {
    AnalyticsRepository::new((*state.db).clone())
}

fn first_of_month(day: NaiveDate) -> Result<NaiveDate, ApiError> {
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1)
        .ok_or_else(|| AppError::Internal("current month is not representable".to_string()).into())
}

/// Parses the ranked transaction type; anything but income or expense is rejected.
fn insight_type(raw: Option<&str>) -> Result<TransactionType, AnalyticsError> {
    match raw {
        None => Ok(TransactionType::Expense),
        Some(raw) => match TransactionType::from_str(raw) {
            Ok(kind @ (TransactionType::Income | TransactionType::Expense)) => Ok(kind),
            _ => Err(AnalyticsError::InvalidInsightType(raw.to_string())),
        },
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/categories` - Create a category for the caller.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = repo(&state)
        .create_category(auth.user_id(), &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// GET `/categories` - The caller's categories by name.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories: Vec<CategoryResponse> = repo(&state)
        .list_categories(auth.user_id())
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(Json(json!({ "categories": categories })))
}

/// POST `/budgets` - Create a budget on one of the caller's categories.
async fn create_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateBudgetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let period = match payload.period.as_deref() {
        Some(raw) => BudgetPeriod::from_str(raw)?,
        None => BudgetPeriod::Monthly,
    };
    let input = CreateBudgetInput {
        user_id: auth.user_id(),
        category_id: CategoryId::new(payload.category_id),
        amount: payload.amount,
        period,
    };

    let budget = repo(&state).create_budget(input).await?;
    Ok((StatusCode::CREATED, Json(BudgetResponse::from(budget))))
}

/// GET `/budgets` - The caller's budgets.
async fn list_budgets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let budgets: Vec<BudgetResponse> = repo(&state)
        .list_budgets(auth.user_id())
        .await?
        .into_iter()
        .map(BudgetResponse::from)
        .collect();
    Ok(Json(json!({ "budgets": budgets })))
}

/// PUT `/budgets/{budget_id}` - Change a budget's amount or period.
async fn update_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(budget_id): Path<i64>,
    Json(payload): Json<UpdateBudgetRequest>,
) -> Result<Json<BudgetResponse>, ApiError> {
    let input = UpdateBudgetInput {
        amount: payload.amount,
        period: payload.period.as_deref().map(BudgetPeriod::from_str).transpose()?,
    };
    let budget = repo(&state)
        .update_budget(BudgetId::new(budget_id), auth.user_id(), input)
        .await?;
    Ok(Json(budget.into()))
}

/// DELETE `/budgets/{budget_id}` - Remove a budget.
async fn delete_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(budget_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    repo(&state)
        .delete_budget(BudgetId::new(budget_id), auth.user_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/budgets/status?month=YYYY-MM-DD` - Spending against every budget.
async fn budget_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BudgetStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = match query.month {
        Some(day) => day,
        None => first_of_month(Utc::now().date_naive())?,
    };

    let statuses: Vec<BudgetStatus> = repo(&state).budget_status(auth.user_id(), month).await?;
    Ok(Json(json!({ "month": month.to_string(), "budgets": statuses })))
}

/// GET `/analytics/summary?from=&to=` - Income and expense totals by category and month.
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<TransactionSummary>, ApiError> {
    let summary = repo(&state)
        .summary(auth.user_id(), query.from, query.to)
        .await?;
    Ok(Json(summary))
}

/// GET `/analytics/insights/trends?months=` - Monthly income and expense with
/// the preceding month alongside.
async fn trends(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TrendsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let months = query.months.unwrap_or(DEFAULT_TREND_MONTHS);
    let items: Vec<TrendItem> = repo(&state)
        .trends(auth.user_id(), months, Utc::now().date_naive())
        .await?;
    Ok(Json(json!({ "months": months, "trends": items })))
}

/// GET `/analytics/insights/top-categories?type=&limit=&from=&to=` - Largest
/// categories of one type.
async fn top_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TopCategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction_type = insight_type(query.transaction_type.as_deref())?;
    let today = Utc::now().date_naive();
    let from = match query.from {
        Some(day) => day,
        None => first_of_month(today)?,
    };
    let to = query.to.unwrap_or(today);

    let categories: Vec<CategoryTotal> = repo(&state)
        .top_categories(
            auth.user_id(),
            transaction_type,
            query.limit.unwrap_or(DEFAULT_TOP_LIMIT),
            from,
            to,
        )
        .await?;
    Ok(Json(json!({
        "type": transaction_type.as_str(),
        "from": from.to_string(),
        "to": to.to_string(),
        "categories": categories,
    })))
}
