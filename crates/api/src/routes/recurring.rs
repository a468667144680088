//! Recurring transaction routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bux_core::balance::{BalanceError, TransactionType};
use bux_core::recurring::{Frequency, NewRecurringRule, RecurringError, RecurringUpdate};
use bux_db::entities::recurring_transactions;
use bux_db::repositories::RecurringRepository;
use bux_shared::types::{AccountId, CategoryId, CurrencyCode, RecurringTransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::accounts::AccountResponse;
use super::transactions::TransactionResponse;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the recurring transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recurring", get(list_rules).post(create_rule))
        .route("/recurring/process-due", post(process_due))
        .route(
            "/recurring/{id}",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        .route("/recurring/{id}/toggle", post(toggle_rule))
        .route("/recurring/{id}/execute", post(execute_rule))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a rule.
#[derive(Debug, Deserialize)]
pub struct CreateRecurringRequest {
    /// Source account.
    pub account_id: i64,
    /// Destination account, transfer rules only.
    pub destination_account_id: Option<i64>,
    /// Category of each posting.
    pub category_id: Option<i64>,
    /// `income`, `expense` or `transfer`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Amount of each posting.
    pub amount: Decimal,
    /// Currency label (ISO 4217).
    pub currency: String,
    /// Description of each posting.
    pub description: Option<String>,
    /// `daily`, `weekly`, `monthly` or `yearly`.
    pub frequency: String,
    /// First firing; defaults to now.
    pub next_date: Option<DateTime<Utc>>,
    /// Last day the rule may fire.
    pub end_date: Option<DateTime<Utc>>,
}

impl CreateRecurringRequest {
    fn into_rule(self, user_id: UserId) -> Result<NewRecurringRule, RecurringError> {
        Ok(NewRecurringRule {
            user_id,
            account_id: AccountId::new(self.account_id),
            destination_account_id: self.destination_account_id.map(AccountId::new),
            category_id: self.category_id.map(CategoryId::new),
            transaction_type: TransactionType::from_str(&self.transaction_type)?,
            amount: self.amount,
            currency: CurrencyCode::parse(&self.currency).map_err(BalanceError::from)?,
            description: self.description,
            frequency: Frequency::from_str(&self.frequency)?,
            next_date: self.next_date,
            end_date: self.end_date,
        })
    }
}

/// Request body for changing a rule. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecurringRequest {
    /// Amount of each posting.
    pub amount: Option<Decimal>,
    /// Description of each posting.
    pub description: Option<String>,
    /// Category of each posting.
    pub category_id: Option<i64>,
    /// `daily`, `weekly`, `monthly` or `yearly`.
    pub frequency: Option<String>,
    /// Next firing.
    pub next_date: Option<DateTime<Utc>>,
    /// Last day the rule may fire.
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateRecurringRequest {
    fn into_update(self) -> Result<RecurringUpdate, RecurringError> {
        Ok(RecurringUpdate {
            amount: self.amount,
            description: self.description,
            category_id: self.category_id.map(CategoryId::new),
            frequency: self.frequency.as_deref().map(Frequency::from_str).transpose()?,
            next_date: self.next_date,
            end_date: self.end_date,
        })
    }
}

/// Request body for a due sweep.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessDueRequest {
    /// Fire rules due at or before this instant; defaults to now and never
    /// reaches past it.
    pub before: Option<DateTime<Utc>>,
}

/// Cut-off for a caller's sweep: the requested instant, at most `now`.
fn sweep_cutoff(requested: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    requested.map_or(now, |before| before.min(now))
}

/// Response for a rule.
#[derive(Debug, Serialize)]
pub struct RecurringResponse {
    /// Rule ID.
    pub id: i64,
    /// Source account.
    pub account_id: i64,
    /// Destination account.
    pub destination_account_id: Option<i64>,
    /// Category.
    pub category_id: Option<i64>,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: &'static str,
    /// Amount of each posting.
    pub amount: Decimal,
    /// Currency label.
    pub currency: String,
    /// Description.
    pub description: Option<String>,
    /// Period length.
    pub frequency: &'static str,
    /// Next firing.
    pub next_date: String,
    /// Last day the rule may fire.
    pub end_date: Option<String>,
    /// Whether sweeps pick the rule up.
    pub is_active: bool,
}

impl From<recurring_transactions::Model> for RecurringResponse {
    fn from(r: recurring_transactions::Model) -> Self {
        Self {
            id: r.id,
            account_id: r.account_id,
            destination_account_id: r.destination_account_id,
            category_id: r.category_id,
            transaction_type: TransactionType::from(r.transaction_type).as_str(),
            amount: r.amount,
            currency: r.currency,
            description: r.description,
            frequency: Frequency::from(r.frequency).as_str(),
            next_date: r.next_date.to_rfc3339(),
            end_date: r.end_date.map(|d| d.to_rfc3339()),
            is_active: r.is_active,
        }
    }
}

fn repo(state: &AppState) -> RecurringRepository {
    RecurringRepository::new((*state.db).clone())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/recurring` - Create an active rule.
async fn create_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRecurringRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = payload.into_rule(auth.user_id())?;
    let created = repo(&state).create(rule, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(RecurringResponse::from(created))))
}

/// GET `/recurring` - The caller's rules by next firing.
async fn list_rules(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let rules: Vec<RecurringResponse> = repo(&state)
        .list(auth.user_id())
        .await?
        .into_iter()
        .map(RecurringResponse::from)
        .collect();
    Ok(Json(json!({ "recurring": rules })))
}

/// GET `/recurring/{id}` - One rule.
async fn get_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecurringResponse>, ApiError> {
    let rule = repo(&state)
        .get(RecurringTransactionId::new(id), auth.user_id())
        .await?;
    Ok(Json(rule.into()))
}

/// PUT `/recurring/{id}` - Change a rule's template or schedule.
async fn update_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecurringRequest>,
) -> Result<Json<RecurringResponse>, ApiError> {
    let update = payload.into_update()?;
    let rule = repo(&state)
        .update(RecurringTransactionId::new(id), auth.user_id(), update)
        .await?;
    Ok(Json(rule.into()))
}

/// POST `/recurring/{id}/toggle` - Flip `is_active`.
async fn toggle_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecurringResponse>, ApiError> {
    let rule = repo(&state)
        .toggle(RecurringTransactionId::new(id), auth.user_id())
        .await?;
    Ok(Json(rule.into()))
}

/// DELETE `/recurring/{id}` - Remove a rule; its past postings stay.
async fn delete_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    repo(&state)
        .delete(RecurringTransactionId::new(id), auth.user_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/recurring/{id}/execute` - Fire a rule now.
async fn execute_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let executed = repo(&state)
        .execute(RecurringTransactionId::new(id), auth.user_id(), Utc::now())
        .await?;

    let accounts: Vec<AccountResponse> = executed
        .posted
        .accounts
        .into_iter()
        .map(AccountResponse::from)
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "transaction": TransactionResponse::from(executed.posted.transaction),
            "accounts": accounts,
            "recurring": RecurringResponse::from(executed.rule),
        })),
    ))
}

/// POST `/recurring/process-due` - Fire the caller's due rules once.
///
/// The body is optional; `before` is capped at now so rules cannot be fired
/// ahead of schedule. Other users' rules are left to their own sweeps and the
/// operator sweeper.
async fn process_due(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Option<Json<ProcessDueRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let before = sweep_cutoff(payload.and_then(|Json(p)| p.before), Utc::now());

    let processed = repo(&state)
        .process_due(before, Some(auth.user_id()))
        .await?;

    Ok(Json(json!({ "processed": processed })))
}
