//! Ledger transaction routes.
//!
//! Posting a transaction moves the affected balances in the same storage
//! transaction; the response carries the balances as they now stand.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use bux_core::balance::{BalanceError, NewTransaction, TransactionStatus, TransactionType};
use bux_db::entities::transactions;
use bux_db::repositories::TransactionRepository;
use bux_shared::types::{AccountId, CategoryId, CurrencyCode, TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::accounts::AccountResponse;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/{transaction_id}", get(get_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Only transactions touching this account, on either side.
    pub account_id: Option<i64>,
}

/// Request body for posting a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Source account.
    pub account_id: i64,
    /// Destination account, transfers only.
    pub destination_account_id: Option<i64>,
    /// `income`, `expense` or `transfer`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Currency label (ISO 4217).
    pub currency: String,
    /// Category, for analytics.
    pub category_id: Option<i64>,
    /// Free-form description.
    pub description: Option<String>,
    /// Effective date; defaults to now.
    pub transaction_date: Option<DateTime<Utc>>,
    /// `pending`, `completed` or `failed`; defaults to `completed`.
    pub status: Option<String>,
}

impl CreateTransactionRequest {
    /// Parses the closed enums and the currency, before any account is read.
    fn into_transaction(
        self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<NewTransaction, BalanceError> {
        let status = match self.status.as_deref() {
            Some(raw) => TransactionStatus::from_str(raw)?,
            None => TransactionStatus::default(),
        };
        Ok(NewTransaction {
            user_id,
            account_id: AccountId::new(self.account_id),
            destination_account_id: self.destination_account_id.map(AccountId::new),
            category_id: self.category_id.map(CategoryId::new),
            transaction_type: TransactionType::from_str(&self.transaction_type)?,
            amount: self.amount,
            currency: CurrencyCode::parse(&self.currency)?,
            description: self.description,
            transaction_date: self.transaction_date.unwrap_or(now),
            status,
        })
    }
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: i64,
    /// Source account.
    pub account_id: i64,
    /// Destination account, transfers only.
    pub destination_account_id: Option<i64>,
    /// Category.
    pub category_id: Option<i64>,
    /// Rule that generated this posting, if any.
    pub recurring_transaction_id: Option<i64>,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: &'static str,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Currency label.
    pub currency: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Effective date.
    pub transaction_date: String,
    /// Lifecycle status.
    pub status: &'static str,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(t: transactions::Model) -> Self {
        Self {
            id: t.id,
            account_id: t.account_id,
            destination_account_id: t.destination_account_id,
            category_id: t.category_id,
            recurring_transaction_id: t.recurring_transaction_id,
            transaction_type: TransactionType::from(t.transaction_type).as_str(),
            amount: t.amount,
            currency: t.currency,
            description: t.description,
            transaction_date: t.transaction_date.to_rfc3339(),
            status: TransactionStatus::from(t.status).as_str(),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/transactions` - Validate and post a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = payload.into_transaction(auth.user_id(), Utc::now())?;

    let posted = TransactionRepository::new((*state.db).clone())
        .create_transaction(tx)
        .await?;

    let accounts: Vec<AccountResponse> = posted
        .accounts
        .into_iter()
        .map(AccountResponse::from)
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "transaction": TransactionResponse::from(posted.transaction),
            "accounts": accounts,
        })),
    ))
}

/// GET `/transactions` - The caller's transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions: Vec<TransactionResponse> = TransactionRepository::new((*state.db).clone())
        .list_transactions(auth.user_id(), query.account_id.map(AccountId::new))
        .await?
        .into_iter()
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(json!({ "transactions": transactions })))
}

/// GET `/transactions/{transaction_id}` - One of the caller's transactions.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = TransactionRepository::new((*state.db).clone())
        .get_transaction(TransactionId::new(transaction_id), auth.user_id())
        .await?;

    Ok(Json(transaction.into()))
}
