//! Cash account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use bux_core::balance::{AccountReconciliation, BalanceError};
use bux_db::entities::accounts;
use bux_db::repositories::{AccountRepository, CreateAccountInput, UpdateAccountInput};
use bux_shared::types::{AccountId, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::required_name;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{account_id}",
            get(get_account).put(update_account).delete(deactivate_account),
        )
        .route("/accounts/{account_id}/reconcile", get(reconcile_account))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Display name.
    pub name: String,
    /// Currency label (ISO 4217).
    pub currency: String,
    /// Starting balance; may be negative.
    #[serde(default)]
    pub opening_balance: Decimal,
}

/// Request body for changing an account.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New display name.
    pub name: Option<String>,
    /// Close or reopen the account.
    pub is_active: Option<bool>,
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Only accounts still in use; defaults to false.
    #[serde(default)]
    pub active: bool,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Currency label.
    pub currency: String,
    /// Cached balance.
    pub balance: Decimal,
    /// Balance at creation.
    pub opening_balance: Decimal,
    /// Whether the account is in use.
    pub is_active: bool,
    /// Last balance change.
    pub updated_at: String,
}

impl From<accounts::Model> for AccountResponse {
    fn from(a: accounts::Model) -> Self {
        Self {
            id: a.id,
            name: a.name,
            currency: a.currency,
            balance: a.balance,
            opening_balance: a.opening_balance,
            is_active: a.is_active,
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

/// POST `/accounts` - Open an account for the caller.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateAccountInput {
        user_id: auth.user_id(),
        name: required_name(&payload.name)?,
        currency: CurrencyCode::parse(&payload.currency).map_err(BalanceError::from)?,
        opening_balance: payload.opening_balance,
    };

    let account = AccountRepository::new((*state.db).clone())
        .create_account(input)
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// GET `/accounts?active=true` - The caller's accounts.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts: Vec<AccountResponse> = AccountRepository::new((*state.db).clone())
        .list_accounts(auth.user_id(), query.active)
        .await?
        .into_iter()
        .map(AccountResponse::from)
        .collect();
    Ok(Json(json!({ "accounts": accounts })))
}

/// PUT `/accounts/{account_id}` - Rename, close or reopen an account.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<i64>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let input = UpdateAccountInput {
        name: payload.name.as_deref().map(required_name).transpose()?,
        is_active: payload.is_active,
    };
    let account = AccountRepository::new((*state.db).clone())
        .update_account(AccountId::new(account_id), auth.user_id(), input)
        .await?;

    Ok(Json(account.into()))
}

/// DELETE `/accounts/{account_id}` - Close an account; its history is kept.
async fn deactivate_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = AccountRepository::new((*state.db).clone())
        .deactivate_account(AccountId::new(account_id), auth.user_id())
        .await?;

    Ok(Json(account.into()))
}

/// GET `/accounts/{account_id}` - Account with its cached balance.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = AccountRepository::new((*state.db).clone())
        .get_account(AccountId::new(account_id), auth.user_id())
        .await?;

    Ok(Json(account.into()))
}

/// GET `/accounts/{account_id}/reconcile` - Compare the cached balance with the ledger.
async fn reconcile_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountReconciliation>, ApiError> {
    let report = AccountRepository::new((*state.db).clone())
        .reconcile(AccountId::new(account_id), auth.user_id())
        .await?;

    Ok(Json(report))
}
