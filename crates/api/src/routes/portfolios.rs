//! Portfolio, security, holding and valuation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bux_core::balance::BalanceError;
use bux_core::valuation::PortfolioSummary;
use bux_db::entities::{holdings, portfolios, securities};
use bux_db::repositories::{
    CreatePortfolioInput, CreateSecurityInput, HoldingRepository, PortfolioRepository,
};
use bux_shared::types::{CurrencyCode, PortfolioId, SecurityId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::required_name;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the portfolio routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/portfolios", get(list_portfolios).post(create_portfolio))
        .route("/securities", post(create_security))
        .route("/portfolios/{portfolio_id}/holdings", get(list_holdings))
        .route("/portfolios/{portfolio_id}/summary", get(portfolio_summary))
        .route(
            "/portfolios/{portfolio_id}/holdings/{security_id}/recalculate",
            post(recalculate_holding),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a portfolio.
#[derive(Debug, Deserialize)]
pub struct CreatePortfolioRequest {
    /// Display name.
    pub name: String,
    /// Reporting currency (ISO 4217).
    pub currency: String,
}

/// Request body for registering a security.
#[derive(Debug, Deserialize)]
pub struct CreateSecurityRequest {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Quote currency (ISO 4217).
    pub currency: String,
}

/// Response for a portfolio.
#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    /// Portfolio ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Reporting currency.
    pub currency: String,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<portfolios::Model> for PortfolioResponse {
    fn from(p: portfolios::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            currency: p.currency,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Response for a security.
#[derive(Debug, Serialize)]
pub struct SecurityResponse {
    /// Security ID.
    pub id: i64,
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Quote currency.
    pub currency: String,
}

impl From<securities::Model> for SecurityResponse {
    fn from(s: securities::Model) -> Self {
        Self {
            id: s.id,
            symbol: s.symbol,
            name: s.name,
            currency: s.currency,
        }
    }
}

/// Response for a holding.
#[derive(Debug, Serialize)]
pub struct HoldingResponse {
    /// Security ID.
    pub security_id: i64,
    /// Ticker symbol, when the security row was found.
    pub symbol: Option<String>,
    /// Units held.
    pub quantity: Decimal,
    /// Weighted-average cost per unit.
    pub average_cost: Decimal,
    /// Cost basis.
    pub total_cost: Decimal,
    /// Last rebuild.
    pub updated_at: String,
}

impl HoldingResponse {
    pub(crate) fn new(h: holdings::Model, security: Option<securities::Model>) -> Self {
        Self {
            security_id: h.security_id,
            symbol: security.map(|s| s.symbol),
            quantity: h.quantity,
            average_cost: h.average_cost,
            total_cost: h.total_cost,
            updated_at: h.updated_at.to_rfc3339(),
        }
    }
}

fn parse_currency(raw: &str) -> Result<CurrencyCode, ApiError> {
    Ok(CurrencyCode::parse(raw).map_err(BalanceError::from)?)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/portfolios` - Create a portfolio for the caller.
async fn create_portfolio(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePortfolioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreatePortfolioInput {
        user_id: auth.user_id(),
        name: required_name(&payload.name)?,
        currency: parse_currency(&payload.currency)?,
    };

    let portfolio = PortfolioRepository::new((*state.db).clone())
        .create_portfolio(input)
        .await?;

    Ok((StatusCode::CREATED, Json(PortfolioResponse::from(portfolio))))
}

/// GET `/portfolios` - List the caller's portfolios.
async fn list_portfolios(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let portfolios: Vec<PortfolioResponse> = PortfolioRepository::new((*state.db).clone())
        .list_portfolios(auth.user_id())
        .await?
        .into_iter()
        .map(PortfolioResponse::from)
        .collect();

    Ok(Json(json!({ "portfolios": portfolios })))
}

/// POST `/securities` - Register a security.
async fn create_security(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateSecurityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateSecurityInput {
        symbol: required_name(&payload.symbol)?,
        name: required_name(&payload.name)?,
        currency: parse_currency(&payload.currency)?,
    };

    let security = PortfolioRepository::new((*state.db).clone())
        .create_security(input)
        .await?;

    Ok((StatusCode::CREATED, Json(SecurityResponse::from(security))))
}

/// GET `/portfolios/{portfolio_id}/holdings` - Current positions.
async fn list_holdings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(portfolio_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let holdings: Vec<HoldingResponse> = HoldingRepository::new((*state.db).clone())
        .list_holdings(auth.user_id(), PortfolioId::new(portfolio_id))
        .await?
        .into_iter()
        .map(|(h, s)| HoldingResponse::new(h, s))
        .collect();

    Ok(Json(json!({ "holdings": holdings })))
}

/// GET `/portfolios/{portfolio_id}/summary` - Market value and unrealized P&L.
async fn portfolio_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(portfolio_id): Path<i64>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let summary = HoldingRepository::new((*state.db).clone())
        .value_portfolio(auth.user_id(), PortfolioId::new(portfolio_id))
        .await?;

    Ok(Json(summary))
}

/// POST `/portfolios/{portfolio_id}/holdings/{security_id}/recalculate` - Rebuild one holding.
async fn recalculate_holding(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((portfolio_id, security_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let portfolio_id = PortfolioId::new(portfolio_id);
    let security_id = SecurityId::new(security_id);

    let holding = HoldingRepository::new((*state.db).clone())
        .recalculate_owned(auth.user_id(), portfolio_id, security_id)
        .await?;

    tracing::info!(
        portfolio_id = %portfolio_id,
        security_id = %security_id,
        settled = holding.is_none(),
        "Holding rebuilt on request"
    );

    Ok(Json(json!({
        "holding": holding.map(|h| HoldingResponse::new(h, None)),
    })))
}
