//! Trade ledger routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bux_core::holding::{NewTrade, TradeSide};
use bux_db::entities::trades;
use bux_db::repositories::HoldingRepository;
use bux_shared::types::{PortfolioId, SecurityId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::portfolios::HoldingResponse;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the trade routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trades", post(create_trade))
        .route("/portfolios/{portfolio_id}/trades", get(list_trades))
}

/// Request body for recording a trade.
#[derive(Debug, Deserialize)]
pub struct CreateTradeRequest {
    /// Portfolio the trade belongs to.
    pub portfolio_id: i64,
    /// Security traded.
    pub security_id: i64,
    /// `buy` or `sell`.
    pub side: String,
    /// Units, strictly positive.
    pub quantity: Decimal,
    /// Unit price, strictly positive.
    pub price: Decimal,
    /// Commission, zero or more.
    #[serde(default)]
    pub fee: Decimal,
    /// Execution time; defaults to now.
    pub trade_date: Option<DateTime<Utc>>,
    /// Free-form note.
    pub note: Option<String>,
}

impl CreateTradeRequest {
    fn into_trade(self, now: DateTime<Utc>) -> Result<NewTrade, ApiError> {
        Ok(NewTrade {
            portfolio_id: PortfolioId::new(self.portfolio_id),
            security_id: SecurityId::new(self.security_id),
            side: TradeSide::from_str(&self.side)?,
            quantity: self.quantity,
            price: self.price,
            fee: self.fee,
            trade_date: self.trade_date.unwrap_or(now),
            note: self.note,
        })
    }
}

/// Response for a trade.
#[derive(Debug, Serialize)]
pub struct TradeResponse {
    /// Trade ID.
    pub id: i64,
    /// Portfolio ID.
    pub portfolio_id: i64,
    /// Security ID.
    pub security_id: i64,
    /// `buy` or `sell`.
    pub side: &'static str,
    /// Units.
    pub quantity: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// Commission.
    pub fee: Decimal,
    /// Execution time.
    pub trade_date: String,
    /// Free-form note.
    pub note: Option<String>,
}

impl From<trades::Model> for TradeResponse {
    fn from(t: trades::Model) -> Self {
        Self {
            id: t.id,
            portfolio_id: t.portfolio_id,
            security_id: t.security_id,
            side: TradeSide::from(t.side).as_str(),
            quantity: t.quantity,
            price: t.price,
            fee: t.fee,
            trade_date: t.trade_date.to_rfc3339(),
            note: t.note,
        }
    }
}

/// POST `/trades` - Validate, record and apply a trade.
///
/// Responds 201 with the trade and the rebuilt holding (`null` once the
/// position is closed).
async fn create_trade(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trade = payload.into_trade(Utc::now())?;

    let outcome = HoldingRepository::new((*state.db).clone())
        .execute_trade(auth.user_id(), trade)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "trade": TradeResponse::from(outcome.trade),
            "holding": outcome.holding.map(|h| HoldingResponse::new(h, None)),
        })),
    ))
}

/// GET `/portfolios/{portfolio_id}/trades` - Trade history, newest first.
async fn list_trades(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(portfolio_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let trades: Vec<TradeResponse> = HoldingRepository::new((*state.db).clone())
        .list_trades(auth.user_id(), PortfolioId::new(portfolio_id))
        .await?
        .into_iter()
        .map(TradeResponse::from)
        .collect();

    Ok(Json(json!({ "trades": trades })))
}
