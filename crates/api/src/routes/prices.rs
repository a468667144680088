//! Price feed routes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use bux_core::valuation::DailyPrice;
use bux_db::repositories::PriceRepository;
use bux_shared::types::SecurityId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the price routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/prices", post(upsert_price))
}

/// Request body for one day of OHLCV data.
#[derive(Debug, Deserialize)]
pub struct UpsertPriceRequest {
    /// Security priced.
    pub security_id: i64,
    /// Trading day (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Opening price.
    pub open: Decimal,
    /// Session high.
    pub high: Decimal,
    /// Session low.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Units traded.
    #[serde(default)]
    pub volume: i64,
}

/// POST `/prices` - Insert or replace a security's price for one day.
async fn upsert_price(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<UpsertPriceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let price = DailyPrice {
        security_id: SecurityId::new(payload.security_id),
        date: payload.date,
        open: payload.open,
        high: payload.high,
        low: payload.low,
        close: payload.close,
        volume: payload.volume,
    };

    let row = PriceRepository::new((*state.db).clone())
        .upsert_daily_price(price)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": row.id,
            "security_id": row.security_id,
            "date": row.date.to_string(),
            "open": row.open,
            "high": row.high,
            "low": row.low,
            "close": row.close,
            "volume": row.volume,
        })),
    ))
}
