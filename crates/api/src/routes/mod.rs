//! API route definitions.

use axum::{Router, middleware};
use bux_shared::AppError;

use crate::{AppState, ApiError, middleware::auth_middleware};

pub mod accounts;
pub mod analytics;
pub mod health;
pub mod portfolios;
pub mod prices;
pub mod recurring;
pub mod trades;
pub mod transactions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(portfolios::routes())
        .merge(trades::routes())
        .merge(prices::routes())
        .merge(accounts::routes())
        .merge(transactions::routes())
        .merge(recurring::routes())
        .merge(analytics::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Trims a required display name, rejecting blanks.
pub(crate) fn required_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation("EMPTY_NAME", "Name cannot be empty").into());
    }
    Ok(name.to_string())
}
