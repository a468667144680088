//! Error to HTTP response mapping.
//!
//! Every failure renders as `{"error": <code>, "message": <text>}` with the
//! status its kind implies. Storage failures are logged before they are
//! rendered; client errors are not.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bux_core::analytics::AnalyticsError;
use bux_core::balance::BalanceError;
use bux_core::holding::HoldingError;
use bux_core::recurring::RecurringError;
use bux_core::valuation::ValuationError;
use bux_db::repositories::{InvestmentError, ReportError, SchedulerError, TransactionError};
use bux_shared::AppError;
use serde_json::json;

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Builds an error from a status code, machine code and message.
    pub fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.message, "Request failed");
        }
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

/// Domain and repository errors already know their status and code.
macro_rules! coded_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(e: $ty) -> Self {
                    Self::new(e.http_status_code(), e.error_code(), e.to_string())
                }
            }
        )+
    };
}

coded_error!(
    HoldingError,
    ValuationError,
    BalanceError,
    RecurringError,
    AnalyticsError,
    InvestmentError,
    TransactionError,
    SchedulerError,
    ReportError,
);
