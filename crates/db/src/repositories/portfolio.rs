//! Portfolio and security repository.
//!
//! Also defines [`InvestmentError`], shared by every investment-domain repository.

use bux_core::holding::{HoldingEngine, HoldingError};
use bux_core::valuation::ValuationError;
use bux_shared::types::{CurrencyCode, PortfolioId, SecurityId, UserId};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::entities::{portfolios, securities};

/// Error types for investment operations.
#[derive(Debug, thiserror::Error)]
pub enum InvestmentError {
    /// Trade validation, ownership or cache failure.
    #[error(transparent)]
    Holding(#[from] HoldingError),

    /// Price validation failure.
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    /// A security with this symbol is already registered.
    #[error("Security '{0}' already exists")]
    DuplicateSymbol(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl InvestmentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Holding(e) => e.error_code(),
            Self::Valuation(e) => e.error_code(),
            Self::DuplicateSymbol(_) => "DUPLICATE_SYMBOL",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Holding(e) => e.http_status_code(),
            Self::Valuation(e) => e.http_status_code(),
            Self::DuplicateSymbol(_) => 409,
            Self::Database(_) => 500,
        }
    }
}

/// Input for creating a portfolio.
#[derive(Debug, Clone)]
pub struct CreatePortfolioInput {
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Reporting currency.
    pub currency: CurrencyCode,
}

/// Input for registering a security.
#[derive(Debug, Clone)]
pub struct CreateSecurityInput {
    /// Ticker symbol, stored upper-case.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Quote currency.
    pub currency: CurrencyCode,
}

/// Portfolio repository for portfolio and security records.
#[derive(Debug, Clone)]
pub struct PortfolioRepository {
    db: DatabaseConnection,
}

impl PortfolioRepository {
    /// Creates a new portfolio repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a portfolio for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_portfolio(
        &self,
        input: CreatePortfolioInput,
    ) -> Result<portfolios::Model, InvestmentError> {
        let now = Utc::now().fixed_offset();
        let portfolio = portfolios::ActiveModel {
            user_id: Set(input.user_id.into()),
            name: Set(input.name),
            currency: Set(input.currency.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let portfolio = portfolio.insert(&self.db).await?;

        tracing::info!(portfolio_id = portfolio.id, user_id = %input.user_id, "Portfolio created");
        Ok(portfolio)
    }

    /// Lists a user's portfolios, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_portfolios(
        &self,
        user_id: UserId,
    ) -> Result<Vec<portfolios::Model>, InvestmentError> {
        let portfolios = portfolios::Entity::find()
            .filter(portfolios::Column::UserId.eq(i64::from(user_id)))
            .order_by_asc(portfolios::Column::Id)
            .all(&self.db)
            .await?;
        Ok(portfolios)
    }

    /// Loads a portfolio and checks that `user_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioNotFound` (404) before `AccessDenied` (403).
    pub async fn get_owned(
        &self,
        portfolio_id: PortfolioId,
        user_id: UserId,
    ) -> Result<portfolios::Model, InvestmentError> {
        let portfolio = portfolios::Entity::find_by_id(i64::from(portfolio_id))
            .one(&self.db)
            .await?;
        HoldingEngine::check_owner(
            portfolio_id,
            portfolio.as_ref().map(|p| UserId::new(p.user_id)),
            user_id,
        )?;
        portfolio.ok_or(HoldingError::PortfolioNotFound(portfolio_id).into())
    }

    /// Registers a security.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSymbol` if the symbol is taken.
    pub async fn create_security(
        &self,
        input: CreateSecurityInput,
    ) -> Result<securities::Model, InvestmentError> {
        let symbol = input.symbol.trim().to_ascii_uppercase();
        let security = securities::ActiveModel {
            symbol: Set(symbol.clone()),
            name: Set(input.name),
            currency: Set(input.currency.into()),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        match security.insert(&self.db).await {
            Ok(security) => {
                tracing::info!(security_id = security.id, symbol = %security.symbol, "Security registered");
                Ok(security)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(InvestmentError::DuplicateSymbol(symbol))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up a security by id.
    ///
    /// # Errors
    ///
    /// Returns `SecurityNotFound` if it does not exist.
    pub async fn find_security(
        &self,
        security_id: SecurityId,
    ) -> Result<securities::Model, InvestmentError> {
        securities::Entity::find_by_id(i64::from(security_id))
            .one(&self.db)
            .await?
            .ok_or(HoldingError::SecurityNotFound(security_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_delegates_to_inner() {
        let err = InvestmentError::from(HoldingError::AccessDenied(PortfolioId::new(3)));
        assert_eq!(err.error_code(), "ACCESS_DENIED");
        assert_eq!(err.http_status_code(), 403);

        let err = InvestmentError::from(ValuationError::NegativeVolume);
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_duplicate_and_database_errors() {
        let err = InvestmentError::DuplicateSymbol("AAPL".into());
        assert_eq!(err.error_code(), "DUPLICATE_SYMBOL");
        assert_eq!(err.http_status_code(), 409);

        let err = InvestmentError::from(DbErr::Custom("boom".into()));
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.http_status_code(), 500);
    }
}
