//! Price history repository.

use std::collections::HashMap;

use bux_core::valuation::{DailyPrice, PortfolioValuator};
use bux_shared::types::SecurityId;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use super::portfolio::{InvestmentError, PortfolioRepository};
use crate::entities::price_history;

/// Price repository for daily OHLCV rows.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    db: DatabaseConnection,
}

impl PriceRepository {
    /// Creates a new price repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts or replaces the price of a security for one day.
    ///
    /// # Errors
    ///
    /// Returns `NegativePrice`, `NegativeVolume`, `SecurityNotFound` or a database error.
    pub async fn upsert_daily_price(
        &self,
        price: DailyPrice,
    ) -> Result<price_history::Model, InvestmentError> {
        PortfolioValuator::validate_price(&price)?;
        PortfolioRepository::new(self.db.clone())
            .find_security(price.security_id)
            .await?;

        let row = price_history::ActiveModel {
            security_id: Set(price.security_id.into()),
            date: Set(price.date),
            open: Set(price.open),
            high: Set(price.high),
            low: Set(price.low),
            close: Set(price.close),
            volume: Set(price.volume),
            ..Default::default()
        };
        let saved = price_history::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    price_history::Column::SecurityId,
                    price_history::Column::Date,
                ])
                .update_columns([
                    price_history::Column::Open,
                    price_history::Column::High,
                    price_history::Column::Low,
                    price_history::Column::Close,
                    price_history::Column::Volume,
                ])
                .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;

        tracing::debug!(
            security_id = %price.security_id,
            date = %price.date,
            close = %saved.close,
            "Daily price stored"
        );
        Ok(saved)
    }

    /// Returns the most recent close, as of today, for each given security.
    ///
    /// Securities without any price row are absent from the map. One query
    /// regardless of how many ids are passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_closes(
        &self,
        security_ids: &[SecurityId],
    ) -> Result<HashMap<SecurityId, Decimal>, InvestmentError> {
        if security_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i64> = security_ids.iter().map(|id| i64::from(*id)).collect();
        let rows: Vec<(i64, Decimal)> = price_history::Entity::find()
            .select_only()
            .column(price_history::Column::SecurityId)
            .column(price_history::Column::Close)
            .distinct_on([price_history::Column::SecurityId])
            .filter(price_history::Column::SecurityId.is_in(ids))
            .filter(price_history::Column::Date.lte(Utc::now().date_naive()))
            .order_by_asc(price_history::Column::SecurityId)
            .order_by_desc(price_history::Column::Date)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, close)| (SecurityId::new(id), close))
            .collect())
    }
}
