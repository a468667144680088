//! Holding repository: the trade ledger and its derived holdings cache.
//!
//! Trades are append-only. Holdings are rebuilt from the full trade history of
//! one (portfolio, security) pair; the rebuild for a pair is serialized with a
//! transaction-scoped advisory lock so concurrent trades cannot lose an update.

use bux_core::holding::{HoldingEngine, HoldingError, NewTrade, TradeRecord};
use bux_core::valuation::{PortfolioSummary, PortfolioValuator, ValuedHolding};
use bux_shared::types::{PortfolioId, SecurityId, TradeId, UserId};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};

use super::portfolio::{InvestmentError, PortfolioRepository};
use super::price::PriceRepository;
use crate::entities::{holdings, securities, trades};

/// Multiplier used to fold a (portfolio, security) pair into one advisory lock key.
const LOCK_KEY_PRIME: i64 = 1_000_000_007;

/// Derives the advisory lock key for a position.
///
/// Collisions only over-serialize unrelated pairs; they never break correctness.
fn position_lock_key(portfolio_id: PortfolioId, security_id: SecurityId) -> i64 {
    i64::from(portfolio_id).wrapping_mul(LOCK_KEY_PRIME) ^ i64::from(security_id)
}

/// A recorded trade together with the rebuilt holding.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    /// The trade row.
    pub trade: trades::Model,
    /// The holding after replay; `None` when the position is settled.
    pub holding: Option<holdings::Model>,
}

/// Holding repository for trades and holdings.
#[derive(Debug, Clone)]
pub struct HoldingRepository {
    db: DatabaseConnection,
}

impl HoldingRepository {
    /// Creates a new holding repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn portfolios(&self) -> PortfolioRepository {
        PortfolioRepository::new(self.db.clone())
    }

    /// Validates and appends a trade, then rebuilds the affected holding.
    ///
    /// The trade is committed before the rebuild starts. If the rebuild fails the
    /// trade stays and the caller receives `HoldingStale`; running
    /// [`HoldingRepository::recalculate`] again repairs the cache.
    ///
    /// # Errors
    ///
    /// Returns validation, `PortfolioNotFound`, `AccessDenied`, `SecurityNotFound`,
    /// `HoldingStale` or a database error.
    pub async fn execute_trade(
        &self,
        user_id: UserId,
        trade: NewTrade,
    ) -> Result<TradeOutcome, InvestmentError> {
        HoldingEngine::validate_trade(&trade)?;
        self.portfolios()
            .get_owned(trade.portfolio_id, user_id)
            .await?;
        self.portfolios().find_security(trade.security_id).await?;

        let row = trades::ActiveModel {
            portfolio_id: Set(trade.portfolio_id.into()),
            security_id: Set(trade.security_id.into()),
            side: Set(trade.side.into()),
            quantity: Set(trade.quantity),
            price: Set(trade.price),
            fee: Set(trade.fee),
            trade_date: Set(trade.trade_date.fixed_offset()),
            note: Set(trade.note),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        let row = row.insert(&self.db).await?;

        tracing::info!(
            trade_id = row.id,
            portfolio_id = %trade.portfolio_id,
            security_id = %trade.security_id,
            side = %trade.side,
            "Trade recorded"
        );

        match self.recalculate(trade.portfolio_id, trade.security_id).await {
            Ok(holding) => Ok(TradeOutcome {
                trade: row,
                holding,
            }),
            Err(e) => {
                tracing::error!(
                    trade_id = row.id,
                    portfolio_id = %trade.portfolio_id,
                    security_id = %trade.security_id,
                    error = %e,
                    "Holding recalculation failed after trade was recorded"
                );
                Err(HoldingError::HoldingStale {
                    trade_id: TradeId::new(row.id),
                }
                .into())
            }
        }
    }

    /// Rebuilds one holding from its complete trade history.
    ///
    /// Runs in a single storage transaction holding an advisory lock on the
    /// (portfolio, security) pair. Upserts the holding when the position is
    /// open and deletes it when settled. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if any database operation fails.
    pub async fn recalculate(
        &self,
        portfolio_id: PortfolioId,
        security_id: SecurityId,
    ) -> Result<Option<holdings::Model>, InvestmentError> {
        let txn = self.db.begin().await?;

        Self::lock_position(&txn, portfolio_id, security_id).await?;

        let history: Vec<TradeRecord> = trades::Entity::find()
            .filter(trades::Column::PortfolioId.eq(i64::from(portfolio_id)))
            .filter(trades::Column::SecurityId.eq(i64::from(security_id)))
            .order_by_asc(trades::Column::TradeDate)
            .order_by_asc(trades::Column::Id)
            .all(&txn)
            .await?
            .into_iter()
            .map(|t| TradeRecord {
                id: TradeId::new(t.id),
                side: t.side.into(),
                quantity: t.quantity,
                price: t.price,
                fee: t.fee,
                trade_date: t.trade_date.to_utc(),
            })
            .collect();
        let trade_count = history.len();

        let holding = match HoldingEngine::rebuild(history) {
            Some(snapshot) => {
                let row = holdings::ActiveModel {
                    portfolio_id: Set(portfolio_id.into()),
                    security_id: Set(security_id.into()),
                    quantity: Set(snapshot.quantity),
                    average_cost: Set(snapshot.average_cost),
                    total_cost: Set(snapshot.total_cost),
                    updated_at: Set(Utc::now().fixed_offset()),
                    ..Default::default()
                };
                let saved = holdings::Entity::insert(row)
                    .on_conflict(
                        OnConflict::columns([
                            holdings::Column::PortfolioId,
                            holdings::Column::SecurityId,
                        ])
                        .update_columns([
                            holdings::Column::Quantity,
                            holdings::Column::AverageCost,
                            holdings::Column::TotalCost,
                            holdings::Column::UpdatedAt,
                        ])
                        .to_owned(),
                    )
                    .exec_with_returning(&txn)
                    .await?;
                Some(saved)
            }
            None => {
                holdings::Entity::delete_many()
                    .filter(holdings::Column::PortfolioId.eq(i64::from(portfolio_id)))
                    .filter(holdings::Column::SecurityId.eq(i64::from(security_id)))
                    .exec(&txn)
                    .await?;
                None
            }
        };

        txn.commit().await?;

        tracing::debug!(
            portfolio_id = %portfolio_id,
            security_id = %security_id,
            trades = trade_count,
            settled = holding.is_none(),
            "Holding recalculated"
        );
        Ok(holding)
    }

    /// Ownership-checked [`HoldingRepository::recalculate`], for operational repair.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioNotFound`, `AccessDenied`, `SecurityNotFound` or a database error.
    pub async fn recalculate_owned(
        &self,
        user_id: UserId,
        portfolio_id: PortfolioId,
        security_id: SecurityId,
    ) -> Result<Option<holdings::Model>, InvestmentError> {
        self.portfolios().get_owned(portfolio_id, user_id).await?;
        self.portfolios().find_security(security_id).await?;
        self.recalculate(portfolio_id, security_id).await
    }

    async fn lock_position(
        txn: &DatabaseTransaction,
        portfolio_id: PortfolioId,
        security_id: SecurityId,
    ) -> Result<(), InvestmentError> {
        let key = position_lock_key(portfolio_id, security_id);
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [key.into()],
        ))
        .await?;
        Ok(())
    }

    /// Lists a portfolio's trades, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioNotFound`, `AccessDenied` or a database error.
    pub async fn list_trades(
        &self,
        user_id: UserId,
        portfolio_id: PortfolioId,
    ) -> Result<Vec<trades::Model>, InvestmentError> {
        self.portfolios().get_owned(portfolio_id, user_id).await?;

        let trades = trades::Entity::find()
            .filter(trades::Column::PortfolioId.eq(i64::from(portfolio_id)))
            .order_by_desc(trades::Column::TradeDate)
            .order_by_desc(trades::Column::Id)
            .all(&self.db)
            .await?;
        Ok(trades)
    }

    /// Lists a portfolio's open holdings with their securities.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioNotFound`, `AccessDenied` or a database error.
    pub async fn list_holdings(
        &self,
        user_id: UserId,
        portfolio_id: PortfolioId,
    ) -> Result<Vec<(holdings::Model, Option<securities::Model>)>, InvestmentError> {
        self.portfolios().get_owned(portfolio_id, user_id).await?;

        let rows = holdings::Entity::find()
            .find_also_related(securities::Entity)
            .filter(holdings::Column::PortfolioId.eq(i64::from(portfolio_id)))
            .order_by_asc(holdings::Column::SecurityId)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Values a portfolio against the latest close of each held security.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioNotFound`, `AccessDenied` or a database error.
    pub async fn value_portfolio(
        &self,
        user_id: UserId,
        portfolio_id: PortfolioId,
    ) -> Result<PortfolioSummary, InvestmentError> {
        let rows = self.list_holdings(user_id, portfolio_id).await?;

        let security_ids: Vec<SecurityId> = rows
            .iter()
            .map(|(h, _)| SecurityId::new(h.security_id))
            .collect();
        let latest_close = PriceRepository::new(self.db.clone())
            .latest_closes(&security_ids)
            .await?;

        let holdings = rows
            .into_iter()
            .map(|(h, security)| {
                let (symbol, name) = security.map(|s| (s.symbol, s.name)).unwrap_or_default();
                ValuedHolding {
                    security_id: SecurityId::new(h.security_id),
                    symbol,
                    name,
                    quantity: h.quantity,
                    average_cost: h.average_cost,
                    total_cost: h.total_cost,
                }
            })
            .collect();

        Ok(PortfolioValuator::value(
            portfolio_id,
            holdings,
            &latest_close,
        ))
    }
}
