//! Integration tests for trades, holdings and portfolio valuation.

mod common;

use bux_core::holding::{HoldingError, NewTrade, TradeSide};
use bux_core::valuation::DailyPrice;
use bux_db::repositories::{
    CreatePortfolioInput, CreateSecurityInput, HoldingRepository, InvestmentError,
    PortfolioRepository, PriceRepository,
};
use bux_shared::types::{PortfolioId, SecurityId, UserId};
use chrono::{Duration, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

struct Fixture {
    user_id: UserId,
    portfolio_id: PortfolioId,
    security_id: SecurityId,
}

async fn setup(db: &DatabaseConnection) -> Fixture {
    let user_id = common::unique_user();
    let portfolios = PortfolioRepository::new(db.clone());
    let portfolio = portfolios
        .create_portfolio(CreatePortfolioInput {
            user_id,
            name: "Long term".to_string(),
            currency: common::usd(),
        })
        .await
        .unwrap();
    let security = portfolios
        .create_security(CreateSecurityInput {
            symbol: common::unique_symbol("T"),
            name: "Test Corp".to_string(),
            currency: common::usd(),
        })
        .await
        .unwrap();
    Fixture {
        user_id,
        portfolio_id: PortfolioId::new(portfolio.id),
        security_id: SecurityId::new(security.id),
    }
}

fn trade(f: &Fixture, side: TradeSide, quantity: Decimal, price: Decimal, age_days: i64) -> NewTrade {
    NewTrade {
        portfolio_id: f.portfolio_id,
        security_id: f.security_id,
        side,
        quantity,
        price,
        fee: Decimal::ZERO,
        trade_date: Utc::now() - Duration::days(age_days),
        note: None,
    }
}

#[tokio::test]
async fn test_buy_sell_sequence_settles_holding() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());

    let out = repo
        .execute_trade(f.user_id, trade(&f, TradeSide::Buy, dec!(10), dec!(100), 3))
        .await
        .unwrap();
    let holding = out.holding.unwrap();
    assert_eq!(holding.quantity, dec!(10));
    assert_eq!(holding.average_cost, dec!(100));
    assert_eq!(holding.total_cost, dec!(1000));

    let out = repo
        .execute_trade(f.user_id, trade(&f, TradeSide::Sell, dec!(4), dec!(120), 2))
        .await
        .unwrap();
    let holding = out.holding.unwrap();
    assert_eq!(holding.quantity, dec!(6));
    assert_eq!(holding.average_cost, dec!(100));
    assert_eq!(holding.total_cost, dec!(600));

    let out = repo
        .execute_trade(f.user_id, trade(&f, TradeSide::Sell, dec!(6), dec!(90), 1))
        .await
        .unwrap();
    assert!(out.holding.is_none());
    assert!(repo.list_holdings(f.user_id, f.portfolio_id).await.unwrap().is_empty());
    assert_eq!(repo.list_trades(f.user_id, f.portfolio_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_two_buys_blend_average_cost() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());

    repo.execute_trade(f.user_id, trade(&f, TradeSide::Buy, dec!(10), dec!(100), 2))
        .await
        .unwrap();
    let out = repo
        .execute_trade(f.user_id, trade(&f, TradeSide::Buy, dec!(10), dec!(200), 1))
        .await
        .unwrap();

    let holding = out.holding.unwrap();
    assert_eq!(holding.quantity, dec!(20));
    assert_eq!(holding.average_cost, dec!(150));
    assert_eq!(holding.total_cost, dec!(3000));
}

#[tokio::test]
async fn test_recalculate_is_idempotent() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());
    repo.execute_trade(f.user_id, trade(&f, TradeSide::Buy, dec!(3), dec!(33.33), 1))
        .await
        .unwrap();

    let first = repo.recalculate(f.portfolio_id, f.security_id).await.unwrap().unwrap();
    let second = repo.recalculate(f.portfolio_id, f.security_id).await.unwrap().unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.quantity, second.quantity);
    assert_eq!(first.average_cost, second.average_cost);
    assert_eq!(first.total_cost, second.total_cost);
}

#[tokio::test]
async fn test_concurrent_buys_do_not_lose_updates() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());

    let results = join_all((0..10).map(|_| {
        let repo = repo.clone();
        let t = trade(&f, TradeSide::Buy, dec!(1), dec!(50), 1);
        let user_id = f.user_id;
        async move { repo.execute_trade(user_id, t).await }
    }))
    .await;
    assert!(results.iter().all(Result::is_ok));

    let holdings = repo.list_holdings(f.user_id, f.portfolio_id).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].0.quantity, dec!(10));
    assert_eq!(holdings[0].0.total_cost, dec!(500));
}

#[tokio::test]
async fn test_invalid_trade_is_rejected_before_write() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());

    let err = repo
        .execute_trade(f.user_id, trade(&f, TradeSide::Buy, dec!(0), dec!(10), 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InvestmentError::Holding(HoldingError::NonPositiveQuantity)
    ));
    assert!(repo.list_trades(f.user_id, f.portfolio_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_portfolio_is_denied() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());

    let err = repo
        .execute_trade(
            common::unique_user(),
            trade(&f, TradeSide::Buy, dec!(1), dec!(10), 1),
        )
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 403);

    let err = repo
        .list_holdings(f.user_id, PortfolioId::new(i64::MAX))
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_valuation_with_and_without_price() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let repo = HoldingRepository::new(db.clone());
    repo.execute_trade(f.user_id, trade(&f, TradeSide::Buy, dec!(5), dec!(20), 1))
        .await
        .unwrap();

    let summary = repo.value_portfolio(f.user_id, f.portfolio_id).await.unwrap();
    let holding = &summary.holdings[0];
    assert_eq!(holding.current_price, dec!(20));
    assert_eq!(holding.market_value, dec!(100));
    assert_eq!(holding.unrealized_pnl, dec!(0));

    let prices = PriceRepository::new(db.clone());
    let today = Utc::now().date_naive();
    for (date, close) in [(today - Duration::days(1), dec!(25)), (today, dec!(30))] {
        prices
            .upsert_daily_price(DailyPrice {
                security_id: f.security_id,
                date,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .await
            .unwrap();
    }

    let summary = repo.value_portfolio(f.user_id, f.portfolio_id).await.unwrap();
    let holding = &summary.holdings[0];
    assert_eq!(holding.current_price, dec!(30));
    assert_eq!(holding.market_value, dec!(150));
    assert_eq!(holding.unrealized_pnl, dec!(50));
    assert_eq!(holding.unrealized_pct, dec!(50));
    assert_eq!(summary.total_unrealized_pnl, dec!(50));
}

#[tokio::test]
async fn test_price_upsert_replaces_same_day() {
    let Some(db) = common::connect().await else {
        return;
    };
    let f = setup(&db).await;
    let prices = PriceRepository::new(db.clone());
    let today = Utc::now().date_naive();

    let mut price = DailyPrice {
        security_id: f.security_id,
        date: today,
        open: dec!(10),
        high: dec!(12),
        low: dec!(9),
        close: dec!(11),
        volume: 500,
    };
    let first = prices.upsert_daily_price(price.clone()).await.unwrap();
    price.close = dec!(11.5);
    let second = prices.upsert_daily_price(price).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.close, dec!(11.5));
    let closes = prices.latest_closes(&[f.security_id]).await.unwrap();
    assert_eq!(closes.get(&f.security_id), Some(&dec!(11.5)));
}
