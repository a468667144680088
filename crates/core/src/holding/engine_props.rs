//! Property-based tests for the holding engine.
//!
//! - Replay is deterministic: rebuilding twice yields the same holding
//! - A surviving holding keeps `total_cost == quantity * average_cost`
//! - Quantity never goes negative and settled positions leave no holding

use bux_shared::types::TradeId;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::engine::{COST_TOLERANCE, HoldingEngine};
use super::types::{TradeRecord, TradeSide};

/// Strategy to generate quantities (0.0001 to 1,000.0000).
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate prices (0.01 to 10,000.00).
fn price() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 2))
}

/// Strategy to generate fees (0.00 to 50.00).
fn fee() -> impl Strategy<Value = Decimal> {
    (0i64..5_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn side() -> impl Strategy<Value = TradeSide> {
    prop_oneof![3 => Just(TradeSide::Buy), 2 => Just(TradeSide::Sell)]
}

fn trade_log() -> impl Strategy<Value = Vec<TradeRecord>> {
    prop::collection::vec((side(), quantity(), price(), fee(), 0i64..30), 0..40).prop_map(
        |rows| {
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            rows.into_iter()
                .enumerate()
                .map(|(i, (side, quantity, price, fee, offset))| TradeRecord {
                    id: TradeId::new(i64::try_from(i).unwrap() + 1),
                    side,
                    quantity,
                    price,
                    fee,
                    trade_date: base + Duration::days(offset),
                })
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Rebuilding the same log twice yields identical holdings.
    #[test]
    fn prop_rebuild_is_idempotent(trades in trade_log()) {
        let first = HoldingEngine::rebuild(trades.clone());
        let second = HoldingEngine::rebuild(trades);
        prop_assert_eq!(first, second);
    }

    /// Input order of the log does not matter, only (trade_date, id).
    #[test]
    fn prop_rebuild_ignores_input_order(trades in trade_log()) {
        let mut reversed = trades.clone();
        reversed.reverse();
        prop_assert_eq!(HoldingEngine::rebuild(trades), HoldingEngine::rebuild(reversed));
    }

    /// Any surviving holding is positive and internally consistent.
    #[test]
    fn prop_holding_invariant(trades in trade_log()) {
        if let Some(h) = HoldingEngine::rebuild(trades) {
            prop_assert!(h.quantity > Decimal::ZERO);
            prop_assert!(h.total_cost >= Decimal::ZERO);
            prop_assert!(h.average_cost >= Decimal::ZERO);
            prop_assert!(h.is_consistent(COST_TOLERANCE));
        }
    }

    /// Buying only never settles and the basis equals the sum of costs and fees.
    #[test]
    fn prop_buys_accumulate_cost(
        buys in prop::collection::vec((quantity(), price(), fee()), 1..20),
    ) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut expected_qty = Decimal::ZERO;
        let mut expected_cost = Decimal::ZERO;
        let trades: Vec<TradeRecord> = buys
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, price, fee))| {
                expected_qty += quantity;
                expected_cost += quantity * price + fee;
                TradeRecord {
                    id: TradeId::new(i64::try_from(i).unwrap() + 1),
                    side: TradeSide::Buy,
                    quantity,
                    price,
                    fee,
                    trade_date: base,
                }
            })
            .collect();

        let h = HoldingEngine::rebuild(trades).unwrap();
        prop_assert_eq!(h.quantity, expected_qty);
        prop_assert_eq!(h.total_cost, expected_cost);
    }
}
