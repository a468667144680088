//! Property-based tests for the portfolio valuator.

use std::collections::HashMap;

use bux_shared::types::{PortfolioId, SecurityId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::ValuedHolding;
use super::valuator::PortfolioValuator;

fn holdings() -> impl Strategy<Value = Vec<(ValuedHolding, Option<Decimal>)>> {
    prop::collection::vec(
        (
            1i64..1_000_000i64,
            1i64..1_000_000i64,
            prop::option::of(0i64..1_000_000i64),
        ),
        0..15,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (qty, avg, close))| {
                let quantity = Decimal::new(qty, 2);
                let average_cost = Decimal::new(avg, 2);
                let id = i64::try_from(i).unwrap() + 1;
                (
                    ValuedHolding {
                        security_id: SecurityId::new(id),
                        symbol: format!("S{id}"),
                        name: format!("Security {id}"),
                        quantity,
                        average_cost,
                        total_cost: quantity * average_cost,
                    },
                    close.map(|c| Decimal::new(c, 2)),
                )
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Totals are the sums of the per-holding figures.
    #[test]
    fn prop_totals_are_sums(rows in holdings()) {
        let prices: HashMap<SecurityId, Decimal> = rows
            .iter()
            .filter_map(|(h, close)| close.map(|c| (h.security_id, c)))
            .collect();
        let input: Vec<ValuedHolding> = rows.into_iter().map(|(h, _)| h).collect();

        let summary = PortfolioValuator::value(PortfolioId::new(1), input, &prices);

        let cost: Decimal = summary.holdings.iter().map(|h| h.total_cost).sum();
        let value: Decimal = summary.holdings.iter().map(|h| h.market_value).sum();
        prop_assert_eq!(summary.total_cost, cost);
        prop_assert_eq!(summary.total_market_value, value);
        prop_assert_eq!(summary.total_unrealized_pnl, value - cost);
    }

    /// Unpriced holdings are always break-even.
    #[test]
    fn prop_unpriced_is_break_even(rows in holdings()) {
        let input: Vec<ValuedHolding> = rows.into_iter().map(|(h, _)| h).collect();
        let summary = PortfolioValuator::value(PortfolioId::new(1), input, &HashMap::new());

        for h in &summary.holdings {
            prop_assert_eq!(h.current_price, h.average_cost);
            prop_assert_eq!(h.market_value, h.total_cost);
            prop_assert_eq!(h.unrealized_pnl, Decimal::ZERO);
            prop_assert_eq!(h.unrealized_pct, Decimal::ZERO);
        }
        prop_assert_eq!(summary.total_unrealized_pnl, Decimal::ZERO);
    }
}
