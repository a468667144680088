//! Portfolio valuator.

use std::collections::HashMap;

use bux_shared::types::{MONEY, PortfolioId, SecurityId};
use rust_decimal::Decimal;

use super::error::ValuationError;
use super::types::{DailyPrice, HoldingValuation, PortfolioSummary, ValuedHolding};

/// Portfolio valuator for business logic.
pub struct PortfolioValuator;

impl PortfolioValuator {
    /// Values a portfolio against the latest close of each security.
    ///
    /// A holding whose security has no price is shown at break-even: current
    /// price equals the average cost and P&L is zero. An empty portfolio yields
    /// an all-zero summary.
    #[must_use]
    pub fn value(
        portfolio_id: PortfolioId,
        holdings: Vec<ValuedHolding>,
        latest_close: &HashMap<SecurityId, Decimal>,
    ) -> PortfolioSummary {
        let holdings: Vec<HoldingValuation> = holdings
            .into_iter()
            .map(|h| {
                let close = latest_close.get(&h.security_id).copied();
                Self::value_holding(h, close)
            })
            .collect();

        let total_cost: Decimal = holdings.iter().map(|h| h.total_cost).sum();
        let total_market_value: Decimal = holdings.iter().map(|h| h.market_value).sum();
        let total_unrealized_pnl = total_market_value - total_cost;

        PortfolioSummary {
            portfolio_id,
            total_cost,
            total_market_value,
            total_unrealized_pnl,
            total_unrealized_pct: Self::pnl_percent(total_unrealized_pnl, total_cost),
            holdings,
        }
    }

    /// Values a single holding given its latest close, if any.
    #[must_use]
    pub fn value_holding(holding: ValuedHolding, close: Option<Decimal>) -> HoldingValuation {
        let (current_price, market_value, unrealized_pnl, unrealized_pct) = match close {
            Some(close) => {
                let market_value = holding.quantity * close;
                let pnl = market_value - holding.total_cost;
                (close, market_value, pnl, Self::pnl_percent(pnl, holding.total_cost))
            }
            None => (
                holding.average_cost,
                holding.total_cost,
                Decimal::ZERO,
                Decimal::ZERO,
            ),
        };

        HoldingValuation {
            security_id: holding.security_id,
            symbol: holding.symbol,
            name: holding.name,
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            total_cost: holding.total_cost,
            current_price,
            market_value,
            unrealized_pnl,
            unrealized_pct,
        }
    }

    /// `pnl / cost * 100` rounded to two places; zero when cost is not positive.
    #[must_use]
    pub fn pnl_percent(pnl: Decimal, cost: Decimal) -> Decimal {
        if cost <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            (pnl / cost * Decimal::ONE_HUNDRED).round_dp(2)
        }
    }

    /// Validates a daily price row before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `NegativePrice` naming the first negative OHLC field, `OutOfRange`
    /// naming the first field a money column cannot hold, or `NegativeVolume`.
    pub fn validate_price(price: &DailyPrice) -> Result<(), ValuationError> {
        let fields = [
            ("open", price.open),
            ("high", price.high),
            ("low", price.low),
            ("close", price.close),
        ];
        if let Some((name, _)) = fields.into_iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(ValuationError::NegativePrice(name));
        }
        if let Some((name, _)) = fields.into_iter().find(|(_, v)| !MONEY.fits(*v)) {
            return Err(ValuationError::OutOfRange(name));
        }
        if price.volume < 0 {
            return Err(ValuationError::NegativeVolume);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn holding(id: i64, qty: Decimal, avg: Decimal) -> ValuedHolding {
        ValuedHolding {
            security_id: SecurityId::new(id),
            symbol: format!("SEC{id}"),
            name: format!("Security {id}"),
            quantity: qty,
            average_cost: avg,
            total_cost: qty * avg,
        }
    }

    #[test]
    fn test_no_price_degrades_to_break_even() {
        let summary = PortfolioValuator::value(
            PortfolioId::new(1),
            vec![holding(1, dec!(5), dec!(20))],
            &HashMap::new(),
        );
        let h = &summary.holdings[0];
        assert_eq!(h.current_price, dec!(20));
        assert_eq!(h.market_value, dec!(100));
        assert_eq!(h.unrealized_pnl, dec!(0));
        assert_eq!(h.unrealized_pct, dec!(0));
        assert_eq!(summary.total_market_value, dec!(100));
        assert_eq!(summary.total_unrealized_pnl, dec!(0));
    }

    #[test]
    fn test_price_drives_market_value() {
        let prices = HashMap::from([(SecurityId::new(1), dec!(30))]);
        let summary = PortfolioValuator::value(
            PortfolioId::new(1),
            vec![holding(1, dec!(5), dec!(20))],
            &prices,
        );
        let h = &summary.holdings[0];
        assert_eq!(h.current_price, dec!(30));
        assert_eq!(h.market_value, dec!(150));
        assert_eq!(h.unrealized_pnl, dec!(50));
        assert_eq!(h.unrealized_pct, dec!(50));
        assert_eq!(h.symbol, "SEC1");
    }

    #[test]
    fn test_totals_mix_priced_and_unpriced() {
        let prices = HashMap::from([(SecurityId::new(1), dec!(15))]);
        let summary = PortfolioValuator::value(
            PortfolioId::new(3),
            vec![holding(1, dec!(10), dec!(10)), holding(2, dec!(2), dec!(50))],
            &prices,
        );
        assert_eq!(summary.total_cost, dec!(200));
        assert_eq!(summary.total_market_value, dec!(250));
        assert_eq!(summary.total_unrealized_pnl, dec!(50));
        assert_eq!(summary.total_unrealized_pct, dec!(25));
    }

    #[test]
    fn test_empty_portfolio_is_all_zero() {
        let summary = PortfolioValuator::value(PortfolioId::new(1), Vec::new(), &HashMap::new());
        assert_eq!(summary.total_cost, Decimal::ZERO);
        assert_eq!(summary.total_market_value, Decimal::ZERO);
        assert_eq!(summary.total_unrealized_pnl, Decimal::ZERO);
        assert_eq!(summary.total_unrealized_pct, Decimal::ZERO);
        assert!(summary.holdings.is_empty());
    }

    #[test]
    fn test_percent_rounds_and_guards_zero_cost() {
        assert_eq!(PortfolioValuator::pnl_percent(dec!(1), dec!(3)), dec!(33.33));
        assert_eq!(PortfolioValuator::pnl_percent(dec!(-2), dec!(3)), dec!(-66.67));
        assert_eq!(PortfolioValuator::pnl_percent(dec!(10), dec!(0)), dec!(0));
    }

    #[test]
    fn test_validate_price() {
        let mut price = DailyPrice {
            security_id: SecurityId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: dec!(10),
            high: dec!(12),
            low: dec!(9),
            close: dec!(11),
            volume: 1_000,
        };
        assert!(PortfolioValuator::validate_price(&price).is_ok());

        price.low = dec!(-1);
        assert_eq!(
            PortfolioValuator::validate_price(&price),
            Err(ValuationError::NegativePrice("low"))
        );

        price.low = dec!(9);
        price.close = dec!(11.00005);
        assert_eq!(
            PortfolioValuator::validate_price(&price),
            Err(ValuationError::OutOfRange("close"))
        );

        price.close = dec!(11);
        price.volume = -5;
        assert_eq!(
            PortfolioValuator::validate_price(&price),
            Err(ValuationError::NegativeVolume)
        );
    }
}
