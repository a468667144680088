//! Storage bounds for fixed-point columns.

use rust_decimal::Decimal;

/// A `NUMERIC(precision, scale)` column shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericColumn {
    /// Total significant digits.
    pub precision: u32,
    /// Digits after the decimal point.
    pub scale: u32,
}

/// Money amounts, prices and fees: `NUMERIC(19, 4)`.
pub const MONEY: NumericColumn = NumericColumn::new(19, 4);

/// Trade quantities: `NUMERIC(19, 8)`.
pub const QUANTITY: NumericColumn = NumericColumn::new(19, 8);

impl NumericColumn {
    /// Creates a column shape.
    #[must_use]
    pub const fn new(precision: u32, scale: u32) -> Self {
        Self { precision, scale }
    }

    /// Returns true if `value` is stored without rounding or overflow.
    ///
    /// Trailing zeros do not count against the scale: `1.50000` fits `MONEY`.
    #[must_use]
    pub fn fits(self, value: Decimal) -> bool {
        let value = value.normalize();
        if value.scale() > self.scale {
            return false;
        }
        let integer_digits = self.precision.saturating_sub(self.scale);
        let limit = Decimal::from_i128_with_scale(10_i128.pow(integer_digits), 0);
        value.abs() < limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0.0001), true)]
    #[case(dec!(1.50000), true)]
    #[case(dec!(-250.25), true)]
    #[case(dec!(999999999999999.9999), true)]
    #[case(dec!(0.00001), false)]
    #[case(dec!(1000000000000000), false)]
    fn test_money_bounds(#[case] value: Decimal, #[case] fits: bool) {
        assert_eq!(MONEY.fits(value), fits);
    }

    #[rstest]
    #[case(dec!(0.00000001), true)]
    #[case(dec!(0.000000001), false)]
    #[case(dec!(99999999999.99999999), true)]
    #[case(dec!(100000000000), false)]
    fn test_quantity_bounds(#[case] value: Decimal, #[case] fits: bool) {
        assert_eq!(QUANTITY.fits(value), fits);
    }
}
