//! `SeaORM` mappings for `PostgreSQL` enum types.
//!
//! Each database enum converts to and from its `bux-core` counterpart so
//! repositories never leak storage types into business logic.

use bux_core::analytics::BudgetPeriod as CoreBudgetPeriod;
use bux_core::balance::{
    TransactionStatus as CoreTransactionStatus, TransactionType as CoreTransactionType,
};
use bux_core::holding::TradeSide as CoreTradeSide;
use bux_core::recurring::Frequency as CoreFrequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "trade_side")]
pub enum TradeSide {
    #[sea_orm(string_value = "buy")]
    Buy,
    #[sea_orm(string_value = "sell")]
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "recurrence_frequency")]
pub enum RecurrenceFrequency {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "budget_period")]
pub enum BudgetPeriod {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

// ============================================================================
// Core conversions
// ============================================================================

/// Implements `From` in both directions between a storage enum and a core enum
/// with identically named variants.
macro_rules! core_enum {
    ($db:ident, $core:ident, [$($variant:ident),+]) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

core_enum!(TradeSide, CoreTradeSide, [Buy, Sell]);
core_enum!(TransactionType, CoreTransactionType, [Income, Expense, Transfer]);
core_enum!(
    TransactionStatus,
    CoreTransactionStatus,
    [Pending, Completed, Failed]
);
core_enum!(
    RecurrenceFrequency,
    CoreFrequency,
    [Daily, Weekly, Monthly, Yearly]
);
core_enum!(BudgetPeriod, CoreBudgetPeriod, [Monthly, Yearly]);

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveEnum, Iterable};

    #[test]
    fn test_db_values_match_core_wire_names() {
        for side in TradeSide::iter() {
            let core: CoreTradeSide = side.into();
            assert_eq!(side.to_value(), core.as_str());
        }
        for kind in TransactionType::iter() {
            let core: CoreTransactionType = kind.into();
            assert_eq!(kind.to_value(), core.as_str());
        }
        for status in TransactionStatus::iter() {
            let core: CoreTransactionStatus = status.into();
            assert_eq!(status.to_value(), core.as_str());
        }
        for frequency in RecurrenceFrequency::iter() {
            let core: CoreFrequency = frequency.into();
            assert_eq!(frequency.to_value(), core.as_str());
        }
        for period in BudgetPeriod::iter() {
            let core: CoreBudgetPeriod = period.into();
            assert_eq!(period.to_value(), core.as_str());
        }
    }

    #[test]
    fn test_core_round_trip() {
        let core = CoreTransactionType::Transfer;
        assert_eq!(CoreTransactionType::from(TransactionType::from(core)), core);
    }
}
