//! Typed IDs for type-safe entity references.
//!
//! Every entity is keyed by a database-assigned `BIGSERIAL`. Wrapping the raw
//! integer prevents accidentally passing an `AccountId` where a `PortfolioId`
//! is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates an ID from a raw database key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user, as resolved by the auth collaborator.");
typed_id!(AccountId, "Unique identifier for a cash account.");
typed_id!(TransactionId, "Unique identifier for a ledger transaction.");
typed_id!(
    RecurringTransactionId,
    "Unique identifier for a recurring transaction rule."
);
typed_id!(CategoryId, "Unique identifier for a transaction category.");
typed_id!(BudgetId, "Unique identifier for a budget.");
typed_id!(PortfolioId, "Unique identifier for an investment portfolio.");
typed_id!(SecurityId, "Unique identifier for a tradable security.");
typed_id!(TradeId, "Unique identifier for a trade.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trip_through_raw() {
        let id = AccountId::new(42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(AccountId::from(42), id);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_display_and_parse() {
        let id = PortfolioId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(PortfolioId::from_str("7").unwrap(), id);
        assert!(PortfolioId::from_str("seven").is_err());
    }

    #[test]
    fn test_ordering_follows_raw_key() {
        assert!(AccountId::new(1) < AccountId::new(2));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&SecurityId::new(11)).unwrap();
        assert_eq!(json, "11");
        let back: SecurityId = serde_json::from_str("11").unwrap();
        assert_eq!(back, SecurityId::new(11));
    }
}
