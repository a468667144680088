//! `SeaORM` Entity for holdings table.
//!
//! Rows are derived from `trades` and rewritten on every recalculation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "holdings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub portfolio_id: i64,
    pub security_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 12)))")]
    pub average_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 12)))")]
    pub total_cost: Decimal,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portfolios::Entity",
        from = "Column::PortfolioId",
        to = "super::portfolios::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Portfolios,
    #[sea_orm(
        belongs_to = "super::securities::Entity",
        from = "Column::SecurityId",
        to = "super::securities::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Securities,
}

impl Related<super::portfolios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portfolios.def()
    }
}

impl Related<super::securities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Securities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
