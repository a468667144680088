//! `SeaORM` Entity for price_history table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub security_id: i64,
    pub date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub open: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub high: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub low: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub close: Decimal,
    pub volume: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::securities::Entity",
        from = "Column::SecurityId",
        to = "super::securities::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Securities,
}

impl Related<super::securities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Securities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
