use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "salary_advance_deductions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub advance_id: i64,
    pub amount: Decimal,
    pub payroll_month: i32,
    pub payroll_year: i32,
    pub deducted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::salary_advance::Entity",
        from = "Column::AdvanceId",
        to = "super::salary_advance::Column::Id"
    )]
    Advance,
}

impl Related<super::salary_advance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
