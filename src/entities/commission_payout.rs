use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-employee share of a sales period; one row per
/// (outlet_sales_id, employee_id). effective = normal + 2 x public-holiday.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_payouts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub outlet_sales_id: i64,
    pub employee_id: i64,
    pub normal_shifts: i32,
    pub ph_shifts: i32,
    pub effective_shifts: i32,
    pub commission_amount: Decimal,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::outlet_sales::Entity",
        from = "Column::OutletSalesId",
        to = "super::outlet_sales::Column::Id"
    )]
    OutletSales,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::outlet_sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OutletSales.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
