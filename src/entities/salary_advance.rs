use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const PENDING: &str = "pending";
    pub const ACTIVE: &str = "active";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";
}

pub mod deduction_method {
    pub const FULL: &str = "full";
    pub const INSTALLMENT: &str = "installment";
}

/// Employee-owed balance. Invariant at all times:
/// amount = total_deducted + remaining_balance.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "salary_advances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub employee_id: i64,
    pub amount: Decimal,
    pub deduction_method: String,
    pub installment_amount: Option<Decimal>,
    pub total_deducted: Decimal,
    pub remaining_balance: Decimal,
    pub status: String,
    pub expected_deduction_month: Option<i32>,
    pub expected_deduction_year: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(has_many = "super::salary_advance_deduction::Entity")]
    Deductions,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::salary_advance_deduction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deductions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
