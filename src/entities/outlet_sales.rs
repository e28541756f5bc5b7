use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const DRAFT: &str = "draft";
    pub const FINALIZED: &str = "finalized";
}

/// Monthly sales figure for one outlet or department; one row per
/// (outlet|department, period_month, period_year). The payout month N
/// covers shifts worked (N-1)-15 through N-14 inclusive.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outlet_sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    /// Exactly one of outlet_id/department_id is set
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub period_month: i32,
    pub period_year: i32,
    pub total_sales: Decimal,
    /// Percentage, default 6.00
    pub commission_rate: Decimal,
    /// total_sales x rate / 100
    pub commission_pool: Decimal,
    pub total_effective_shifts: i32,
    pub per_shift_value: Decimal,
    pub status: String,
    pub finalized_by: Option<i64>,
    pub finalized_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn is_finalized(&self) -> bool {
        self.status == status::FINALIZED
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commission_payout::Entity")]
    Payouts,
}

impl Related<super::commission_payout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payouts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
