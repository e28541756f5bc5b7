use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// pending -> clearing -> completed, with reject/withdraw/cancel exits.
/// At most one active row per employee (status outside the terminal set).
pub mod status {
    pub const PENDING: &str = "pending";
    pub const CLEARING: &str = "clearing";
    pub const COMPLETED: &str = "completed";
    pub const REJECTED: &str = "rejected";
    pub const WITHDRAWN: &str = "withdrawn";
    pub const CANCELLED: &str = "cancelled";

    /// Statuses that no longer count as an active resignation.
    pub const INACTIVE: [&str; 3] = [CANCELLED, WITHDRAWN, REJECTED];
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resignations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub employee_id: i64,
    pub notice_date: Date,
    pub last_working_day: Date,
    pub reason: Option<String>,
    pub status: String,
    /// Employment Act 1955 s.12(2) minimum, computed at creation
    pub required_notice_days: i32,
    pub actual_notice_days: i32,
    pub notice_waived: bool,
    pub clearance_completed: bool,
    /// Full settlement breakdown, persisted by the settlement computation
    pub settlement_breakdown: Option<Json>,
    pub settlement_net: Option<Decimal>,
    pub settlement_date: Option<DateTimeUtc>,
    pub processed_by: Option<i64>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn is_active(&self) -> bool {
        !status::INACTIVE.contains(&self.status.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(has_many = "super::exit_clearance_item::Entity")]
    ClearanceItems,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::exit_clearance_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClearanceItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
