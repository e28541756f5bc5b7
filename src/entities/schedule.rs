use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const SCHEDULED: &str = "scheduled";
    pub const OFF: &str = "off";
    pub const COMPLETED: &str = "completed";
}

/// One row per (employee, schedule_date); the unique index enforces it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub employee_id: i64,
    /// Exactly one of outlet/department drives commission grouping;
    /// both may be populated for display.
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub schedule_date: Date,
    /// Template-based shifts; ad-hoc shifts carry explicit times instead
    pub shift_template_id: Option<i64>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub is_public_holiday: bool,
    pub status: String,
    pub created_by: Option<i64>,
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
    #[sea_orm(
        belongs_to = "super::shift_template::Entity",
        from = "Column::ShiftTemplateId",
        to = "super::shift_template::Column::Id"
    )]
    ShiftTemplate,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::shift_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShiftTemplate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
