use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod reference_type {
    pub const PUBLIC_HOLIDAY: &str = "public_holiday";
    pub const RESIGNATION: &str = "resignation";
    pub const CLAIM: &str = "claim";
}

/// Persisted notification row; delivery is handled by a separate worker.
/// (employee_id, reference_type, reference_id) carries an insert-once
/// guard so reruns of the notifier never duplicate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub employee_id: i64,
    pub title: String,
    pub body: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
