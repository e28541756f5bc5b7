use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Position role values; drive the schedule edit-window decision table.
pub mod role {
    pub const MANAGER: &str = "manager";
    pub const SUPERVISOR: &str = "supervisor";
    pub const CREW: &str = "crew";
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "positions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    /// `role::MANAGER`, `role::SUPERVISOR` or `role::CREW`
    pub role: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::employee::Entity")]
    Employees,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
