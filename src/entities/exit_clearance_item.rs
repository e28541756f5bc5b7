use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Checklist row seeded from company templates at approval time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exit_clearance_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub resignation_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_completed: bool,
    pub completed_by: Option<i64>,
    pub completed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resignation::Entity",
        from = "Column::ResignationId",
        to = "super::resignation::Column::Id"
    )]
    Resignation,
}

impl Related<super::resignation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resignation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
