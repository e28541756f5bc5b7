use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit of media deletions from clock records.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_retention_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub clock_record_id: i64,
    /// Comma-separated list of the photo fields cleared
    pub fields_cleared: String,
    pub deleted_by: Option<i64>,
    pub verified: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clock_record::Entity",
        from = "Column::ClockRecordId",
        to = "super::clock_record::Column::Id"
    )]
    ClockRecord,
}

impl Related<super::clock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClockRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
