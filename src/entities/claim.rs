use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const PAID: &str = "paid";
}

/// Closed category list; `accommodation` is capped at RM 80.
pub const CATEGORIES: [&str; 10] = [
    "travel",
    "parking",
    "toll",
    "meal",
    "accommodation",
    "medical",
    "phone",
    "office_supplies",
    "fuel",
    "other",
];

/// AI extraction confidence values.
pub mod confidence {
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const UNREADABLE: &str = "unreadable";
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "claims")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub employee_id: i64,
    pub claim_date: Date,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Blob-store reference for the receipt image
    pub receipt_path: Option<String>,
    /// SHA-256 over the raw image bytes; equal hashes mean same image
    pub receipt_hash: Option<String>,
    pub status: String,

    pub ai_amount: Option<Decimal>,
    pub ai_merchant: Option<String>,
    pub ai_date: Option<Date>,
    pub ai_confidence: Option<String>,
    pub ai_currency: Option<String>,

    pub auto_approved: bool,
    pub amount_capped: bool,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTimeUtc>,
    pub reject_reason: Option<String>,
    /// Null until swept into a payroll run
    pub linked_payroll_item_id: Option<i64>,
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
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
