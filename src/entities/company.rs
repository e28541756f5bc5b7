use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Work-rule regime selector. Governs how derived attendance totals are
/// computed for every employee of the company.
pub mod work_rule {
    /// 8h30 standard day, shift-start clamp, >60min break deduction,
    /// OT floored to 30-minute steps.
    pub const MIMIX: &str = "mimix";
    /// 9h standard day, two sessions summed, break never deducted,
    /// OT minute-exact.
    pub const AA_ALIVE: &str = "aa_alive";
}

/// Commission grouping dimension for the company's sales rows.
pub mod grouping {
    pub const OUTLET: &str = "outlet";
    pub const DEPARTMENT: &str = "department";
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub timezone: String,
    /// `work_rule::MIMIX` or `work_rule::AA_ALIVE`
    pub work_rule: String,
    /// `grouping::OUTLET` or `grouping::DEPARTMENT`
    pub commission_grouping: String,
    /// Opaque settings blob; recognised keys decoded via [`Model::settings`]
    pub settings: Option<Json>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

/// Recognised keys of the company `settings` blob. Unrecognised keys are
/// preserved in `extra` for forward compatibility.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompanySettings {
    #[serde(default = "default_notice_period_days")]
    pub settlement_notice_period_days: i64,
    #[serde(default)]
    pub settlement_include_prorated_bonus: bool,
    #[serde(default = "default_encashment_rate")]
    pub settlement_leave_encashment_rate: Decimal,
    #[serde(default = "default_working_days_per_month")]
    pub settlement_working_days_per_month: i64,
    #[serde(default)]
    pub indoor_sales_basic: Option<Decimal>,
    #[serde(default)]
    pub indoor_sales_commission_rate: Option<Decimal>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn default_notice_period_days() -> i64 {
    30
}

fn default_encashment_rate() -> Decimal {
    Decimal::ONE
}

fn default_working_days_per_month() -> i64 {
    22
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            settlement_notice_period_days: default_notice_period_days(),
            settlement_include_prorated_bonus: false,
            settlement_leave_encashment_rate: default_encashment_rate(),
            settlement_working_days_per_month: default_working_days_per_month(),
            indoor_sales_basic: None,
            indoor_sales_commission_rate: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl Model {
    /// Decodes the settings blob, filling defaults for missing keys.
    /// A malformed blob yields the defaults rather than an error.
    pub fn settings(&self) -> CompanySettings {
        self.settings
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn is_aa_alive(&self) -> bool {
        self.work_rule == work_rule::AA_ALIVE
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::outlet::Entity")]
    Outlets,
    #[sea_orm(has_many = "super::department::Entity")]
    Departments,
    #[sea_orm(has_many = "super::employee::Entity")]
    Employees,
}

impl Related<super::outlet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outlets.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departments.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn settings_defaults_apply_when_blob_missing() {
        let settings = CompanySettings::default();
        assert_eq!(settings.settlement_notice_period_days, 30);
        assert_eq!(settings.settlement_working_days_per_month, 22);
        assert_eq!(settings.settlement_leave_encashment_rate, Decimal::ONE);
        assert!(!settings.settlement_include_prorated_bonus);
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let blob = serde_json::json!({
            "settlement_working_days_per_month": 26,
            "settlement_leave_encashment_rate": "0.5",
            "future_flag": true
        });
        let settings: CompanySettings = serde_json::from_value(blob).unwrap();
        assert_eq!(settings.settlement_working_days_per_month, 26);
        assert_eq!(settings.settlement_leave_encashment_rate, dec!(0.5));
        assert_eq!(settings.extra.get("future_flag"), Some(&Value::Bool(true)));
    }
}
