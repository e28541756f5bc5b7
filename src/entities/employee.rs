use chrono::Datelike;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Operational status.
pub mod status {
    pub const ACTIVE: &str = "active";
    pub const RESIGNED: &str = "resigned";
    pub const INACTIVE: &str = "inactive";
}

/// Employment-lifecycle status, driven by the resignation engine.
pub mod employment_status {
    pub const EMPLOYED: &str = "employed";
    pub const NOTICE: &str = "notice";
    pub const RESIGNED_PENDING: &str = "resigned_pending";
    pub const EXITED: &str = "exited";
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    /// External code, unique per company
    pub employee_code: String,
    pub name: String,
    /// National ID, digits only after normalisation
    pub ic_number: String,
    pub join_date: Date,
    pub status: String,
    pub employment_status: String,
    pub last_working_day: Option<Date>,
    pub resign_date: Option<Date>,
    pub default_basic_salary: Decimal,
    pub default_bonus: Decimal,
    /// Multiplier applied to the OT hourly rate
    pub ot_rate: Decimal,
    pub marital_status: Option<String>,
    pub spouse_working: bool,
    pub children_count: i32,
    pub region: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status == status::ACTIVE
    }

    /// Age in completed years derived from the IC number (YYMMDD prefix).
    /// Returns None when the prefix does not parse as a date.
    pub fn age_from_ic(&self, today: Date) -> Option<i32> {
        let digits: String = self.ic_number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 6 {
            return None;
        }
        let yy: i32 = digits[0..2].parse().ok()?;
        let mm: u32 = digits[2..4].parse().ok()?;
        let dd: u32 = digits[4..6].parse().ok()?;
        // IC years roll over at 2000; anyone "born in the future" is 19xx.
        let mut year = 2000 + yy;
        if year > today.year() {
            year -= 100;
        }
        let dob = Date::from_ymd_opt(year, mm, dd)?;
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        Some(age)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::outlet::Entity",
        from = "Column::OutletId",
        to = "super::outlet::Column::Id"
    )]
    Outlet,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::position::Entity",
        from = "Column::PositionId",
        to = "super::position::Column::Id"
    )]
    Position,
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedules,
    #[sea_orm(has_many = "super::clock_record::Entity")]
    ClockRecords,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::outlet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outlet.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::position::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Position.def()
    }
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
    }
}

impl Related<super::clock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClockRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn employee(ic: &str) -> Model {
        Model {
            id: 1,
            company_id: 1,
            outlet_id: None,
            department_id: None,
            position_id: None,
            employee_code: "EMP001".into(),
            name: "Aminah".into(),
            ic_number: ic.into(),
            join_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            status: status::ACTIVE.into(),
            employment_status: employment_status::EMPLOYED.into(),
            last_working_day: None,
            resign_date: None,
            default_basic_salary: dec!(3000),
            default_bonus: Decimal::ZERO,
            ot_rate: dec!(1.5),
            marital_status: None,
            spouse_working: false,
            children_count: 0,
            region: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn age_from_ic_handles_century_rollover() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        // 1990-05-20
        assert_eq!(employee("900520-10-5678").age_from_ic(today), Some(35));
        // 2002-07-01: birthday not yet reached in June
        assert_eq!(employee("020701145678").age_from_ic(today), Some(22));
    }

    #[test]
    fn age_from_ic_rejects_garbage() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(employee("abc").age_from_ic(today), None);
        assert_eq!(employee("991345000000").age_from_ic(today), None);
    }
}
