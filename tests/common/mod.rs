//! Shared test harness: in-memory SQLite with the full schema applied,
//! plus seeding helpers for the core entities.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Arc;

use kerani_api::auth::{AdminRole, TenantContext};
use kerani_api::entities::{
    clearance_template, company, department, employee, leave_balance, leave_type, outlet,
    position, public_holiday, schedule, shift_template,
};

/// One-connection in-memory SQLite; a larger pool would give every
/// connection its own empty database.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("sqlite connects");
    kerani_api::db::run_migrations(&db)
        .await
        .expect("migrations apply");
    Arc::new(db)
}

pub fn admin_ctx(company_id: i64) -> TenantContext {
    TenantContext {
        user_id: 99,
        company_id,
        outlet_id: None,
        role: AdminRole::SuperAdmin,
        position_role: None,
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

pub async fn seed_company(db: &DatabaseConnection, code: &str, work_rule: &str) -> company::Model {
    company::ActiveModel {
        code: Set(code.to_string()),
        name: Set(format!("{} Sdn Bhd", code)),
        timezone: Set("Asia/Kuala_Lumpur".to_string()),
        work_rule: Set(work_rule.to_string()),
        commission_grouping: Set(company::grouping::OUTLET.to_string()),
        settings: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("company inserts")
}

pub async fn seed_company_with_settings(
    db: &DatabaseConnection,
    code: &str,
    work_rule: &str,
    settings: serde_json::Value,
) -> company::Model {
    company::ActiveModel {
        code: Set(code.to_string()),
        name: Set(format!("{} Sdn Bhd", code)),
        timezone: Set("Asia/Kuala_Lumpur".to_string()),
        work_rule: Set(work_rule.to_string()),
        commission_grouping: Set(company::grouping::DEPARTMENT.to_string()),
        settings: Set(Some(settings)),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("company inserts")
}

pub async fn seed_outlet(db: &DatabaseConnection, company_id: i64, code: &str) -> outlet::Model {
    outlet::ActiveModel {
        company_id: Set(company_id),
        code: Set(code.to_string()),
        name: Set(format!("Outlet {}", code)),
        supervisor_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("outlet inserts")
}

pub async fn seed_department(
    db: &DatabaseConnection,
    company_id: i64,
    code: &str,
) -> department::Model {
    department::ActiveModel {
        company_id: Set(company_id),
        code: Set(code.to_string()),
        name: Set(format!("Department {}", code)),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("department inserts")
}

pub async fn seed_position(
    db: &DatabaseConnection,
    company_id: i64,
    name: &str,
    role: &str,
) -> position::Model {
    position::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        role: Set(role.to_string()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("position inserts")
}

pub struct EmployeeSeed {
    pub company_id: i64,
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub code: String,
    pub ic: String,
    pub basic_salary: Decimal,
    pub join_date: NaiveDate,
}

impl EmployeeSeed {
    pub fn new(company_id: i64, code: &str) -> Self {
        Self {
            company_id,
            outlet_id: None,
            department_id: None,
            code: code.to_string(),
            ic: "900101-10-1234".to_string(),
            basic_salary: dec!(3000),
            join_date: d(2022, 1, 1),
        }
    }

    pub fn outlet(mut self, outlet_id: i64) -> Self {
        self.outlet_id = Some(outlet_id);
        self
    }

    pub fn department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn basic(mut self, amount: Decimal) -> Self {
        self.basic_salary = amount;
        self
    }

    pub fn joined(mut self, date: NaiveDate) -> Self {
        self.join_date = date;
        self
    }

    pub fn ic(mut self, ic: &str) -> Self {
        self.ic = ic.to_string();
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> employee::Model {
        employee::ActiveModel {
            company_id: Set(self.company_id),
            outlet_id: Set(self.outlet_id),
            department_id: Set(self.department_id),
            position_id: Set(None),
            employee_code: Set(self.code.clone()),
            name: Set(format!("Employee {}", self.code)),
            ic_number: Set(self.ic),
            join_date: Set(self.join_date),
            status: Set(employee::status::ACTIVE.to_string()),
            employment_status: Set(employee::employment_status::EMPLOYED.to_string()),
            default_basic_salary: Set(self.basic_salary),
            default_bonus: Set(Decimal::ZERO),
            ot_rate: Set(dec!(1.5)),
            spouse_working: Set(false),
            children_count: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("employee inserts")
    }
}

pub async fn seed_shift_template(
    db: &DatabaseConnection,
    company_id: i64,
    code: &str,
    start: NaiveTime,
    end: NaiveTime,
    is_off: bool,
) -> shift_template::Model {
    shift_template::ActiveModel {
        company_id: Set(company_id),
        code: Set(code.to_string()),
        name: Set(format!("Shift {}", code)),
        start_time: Set(start),
        end_time: Set(end),
        color: Set(Some("#4CAF50".to_string())),
        is_off: Set(is_off),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("shift template inserts")
}

pub struct ScheduleSeed {
    pub company_id: i64,
    pub employee_id: i64,
    pub date: NaiveDate,
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub template_id: Option<i64>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub is_public_holiday: bool,
    pub status: String,
}

impl ScheduleSeed {
    pub fn new(company_id: i64, employee_id: i64, date: NaiveDate) -> Self {
        Self {
            company_id,
            employee_id,
            date,
            outlet_id: None,
            department_id: None,
            template_id: None,
            start: None,
            end: None,
            is_public_holiday: false,
            status: schedule::status::SCHEDULED.to_string(),
        }
    }

    pub fn outlet(mut self, outlet_id: i64) -> Self {
        self.outlet_id = Some(outlet_id);
        self
    }

    pub fn department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn template(mut self, template_id: i64) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn public_holiday(mut self) -> Self {
        self.is_public_holiday = true;
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> schedule::Model {
        schedule::ActiveModel {
            company_id: Set(self.company_id),
            employee_id: Set(self.employee_id),
            outlet_id: Set(self.outlet_id),
            department_id: Set(self.department_id),
            schedule_date: Set(self.date),
            shift_template_id: Set(self.template_id),
            start_time: Set(self.start),
            end_time: Set(self.end),
            is_public_holiday: Set(self.is_public_holiday),
            status: Set(self.status),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("schedule inserts")
    }
}

pub async fn seed_leave_type(
    db: &DatabaseConnection,
    company_id: i64,
    code: &str,
    is_paid: bool,
) -> leave_type::Model {
    leave_type::ActiveModel {
        company_id: Set(company_id),
        code: Set(code.to_string()),
        name: Set(format!("{} leave", code)),
        is_paid: Set(is_paid),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("leave type inserts")
}

pub async fn seed_leave_balance(
    db: &DatabaseConnection,
    company_id: i64,
    employee_id: i64,
    leave_type_id: i64,
    year: i32,
    entitled: Decimal,
    used: Decimal,
) -> leave_balance::Model {
    leave_balance::ActiveModel {
        company_id: Set(company_id),
        employee_id: Set(employee_id),
        leave_type_id: Set(leave_type_id),
        year: Set(year),
        entitled_days: Set(entitled),
        carried_forward: Set(Decimal::ZERO),
        used_days: Set(used),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("leave balance inserts")
}

pub async fn seed_clearance_template(
    db: &DatabaseConnection,
    company_id: i64,
    name: &str,
    sort_order: i32,
) -> clearance_template::Model {
    clearance_template::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        sort_order: Set(sort_order),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("clearance template inserts")
}

pub async fn seed_public_holiday(
    db: &DatabaseConnection,
    company_id: i64,
    date: NaiveDate,
    name: &str,
) -> public_holiday::Model {
    public_holiday::ActiveModel {
        company_id: Set(company_id),
        holiday_date: Set(date),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("public holiday inserts")
}
