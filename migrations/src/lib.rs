pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_company_tables;
mod m20240101_000002_create_employees_table;
mod m20240101_000003_create_schedule_tables;
mod m20240101_000004_create_clock_records_table;
mod m20240101_000005_create_commission_tables;
mod m20240101_000006_create_claims_table;
mod m20240101_000007_create_leave_tables;
mod m20240101_000008_create_resignation_tables;
mod m20240101_000009_create_payroll_tables;
mod m20240101_000010_create_notification_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_company_tables::Migration),
            Box::new(m20240101_000002_create_employees_table::Migration),
            Box::new(m20240101_000003_create_schedule_tables::Migration),
            Box::new(m20240101_000004_create_clock_records_table::Migration),
            Box::new(m20240101_000005_create_commission_tables::Migration),
            Box::new(m20240101_000006_create_claims_table::Migration),
            Box::new(m20240101_000007_create_leave_tables::Migration),
            Box::new(m20240101_000008_create_resignation_tables::Migration),
            Box::new(m20240101_000009_create_payroll_tables::Migration),
            Box::new(m20240101_000010_create_notification_tables::Migration),
        ]
    }
}
