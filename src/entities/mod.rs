//! Database entities, one module per table. All tenant-scoped tables
//! carry `company_id`; queries must filter on it.

pub mod claim;
pub mod clearance_template;
pub mod clock_record;
pub mod commission_payout;
pub mod company;
pub mod data_retention_log;
pub mod department;
pub mod employee;
pub mod exit_clearance_item;
pub mod extra_shift_request;
pub mod leave_balance;
pub mod leave_request;
pub mod leave_type;
pub mod notification;
pub mod outlet;
pub mod outlet_sales;
pub mod payroll_item;
pub mod payroll_run;
pub mod position;
pub mod public_holiday;
pub mod resignation;
pub mod salary_advance;
pub mod salary_advance_deduction;
pub mod schedule;
pub mod shift_template;
