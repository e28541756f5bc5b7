//! Business logic, one module per subsystem. Services hold the shared
//! pool behind `Arc` and take the caller's `TenantContext` explicitly.

pub mod attendance;
pub mod auto_clockout;
pub mod claims;
pub mod commission;
pub mod driver_sync;
pub mod holiday_notifier;
pub mod leave;
pub mod notifications;
pub mod receipt_vision;
pub mod resignations;
pub mod retention;
pub mod salary_advances;
pub mod schedules;
pub mod settlement;
pub mod statutory;
pub mod work_rules;
