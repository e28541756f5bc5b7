pub mod admin;
pub mod attendance;
pub mod claims;
pub mod commission;
pub mod common;
pub mod leaves;
pub mod notifications;
pub mod resignations;
pub mod salary_advances;
pub mod schedules;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{
    attendance::AttendanceService,
    auto_clockout::AutoClockoutService,
    claims::ClaimsService,
    commission::CommissionService,
    driver_sync::DriverSyncService,
    holiday_notifier::HolidayNotifierService,
    leave::LeaveService,
    notifications::NotificationService,
    receipt_vision::{DisabledVision, OpenAiVision, ReceiptVision},
    resignations::ResignationService,
    retention::RetentionService,
    salary_advances::SalaryAdvanceService,
    schedules::ScheduleService,
    settlement::SettlementService,
};

// Re-export AppState so handler modules can import it locally.
pub use crate::AppState;

/// Services layer behind the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub attendance: AttendanceService,
    pub auto_clockout: AutoClockoutService,
    pub schedules: ScheduleService,
    pub commission: CommissionService,
    pub claims: ClaimsService,
    pub resignations: ResignationService,
    pub settlement: SettlementService,
    pub leave: LeaveService,
    pub salary_advances: SalaryAdvanceService,
    pub retention: RetentionService,
    pub notifications: NotificationService,
    pub holiday_notifier: HolidayNotifierService,
    pub driver_sync: DriverSyncService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, cfg: &AppConfig) -> Self {
        let vision: Arc<dyn ReceiptVision> = match cfg.openai_api_key.clone() {
            Some(key) => Arc::new(OpenAiVision::new(key)),
            None => Arc::new(DisabledVision),
        };

        let notifications = NotificationService::new(db_pool.clone());

        Self {
            attendance: AttendanceService::new(db_pool.clone()),
            auto_clockout: AutoClockoutService::new(db_pool.clone()),
            schedules: ScheduleService::new(db_pool.clone()),
            commission: CommissionService::new(db_pool.clone()),
            claims: ClaimsService::new(db_pool.clone(), vision),
            resignations: ResignationService::new(db_pool.clone()),
            settlement: SettlementService::new(db_pool.clone()),
            leave: LeaveService::new(db_pool.clone()),
            salary_advances: SalaryAdvanceService::new(db_pool.clone()),
            retention: RetentionService::new(db_pool.clone()),
            notifications: notifications.clone(),
            holiday_notifier: HolidayNotifierService::new(db_pool.clone(), notifications),
            driver_sync: DriverSyncService::new(
                db_pool,
                cfg.aaalive_api_url.clone(),
                cfg.aaalive_api_key.clone(),
            ),
        }
    }
}
