//! Cron registry. All expressions run in the configured timezone
//! (Asia/Kuala_Lumpur by default); each job also has a manual-trigger
//! endpoint under the admin surface.

use chrono::Utc;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::ServiceError;
use crate::services::{
    auto_clockout::AutoClockoutService, driver_sync::DriverSyncService,
    holiday_notifier::HolidayNotifierService, resignations::ResignationService,
};

/// Nightly auto clock-out, closing yesterday's open records.
const AUTO_CLOCKOUT_CRON: &str = "0 5 0 * * *";
/// Employment lifecycle advance past the last working day.
const RESIGNATION_UPDATER_CRON: &str = "0 30 0 * * *";
/// Driver sync, early morning and mid-morning.
const DRIVER_SYNC_CRON_EARLY: &str = "0 30 3 * * *";
const DRIVER_SYNC_CRON_LATE: &str = "0 0 10 * * *";
/// Holiday notifier for tomorrow's public holidays.
const HOLIDAY_NOTIFIER_CRON: &str = "0 0 9 * * *";

pub struct JobRegistry {
    scheduler: JobScheduler,
}

#[derive(Clone)]
pub struct JobContext {
    pub tz: chrono_tz::Tz,
    pub auto_clockout: AutoClockoutService,
    pub holiday_notifier: HolidayNotifierService,
    pub driver_sync: DriverSyncService,
    pub resignations: ResignationService,
}

impl JobRegistry {
    pub async fn new(ctx: JobContext) -> Result<Self, ServiceError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| ServiceError::InternalError(format!("scheduler init: {}", e)))?;

        let registry = Self { scheduler };
        registry.register_all(ctx).await?;
        Ok(registry)
    }

    async fn add_job(
        &self,
        name: &'static str,
        cron: &str,
        tz: chrono_tz::Tz,
        run: impl Fn() -> futures::future::BoxFuture<'static, ()> + Send + Sync + Clone + 'static,
    ) -> Result<(), ServiceError> {
        let job = Job::new_async_tz(cron, tz, move |_uuid, _lock| {
            let run = run.clone();
            Box::pin(async move {
                info!(job = name, "cron job fired");
                run().await;
            })
        })
        .map_err(|e| ServiceError::InternalError(format!("job {}: {}", name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| ServiceError::InternalError(format!("job {}: {}", name, e)))?;
        Ok(())
    }

    async fn register_all(&self, ctx: JobContext) -> Result<(), ServiceError> {
        let tz = ctx.tz;

        {
            let svc = ctx.auto_clockout.clone();
            self.add_job("auto_clockout", AUTO_CLOCKOUT_CRON, tz, move || {
                let svc = svc.clone();
                Box::pin(async move {
                    let summary = svc.run_yesterday(tz).await;
                    if !summary.errors.is_empty() {
                        error!(errors = summary.errors.len(), "auto clock-out had failures");
                    }
                })
            })
            .await?;
        }

        {
            let svc = ctx.resignations.clone();
            self.add_job(
                "resignation_updater",
                RESIGNATION_UPDATER_CRON,
                tz,
                move || {
                    let svc = svc.clone();
                    Box::pin(async move {
                        let today = Utc::now().with_timezone(&tz).date_naive();
                        if let Err(e) = svc.advance_employment_statuses(today).await {
                            error!(error = %e, "resignation updater failed");
                        }
                    })
                },
            )
            .await?;
        }

        for cron in [DRIVER_SYNC_CRON_EARLY, DRIVER_SYNC_CRON_LATE] {
            let svc = ctx.driver_sync.clone();
            self.add_job("driver_sync", cron, tz, move || {
                let svc = svc.clone();
                Box::pin(async move {
                    let today = Utc::now().with_timezone(&tz).date_naive();
                    let mut dates = vec![today];
                    if let Some(yesterday) = today.pred_opt() {
                        dates.insert(0, yesterday);
                    }
                    let summary = svc.sync_dates(dates).await;
                    if !summary.errors.is_empty() {
                        error!(errors = summary.errors.len(), "driver sync had failures");
                    }
                })
            })
            .await?;
        }

        {
            let svc = ctx.holiday_notifier.clone();
            self.add_job("holiday_notifier", HOLIDAY_NOTIFIER_CRON, tz, move || {
                let svc = svc.clone();
                Box::pin(async move {
                    let summary = svc.run_for_tomorrow(tz).await;
                    if !summary.errors.is_empty() {
                        error!(errors = summary.errors.len(), "holiday notifier had failures");
                    }
                })
            })
            .await?;
        }

        Ok(())
    }

    pub async fn start(&self) -> Result<(), ServiceError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| ServiceError::InternalError(format!("scheduler start: {}", e)))?;
        info!("cron scheduler started");
        Ok(())
    }
}

/// Convenience constructor used from main.
pub async fn start_scheduler(ctx: JobContext) -> Result<Arc<JobRegistry>, ServiceError> {
    let registry = Arc::new(JobRegistry::new(ctx).await?);
    registry.start().await?;
    Ok(registry)
}
