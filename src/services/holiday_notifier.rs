//! Public-holiday notifier: the evening before a holiday, staff in
//! departments with no roster that day are told they are off.
//!
//! Runs for tomorrow only. Outlet-grouped companies are skipped; their
//! rosters live on a different dimension and the original behaviour is
//! preserved. Departments with any scheduled or completed shift on the
//! holiday are "working" and nobody in them is notified.

use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::db::DbPool;
use crate::entities::{
    company, department, employee, notification::reference_type, public_holiday, schedule,
};
use crate::errors::ServiceError;
use crate::services::notifications::NotificationService;

#[derive(Debug, Default, Serialize)]
pub struct NotifierSummary {
    pub target_date: Option<NaiveDate>,
    pub holidays_found: u64,
    pub notified: u64,
    pub working_departments: u64,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct HolidayNotifierService {
    db_pool: Arc<DbPool>,
    notifications: NotificationService,
}

impl HolidayNotifierService {
    pub fn new(db_pool: Arc<DbPool>, notifications: NotificationService) -> Self {
        Self {
            db_pool,
            notifications,
        }
    }

    pub async fn run_for_tomorrow(&self, tz: chrono_tz::Tz) -> NotifierSummary {
        let today = Utc::now().with_timezone(&tz).date_naive();
        let Some(tomorrow) = today.succ_opt() else {
            return NotifierSummary::default();
        };
        self.run_for_date(tomorrow).await
    }

    #[instrument(skip(self))]
    pub async fn run_for_date(&self, target: NaiveDate) -> NotifierSummary {
        let mut summary = NotifierSummary {
            target_date: Some(target),
            ..Default::default()
        };

        let holidays = match public_holiday::Entity::find()
            .filter(public_holiday::Column::HolidayDate.eq(target))
            .all(&*self.db_pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "holiday lookup failed");
                summary.errors.push(e.to_string());
                return summary;
            }
        };
        summary.holidays_found = holidays.len() as u64;

        for holiday in holidays {
            if let Err(e) = self.notify_company(&holiday, target, &mut summary).await {
                error!(holiday_id = holiday.id, error = %e, "holiday notification failed");
                summary
                    .errors
                    .push(format!("holiday {}: {}", holiday.id, e));
            }
        }

        info!(
            target = %target,
            notified = summary.notified,
            "holiday notifier finished"
        );
        summary
    }

    async fn notify_company(
        &self,
        holiday: &public_holiday::Model,
        target: NaiveDate,
        summary: &mut NotifierSummary,
    ) -> Result<(), ServiceError> {
        let Some(company) = company::Entity::find_by_id(holiday.company_id)
            .one(&*self.db_pool)
            .await?
        else {
            return Ok(());
        };
        if !company.is_active || company.commission_grouping == company::grouping::OUTLET {
            return Ok(());
        }

        let body = format!("{} on {} - no shifts rostered, enjoy the day off", holiday.name, target);

        // Employee ids with a working schedule on the holiday.
        let working_ids: HashSet<i64> = schedule::Entity::find()
            .filter(schedule::Column::CompanyId.eq(company.id))
            .filter(schedule::Column::ScheduleDate.eq(target))
            .filter(schedule::Column::Status.is_in([
                schedule::status::SCHEDULED,
                schedule::status::COMPLETED,
            ]))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|s| s.employee_id)
            .collect();

        let departments = department::Entity::find()
            .filter(department::Column::CompanyId.eq(company.id))
            .filter(department::Column::IsActive.eq(true))
            .all(&*self.db_pool)
            .await?;

        for dept in departments {
            let staff = employee::Entity::find()
                .filter(employee::Column::DepartmentId.eq(dept.id))
                .filter(employee::Column::Status.eq(employee::status::ACTIVE))
                .all(&*self.db_pool)
                .await?;

            if staff.iter().any(|e| working_ids.contains(&e.id)) {
                summary.working_departments += 1;
                continue;
            }

            for emp in staff {
                if self
                    .notifications
                    .notify_once(
                        company.id,
                        emp.id,
                        &holiday.name,
                        &body,
                        reference_type::PUBLIC_HOLIDAY,
                        holiday.id,
                    )
                    .await?
                {
                    summary.notified += 1;
                }
            }
        }

        // Staff outside any department are judged on their own roster.
        let unassigned = employee::Entity::find()
            .filter(employee::Column::CompanyId.eq(company.id))
            .filter(employee::Column::DepartmentId.is_null())
            .filter(employee::Column::Status.eq(employee::status::ACTIVE))
            .all(&*self.db_pool)
            .await?;
        for emp in unassigned {
            if working_ids.contains(&emp.id) {
                continue;
            }
            if self
                .notifications
                .notify_once(
                    company.id,
                    emp.id,
                    &holiday.name,
                    &body,
                    reference_type::PUBLIC_HOLIDAY,
                    holiday.id,
                )
                .await?
            {
                summary.notified += 1;
            }
        }

        Ok(())
    }
}
