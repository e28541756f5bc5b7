//! Nightly closer for yesterday's open clock records.
//!
//! A record is open when it has a first clock-in but no end-of-day
//! clock-out. Closing synthesises the missing events, flags the record
//! for admin review, and recomputes totals. Records already closed by a
//! previous run are filtered out, which makes reruns no-ops.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{clock_record, company, schedule};
use crate::errors::ServiceError;
use crate::services::work_rules::{self, DayContext, Regime};

const AUTO_CLOSE_NOTE: &str = "Auto-closed at midnight";

#[derive(Debug, Default, Serialize)]
pub struct AutoClockoutSummary {
    pub target_date: Option<NaiveDate>,
    pub processed: u64,
    pub closed: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AutoClockoutStats {
    pub total_auto_closed: u64,
    pub awaiting_review: u64,
}

#[derive(Clone)]
pub struct AutoClockoutService {
    db_pool: Arc<DbPool>,
}

impl AutoClockoutService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Closes yesterday's open records, company timezone deciding what
    /// "yesterday" means.
    pub async fn run_yesterday(&self, tz: chrono_tz::Tz) -> AutoClockoutSummary {
        let today = Utc::now().with_timezone(&tz).date_naive();
        let Some(yesterday) = today.pred_opt() else {
            return AutoClockoutSummary::default();
        };
        self.run_for_date(yesterday).await
    }

    /// Closes open records for one calendar date across all companies.
    /// Each record commits in its own transaction; one bad row never
    /// aborts the batch.
    #[instrument(skip(self))]
    pub async fn run_for_date(&self, target: NaiveDate) -> AutoClockoutSummary {
        let mut summary = AutoClockoutSummary {
            target_date: Some(target),
            ..Default::default()
        };

        let open_records = match clock_record::Entity::find()
            .filter(clock_record::Column::WorkDate.eq(target))
            .filter(clock_record::Column::ClockIn1.is_not_null())
            .filter(clock_record::Column::ClockOut2.is_null())
            .filter(clock_record::Column::IsAutoClockOut.eq(false))
            .all(&*self.db_pool)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "auto clock-out selection failed");
                summary.errors.push(e.to_string());
                return summary;
            }
        };

        let mut regimes: HashMap<i64, Regime> = HashMap::new();

        for record in open_records {
            summary.processed += 1;
            let record_id = record.id;

            let regime = match regimes.get(&record.company_id) {
                Some(r) => *r,
                None => match company::Entity::find_by_id(record.company_id)
                    .one(&*self.db_pool)
                    .await
                {
                    Ok(Some(c)) => {
                        let r = Regime::from_work_rule(&c.work_rule);
                        regimes.insert(record.company_id, r);
                        r
                    }
                    Ok(None) => {
                        summary.failed += 1;
                        summary
                            .errors
                            .push(format!("record {}: company missing", record_id));
                        continue;
                    }
                    Err(e) => {
                        summary.failed += 1;
                        summary.errors.push(format!("record {}: {}", record_id, e));
                        continue;
                    }
                },
            };

            match self.close_record(record, regime).await {
                Ok(()) => summary.closed += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(record_id, error = %e, "auto clock-out failed for record");
                    summary.errors.push(format!("record {}: {}", record_id, e));
                }
            }
        }

        info!(
            target = %target,
            processed = summary.processed,
            closed = summary.closed,
            failed = summary.failed,
            "auto clock-out finished"
        );
        summary
    }

    async fn close_record(
        &self,
        record: clock_record::Model,
        regime: Regime,
    ) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let sched = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.eq(record.employee_id))
            .filter(schedule::Column::ScheduleDate.eq(record.work_date))
            .one(&txn)
            .await?;

        let day = DayContext {
            shift_start: sched.as_ref().and_then(|s| s.start_time),
            shift_end: sched.as_ref().and_then(|s| s.end_time),
        };

        // Close at the rostered end when there is one, otherwise assume a
        // standard day from the first clock-in.
        let in_1 = record.clock_in_1.ok_or_else(|| {
            ServiceError::InternalError("open record without clock_in_1 selected".into())
        })?;
        let close_time = match day.shift_end {
            Some(end) => end,
            None => add_minutes(in_1, regime.standard_minutes()),
        };

        let mut updated = record.clone();
        if updated.clock_out_1.is_none() {
            updated.clock_out_1 = Some(close_time);
        }
        if updated.clock_in_2.is_none() {
            // Never returned from break: zero-length break keeps the
            // event prefix intact.
            updated.clock_in_2 = updated.clock_out_1;
        }
        updated.clock_out_2 = Some(close_time);

        let totals = work_rules::compute(
            regime,
            updated.clock_in_1,
            updated.clock_out_1,
            updated.clock_in_2,
            updated.clock_out_2,
            day,
        );

        let mut active: clock_record::ActiveModel = record.into();
        active.clock_out_1 = Set(updated.clock_out_1);
        active.clock_in_2 = Set(updated.clock_in_2);
        active.clock_out_2 = Set(updated.clock_out_2);
        active.total_work_minutes = Set(totals.work_minutes);
        active.total_break_minutes = Set(totals.break_minutes);
        active.ot_minutes = Set(totals.ot_minutes);
        active.is_auto_clock_out = Set(true);
        active.needs_admin_review = Set(true);
        active.notes = Set(Some(AUTO_CLOSE_NOTE.to_string()));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn stats(&self, ctx: &TenantContext) -> Result<AutoClockoutStats, ServiceError> {
        let total_auto_closed = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::IsAutoClockOut.eq(true))
            .count(&*self.db_pool)
            .await?;
        let awaiting_review = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::IsAutoClockOut.eq(true))
            .filter(clock_record::Column::NeedsAdminReview.eq(true))
            .count(&*self.db_pool)
            .await?;
        Ok(AutoClockoutStats {
            total_auto_closed,
            awaiting_review,
        })
    }
}

/// Adds minutes to a time-of-day, wrapping past midnight.
fn add_minutes(t: chrono::NaiveTime, minutes: i32) -> chrono::NaiveTime {
    t + chrono::Duration::minutes(minutes as i64)
}
