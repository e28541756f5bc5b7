//! Attendance engine: the per-employee-per-day clock record, its 4-event
//! state machine, derived totals, and admin approval transitions.

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    clock_record::{self, status as record_status, ClockAction},
    company, employee, schedule, shift_template,
};
use crate::errors::ServiceError;
use crate::services::work_rules::{self, DayContext, Regime};

/// Payroll OT divides monthly basic by a 26-day month of 8-hour days.
/// Settlement intentionally uses a different divisor; both are kept.
const OT_DAYS_PER_MONTH: i64 = 26;
const OT_HOURS_PER_DAY: i64 = 8;

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceFilter {
    pub employee_id: Option<i64>,
    pub outlet_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminUpsertRequest {
    pub employee_id: i64,
    pub work_date: NaiveDate,
    pub clock_in_1: Option<NaiveTime>,
    pub clock_out_1: Option<NaiveTime>,
    pub clock_in_2: Option<NaiveTime>,
    pub clock_out_2: Option<NaiveTime>,
    /// Direct hour overrides, accepted for companies outside the AA Alive
    /// regime; clock times stay untouched when these are used.
    pub total_work_minutes: Option<i32>,
    pub ot_minutes: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClockRequest {
    pub employee_code: String,
    pub ic_number: String,
    pub action: ClockAction,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Base64 selfie, with or without a data-URL prefix
    pub photo: Option<String>,
    pub outlet_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ClockResponse {
    pub record: clock_record::Model,
    pub next_action: Option<ClockAction>,
}

#[derive(Debug, Default, Serialize)]
pub struct RecalculateSummary {
    pub scanned: u64,
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct OtPayrollLine {
    pub employee_id: i64,
    pub employee_code: String,
    pub name: String,
    pub ot_minutes: i64,
    pub ot_hours: Decimal,
    pub hourly_rate: Decimal,
    pub ot_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct EmployeeSummary {
    pub employee_id: i64,
    pub name: String,
    pub days_present: u32,
    pub total_work_minutes: i64,
    pub total_ot_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct PositionSummary {
    pub position: String,
    pub employees: Vec<EmployeeSummary>,
}

#[derive(Debug, Serialize)]
pub struct OutletSummary {
    pub outlet_id: Option<i64>,
    pub outlet_name: String,
    pub positions: Vec<PositionSummary>,
}

/// Media written under this directory; the object key is stored on the
/// record. Cleared by the retention job after the eligibility date.
const MEDIA_DIR: &str = "media";

#[derive(Clone)]
pub struct AttendanceService {
    db_pool: Arc<DbPool>,
}

impl AttendanceService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn company(&self, company_id: i64) -> Result<company::Model, ServiceError> {
        company::Entity::find_by_id(company_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))
    }

    /// Schedule lookup at compute time is authoritative for the shift
    /// window; clock records never carry a denormalised copy.
    async fn day_context<C: sea_orm::ConnectionTrait>(
        db: &C,
        employee_id: i64,
        work_date: NaiveDate,
    ) -> Result<DayContext, ServiceError> {
        let sched = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.eq(employee_id))
            .filter(schedule::Column::ScheduleDate.eq(work_date))
            .one(db)
            .await?;

        Ok(match sched {
            Some(s) => DayContext {
                shift_start: s.start_time,
                shift_end: s.end_time,
            },
            None => DayContext::default(),
        })
    }

    /// Recomputes derived totals on an active model from its clock events.
    async fn apply_totals<C: sea_orm::ConnectionTrait>(
        db: &C,
        regime: Regime,
        record: &clock_record::Model,
        active: &mut clock_record::ActiveModel,
    ) -> Result<(), ServiceError> {
        let ctx = Self::day_context(db, record.employee_id, record.work_date).await?;
        let totals = work_rules::compute(
            regime,
            record.clock_in_1,
            record.clock_out_1,
            record.clock_in_2,
            record.clock_out_2,
            ctx,
        );
        active.total_work_minutes = Set(totals.work_minutes);
        active.total_break_minutes = Set(totals.break_minutes);
        active.ot_minutes = Set(totals.ot_minutes);
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: AttendanceFilter,
    ) -> Result<Vec<clock_record::Model>, ServiceError> {
        let mut query = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id));

        if let Some(employee_id) = filter.employee_id {
            query = query.filter(clock_record::Column::EmployeeId.eq(employee_id));
        }
        if let Some(outlet_id) = filter.outlet_id {
            query = query.filter(clock_record::Column::OutletId.eq(outlet_id));
        }
        if let Some(status) = &filter.status {
            query = query.filter(clock_record::Column::Status.eq(status.clone()));
        }
        if let (Some(month), Some(year)) = (filter.month, filter.year) {
            let (start, end) = month_bounds(year, month)?;
            query = query
                .filter(clock_record::Column::WorkDate.gte(start))
                .filter(clock_record::Column::WorkDate.lte(end));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(clock_record::Column::WorkDate.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(clock_record::Column::WorkDate.lte(end));
        }
        if let Some(region) = &filter.region {
            let employee_ids: Vec<i64> = employee::Entity::find()
                .filter(employee::Column::CompanyId.eq(ctx.company_id))
                .filter(employee::Column::Region.eq(region.clone()))
                .all(&*self.db_pool)
                .await?
                .into_iter()
                .map(|e| e.id)
                .collect();
            query = query.filter(clock_record::Column::EmployeeId.is_in(employee_ids));
        }

        Ok(query
            .order_by_desc(clock_record::Column::WorkDate)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<clock_record::Model, ServiceError> {
        clock_record::Entity::find_by_id(id)
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Attendance record {} not found", id)))
    }

    /// Employee-facing clock action. Identity is employee code + IC; the
    /// recorded time is server time in the company's timezone.
    #[instrument(skip(self, ctx, request), fields(employee_code = %request.employee_code, action = %request.action))]
    pub async fn employee_clock(
        &self,
        ctx: &TenantContext,
        request: ClockRequest,
    ) -> Result<ClockResponse, ServiceError> {
        let employee = employee::Entity::find()
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .filter(employee::Column::EmployeeCode.eq(request.employee_code.clone()))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_code))
            })?;

        let submitted_ic = normalise_ic(&request.ic_number);
        let stored_ic = normalise_ic(&employee.ic_number);
        if submitted_ic.is_empty() || submitted_ic != stored_ic {
            return Err(ServiceError::ValidationError(
                "IC number does not match our records".into(),
            ));
        }
        if !employee.is_active() {
            return Err(ServiceError::InvalidOperation(
                "only active employees may clock in or out".into(),
            ));
        }

        let company = self.company(ctx.company_id).await?;
        let tz: chrono_tz::Tz = company
            .timezone
            .parse()
            .unwrap_or(chrono_tz::Asia::Kuala_Lumpur);
        let local = Utc::now().with_timezone(&tz);
        let today = local.date_naive();
        let now = local.time();

        let existing = clock_record::Entity::find()
            .filter(clock_record::Column::EmployeeId.eq(employee.id))
            .filter(clock_record::Column::WorkDate.eq(today))
            .one(&*self.db_pool)
            .await?;

        let location = match (request.lat, request.lng) {
            (Some(lat), Some(lng)) => Some(format!("{},{}", lat, lng)),
            _ => None,
        };
        let photo_ref = match &request.photo {
            Some(payload) => Some(
                store_photo(payload, employee.id, today, request.action)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "failed to persist clock photo");
                        e
                    })?,
            ),
            None => None,
        };

        let regime = Regime::from_work_rule(&company.work_rule);

        let record = match existing {
            None => {
                if request.action != ClockAction::ClockIn1 {
                    return Err(ServiceError::InvalidOperation(
                        "no attendance record for today; clock_in_1 must come first".into(),
                    ));
                }
                let has_schedule = schedule::Entity::find()
                    .filter(schedule::Column::EmployeeId.eq(employee.id))
                    .filter(schedule::Column::ScheduleDate.eq(today))
                    .one(&*self.db_pool)
                    .await?
                    .is_some();

                let active = clock_record::ActiveModel {
                    company_id: Set(ctx.company_id),
                    employee_id: Set(employee.id),
                    outlet_id: Set(request.outlet_id.or(employee.outlet_id)),
                    work_date: Set(today),
                    clock_in_1: Set(Some(now)),
                    location_in_1: Set(location),
                    photo_in_1: Set(photo_ref),
                    status: Set(record_status::PENDING.to_string()),
                    has_schedule: Set(has_schedule),
                    media_retention_eligible_at: Set(Some(retention_eligible_date(today))),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                };
                active.insert(&*self.db_pool).await?
            }
            Some(record) => {
                if record.event(request.action).is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "{} already recorded for today",
                        request.action
                    )));
                }
                let expected = record.next_action();
                if expected != Some(request.action) {
                    return Err(ServiceError::InvalidOperation(format!(
                        "out-of-order clock action; expected {}",
                        expected
                            .map(|a| a.to_string())
                            .unwrap_or_else(|| "none".into())
                    )));
                }

                let mut active: clock_record::ActiveModel = record.clone().into();
                let mut updated = record.clone();
                match request.action {
                    ClockAction::ClockIn1 => {
                        active.clock_in_1 = Set(Some(now));
                        active.location_in_1 = Set(location);
                        active.photo_in_1 = Set(photo_ref);
                        updated.clock_in_1 = Some(now);
                    }
                    ClockAction::ClockOut1 => {
                        active.clock_out_1 = Set(Some(now));
                        active.location_out_1 = Set(location);
                        active.photo_out_1 = Set(photo_ref);
                        updated.clock_out_1 = Some(now);
                    }
                    ClockAction::ClockIn2 => {
                        active.clock_in_2 = Set(Some(now));
                        active.location_in_2 = Set(location);
                        active.photo_in_2 = Set(photo_ref);
                        updated.clock_in_2 = Some(now);
                    }
                    ClockAction::ClockOut2 => {
                        active.clock_out_2 = Set(Some(now));
                        active.location_out_2 = Set(location);
                        active.photo_out_2 = Set(photo_ref);
                        updated.clock_out_2 = Some(now);
                    }
                }
                Self::apply_totals(&*self.db_pool, regime, &updated, &mut active).await?;
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db_pool).await?
            }
        };

        info!(employee_id = record.employee_id, action = %request.action, "clock event recorded");

        let next_action = record.next_action();
        Ok(ClockResponse {
            record,
            next_action,
        })
    }

    /// Today's record for the employee-facing app.
    pub async fn employee_today(
        &self,
        ctx: &TenantContext,
        employee_code: &str,
        ic_number: &str,
    ) -> Result<Option<clock_record::Model>, ServiceError> {
        let employee = self.verify_employee(ctx, employee_code, ic_number).await?;
        let company = self.company(ctx.company_id).await?;
        let tz: chrono_tz::Tz = company
            .timezone
            .parse()
            .unwrap_or(chrono_tz::Asia::Kuala_Lumpur);
        let today = Utc::now().with_timezone(&tz).date_naive();

        Ok(clock_record::Entity::find()
            .filter(clock_record::Column::EmployeeId.eq(employee.id))
            .filter(clock_record::Column::WorkDate.eq(today))
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn employee_history(
        &self,
        ctx: &TenantContext,
        employee_code: &str,
        ic_number: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<clock_record::Model>, ServiceError> {
        let employee = self.verify_employee(ctx, employee_code, ic_number).await?;
        let (start, end) = month_bounds(year, month)?;

        Ok(clock_record::Entity::find()
            .filter(clock_record::Column::EmployeeId.eq(employee.id))
            .filter(clock_record::Column::WorkDate.gte(start))
            .filter(clock_record::Column::WorkDate.lte(end))
            .order_by_asc(clock_record::Column::WorkDate)
            .all(&*self.db_pool)
            .await?)
    }

    async fn verify_employee(
        &self,
        ctx: &TenantContext,
        employee_code: &str,
        ic_number: &str,
    ) -> Result<employee::Model, ServiceError> {
        let employee = employee::Entity::find()
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .filter(employee::Column::EmployeeCode.eq(employee_code))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_code)))?;

        if normalise_ic(ic_number) != normalise_ic(&employee.ic_number) {
            return Err(ServiceError::ValidationError(
                "IC number does not match our records".into(),
            ));
        }
        Ok(employee)
    }

    /// Admin create-or-correct for (employee, date). Clock-time edits
    /// recompute totals; direct hour overrides are honoured for companies
    /// outside the AA Alive regime and leave clock times untouched.
    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id, work_date = %request.work_date))]
    pub async fn admin_upsert(
        &self,
        ctx: &TenantContext,
        request: AdminUpsertRequest,
    ) -> Result<clock_record::Model, ServiceError> {
        let company = self.company(ctx.company_id).await?;
        let regime = Regime::from_work_rule(&company.work_rule);

        let employee = employee::Entity::find_by_id(request.employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_id))
            })?;

        let txn = self.db_pool.begin().await?;

        let existing = clock_record::Entity::find()
            .filter(clock_record::Column::EmployeeId.eq(employee.id))
            .filter(clock_record::Column::WorkDate.eq(request.work_date))
            .one(&txn)
            .await?;

        let clock_fields_edited = request.clock_in_1.is_some()
            || request.clock_out_1.is_some()
            || request.clock_in_2.is_some()
            || request.clock_out_2.is_some();
        let totals_overridden =
            request.total_work_minutes.is_some() || request.ot_minutes.is_some();

        if totals_overridden && company.is_aa_alive() {
            return Err(ServiceError::InvalidOperation(
                "AA Alive totals are recomputed from clock times and cannot be overridden".into(),
            ));
        }

        let saved = match existing {
            None => {
                let shadow = clock_record::Model {
                    id: 0,
                    company_id: ctx.company_id,
                    employee_id: employee.id,
                    outlet_id: employee.outlet_id,
                    work_date: request.work_date,
                    clock_in_1: request.clock_in_1,
                    clock_out_1: request.clock_out_1,
                    clock_in_2: request.clock_in_2,
                    clock_out_2: request.clock_out_2,
                    location_in_1: None,
                    location_out_1: None,
                    location_in_2: None,
                    location_out_2: None,
                    photo_in_1: None,
                    photo_out_1: None,
                    photo_in_2: None,
                    photo_out_2: None,
                    total_work_minutes: 0,
                    total_break_minutes: 0,
                    ot_minutes: 0,
                    status: record_status::PENDING.to_string(),
                    is_auto_clock_out: false,
                    needs_admin_review: false,
                    has_schedule: false,
                    ot_approved: None,
                    ot_decided_by: None,
                    ot_decided_at: None,
                    ot_reject_reason: None,
                    approved_by: None,
                    approved_at: None,
                    reject_reason: None,
                    reviewed_by: None,
                    reviewed_at: None,
                    notes: request.notes.clone(),
                    media_deleted_at: None,
                    media_retention_eligible_at: Some(retention_eligible_date(request.work_date)),
                    media_deletion_logged: false,
                    created_at: Utc::now(),
                    updated_at: None,
                };
                let mut active: clock_record::ActiveModel = shadow.clone().into();
                active.id = sea_orm::ActiveValue::NotSet;
                if totals_overridden {
                    active.total_work_minutes = Set(request.total_work_minutes.unwrap_or(0));
                    active.ot_minutes = Set(request.ot_minutes.unwrap_or(0));
                } else {
                    Self::apply_totals(&txn, regime, &shadow, &mut active).await?;
                }
                active.insert(&txn).await?
            }
            Some(record) => {
                let mut updated = record.clone();
                if let Some(t) = request.clock_in_1 {
                    updated.clock_in_1 = Some(t);
                }
                if let Some(t) = request.clock_out_1 {
                    updated.clock_out_1 = Some(t);
                }
                if let Some(t) = request.clock_in_2 {
                    updated.clock_in_2 = Some(t);
                }
                if let Some(t) = request.clock_out_2 {
                    updated.clock_out_2 = Some(t);
                }

                let mut active: clock_record::ActiveModel = record.into();
                active.clock_in_1 = Set(updated.clock_in_1);
                active.clock_out_1 = Set(updated.clock_out_1);
                active.clock_in_2 = Set(updated.clock_in_2);
                active.clock_out_2 = Set(updated.clock_out_2);
                if let Some(notes) = request.notes.clone() {
                    active.notes = Set(Some(notes));
                }

                if totals_overridden && !clock_fields_edited {
                    if let Some(m) = request.total_work_minutes {
                        active.total_work_minutes = Set(m);
                    }
                    if let Some(m) = request.ot_minutes {
                        active.ot_minutes = Set(m);
                    }
                } else {
                    Self::apply_totals(&txn, regime, &updated, &mut active).await?;
                }
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?
            }
        };

        txn.commit().await?;
        info!(record_id = saved.id, "attendance record upserted");
        Ok(saved)
    }

    /// Admin write of one clock event; earlier events must exist.
    #[instrument(skip(self, ctx))]
    pub async fn set_event(
        &self,
        ctx: &TenantContext,
        id: i64,
        action: ClockAction,
        time: NaiveTime,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        let company = self.company(ctx.company_id).await?;
        let regime = Regime::from_work_rule(&company.work_rule);

        // Admin backfill may overwrite an already-set event, but may not
        // leave a gap before it.
        for earlier in ClockAction::ALL {
            if earlier == action {
                break;
            }
            if record.event(earlier).is_none() {
                return Err(ServiceError::InvalidOperation(format!(
                    "{} must be set before {}",
                    earlier, action
                )));
            }
        }

        let mut updated = record.clone();
        match action {
            ClockAction::ClockIn1 => updated.clock_in_1 = Some(time),
            ClockAction::ClockOut1 => updated.clock_out_1 = Some(time),
            ClockAction::ClockIn2 => updated.clock_in_2 = Some(time),
            ClockAction::ClockOut2 => updated.clock_out_2 = Some(time),
        }

        let mut active: clock_record::ActiveModel = record.into();
        active.clock_in_1 = Set(updated.clock_in_1);
        active.clock_out_1 = Set(updated.clock_out_1);
        active.clock_in_2 = Set(updated.clock_in_2);
        active.clock_out_2 = Set(updated.clock_out_2);
        Self::apply_totals(&*self.db_pool, regime, &updated, &mut active).await?;
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn approve(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        self.transition_to(record, record_status::APPROVED, ctx.user_id, None)
            .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn reject(
        &self,
        ctx: &TenantContext,
        id: i64,
        reason: String,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        self.transition_to(record, record_status::REJECTED, ctx.user_id, Some(reason))
            .await
    }

    /// Approves while creating the missing roster row from a template.
    #[instrument(skip(self, ctx))]
    pub async fn approve_with_schedule(
        &self,
        ctx: &TenantContext,
        id: i64,
        shift_template_id: i64,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        if record.status != record_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "attendance record is already {}",
                record.status
            )));
        }

        let template = shift_template::Entity::find_by_id(shift_template_id)
            .filter(shift_template::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shift template {} not found", shift_template_id))
            })?;

        let txn = self.db_pool.begin().await?;

        let existing = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.eq(record.employee_id))
            .filter(schedule::Column::ScheduleDate.eq(record.work_date))
            .one(&txn)
            .await?;

        match existing {
            Some(sched) => {
                let mut active: schedule::ActiveModel = sched.into();
                active.shift_template_id = Set(Some(template.id));
                active.start_time = Set(Some(template.start_time));
                active.end_time = Set(Some(template.end_time));
                active.status = Set(if template.is_off {
                    schedule::status::OFF.to_string()
                } else {
                    schedule::status::SCHEDULED.to_string()
                });
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?;
            }
            None => {
                let employee = employee::Entity::find_by_id(record.employee_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Employee {} not found",
                            record.employee_id
                        ))
                    })?;
                schedule::ActiveModel {
                    company_id: Set(ctx.company_id),
                    employee_id: Set(record.employee_id),
                    outlet_id: Set(employee.outlet_id),
                    department_id: Set(employee.department_id),
                    schedule_date: Set(record.work_date),
                    shift_template_id: Set(Some(template.id)),
                    start_time: Set(Some(template.start_time)),
                    end_time: Set(Some(template.end_time)),
                    is_public_holiday: Set(false),
                    status: Set(schedule::status::SCHEDULED.to_string()),
                    created_by: Set(Some(ctx.user_id)),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        // Recompute under the now-authoritative schedule window.
        let company = self.company(ctx.company_id).await?;
        let regime = Regime::from_work_rule(&company.work_rule);
        let mut active: clock_record::ActiveModel = record.clone().into();
        Self::apply_totals(&txn, regime, &record, &mut active).await?;
        active.has_schedule = Set(true);
        active.status = Set(record_status::APPROVED.to_string());
        active.approved_by = Set(Some(ctx.user_id));
        active.approved_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        Ok(saved)
    }

    /// Approves a record with admin-supplied totals for companies whose
    /// employees may be approved without a roster.
    #[instrument(skip(self, ctx))]
    pub async fn approve_without_schedule(
        &self,
        ctx: &TenantContext,
        id: i64,
        total_work_minutes: Option<i32>,
        ot_minutes: Option<i32>,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        if record.status != record_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "attendance record is already {}",
                record.status
            )));
        }

        let mut active: clock_record::ActiveModel = record.into();
        if let Some(m) = total_work_minutes {
            active.total_work_minutes = Set(m);
        }
        if let Some(m) = ot_minutes {
            active.ot_minutes = Set(m);
        }
        active.status = Set(record_status::APPROVED.to_string());
        active.approved_by = Set(Some(ctx.user_id));
        active.approved_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Explicit revert of an approved/rejected record back to pending.
    #[instrument(skip(self, ctx))]
    pub async fn revert(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        if record.status == record_status::PENDING {
            return Err(ServiceError::InvalidOperation(
                "attendance record is already pending".into(),
            ));
        }

        let mut active: clock_record::ActiveModel = record.into();
        active.status = Set(record_status::PENDING.to_string());
        active.approved_by = Set(None);
        active.approved_at = Set(None);
        active.reject_reason = Set(None);
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    async fn transition_to(
        &self,
        record: clock_record::Model,
        target: &str,
        admin_id: i64,
        reason: Option<String>,
    ) -> Result<clock_record::Model, ServiceError> {
        if record.status != record_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "attendance record is already {}; revert it first",
                record.status
            )));
        }

        let mut active: clock_record::ActiveModel = record.into();
        active.status = Set(target.to_string());
        match target {
            record_status::APPROVED => {
                active.approved_by = Set(Some(admin_id));
                active.approved_at = Set(Some(Utc::now()));
            }
            record_status::REJECTED => {
                let reason = reason.ok_or_else(|| {
                    ServiceError::ValidationError("a rejection reason is required".into())
                })?;
                active.reject_reason = Set(Some(reason));
                active.approved_by = Set(Some(admin_id));
                active.approved_at = Set(Some(Utc::now()));
            }
            _ => {}
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    /// OT decision tri-state: null until decided, rejection needs a reason.
    #[instrument(skip(self, ctx))]
    pub async fn decide_ot(
        &self,
        ctx: &TenantContext,
        id: i64,
        approved: bool,
        reason: Option<String>,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;

        if !approved && reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "rejecting overtime requires a reason".into(),
            ));
        }

        let mut active: clock_record::ActiveModel = record.into();
        active.ot_approved = Set(Some(approved));
        active.ot_decided_by = Set(Some(ctx.user_id));
        active.ot_decided_at = Set(Some(Utc::now()));
        active.ot_reject_reason = Set(if approved { None } else { reason });
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Bulk OT approval; per-record failures are collected, not fatal.
    pub async fn bulk_approve_ot(
        &self,
        ctx: &TenantContext,
        ids: Vec<i64>,
    ) -> Result<(u64, Vec<String>), ServiceError> {
        let mut approved = 0;
        let mut errors = Vec::new();
        for id in ids {
            match self.decide_ot(ctx, id, true, None).await {
                Ok(_) => approved += 1,
                Err(e) => errors.push(format!("record {}: {}", id, e)),
            }
        }
        Ok((approved, errors))
    }

    /// Rescans a month and rewrites derived totals where the stored values
    /// disagree with the rules. Idempotent: a second run changes nothing.
    #[instrument(skip(self, ctx))]
    pub async fn recalculate(
        &self,
        ctx: &TenantContext,
        year: i32,
        month: u32,
    ) -> Result<RecalculateSummary, ServiceError> {
        let company = self.company(ctx.company_id).await?;
        let regime = Regime::from_work_rule(&company.work_rule);
        let (start, end) = month_bounds(year, month)?;

        let records = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::WorkDate.gte(start))
            .filter(clock_record::Column::WorkDate.lte(end))
            .all(&*self.db_pool)
            .await?;

        let mut summary = RecalculateSummary::default();
        for record in records {
            summary.scanned += 1;
            let day = Self::day_context(&*self.db_pool, record.employee_id, record.work_date)
                .await?;
            let totals = work_rules::compute(
                regime,
                record.clock_in_1,
                record.clock_out_1,
                record.clock_in_2,
                record.clock_out_2,
                day,
            );
            if totals.work_minutes == record.total_work_minutes
                && totals.break_minutes == record.total_break_minutes
                && totals.ot_minutes == record.ot_minutes
            {
                continue;
            }
            let mut active: clock_record::ActiveModel = record.into();
            active.total_work_minutes = Set(totals.work_minutes);
            active.total_break_minutes = Set(totals.break_minutes);
            active.ot_minutes = Set(totals.ot_minutes);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&*self.db_pool).await?;
            summary.updated += 1;
        }

        info!(
            scanned = summary.scanned,
            updated = summary.updated,
            "recalculation finished"
        );
        Ok(summary)
    }

    /// Outlet > position > employee roll-up for the month.
    pub async fn summary(
        &self,
        ctx: &TenantContext,
        year: i32,
        month: u32,
    ) -> Result<Vec<OutletSummary>, ServiceError> {
        use std::collections::BTreeMap;

        let (start, end) = month_bounds(year, month)?;
        let records = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::WorkDate.gte(start))
            .filter(clock_record::Column::WorkDate.lte(end))
            .all(&*self.db_pool)
            .await?;

        let employees: BTreeMap<i64, employee::Model> = employee::Entity::find()
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        let outlets: BTreeMap<i64, String> = crate::entities::outlet::Entity::find()
            .filter(crate::entities::outlet::Column::CompanyId.eq(ctx.company_id))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|o| (o.id, o.name))
            .collect();
        let positions: BTreeMap<i64, String> = crate::entities::position::Entity::find()
            .filter(crate::entities::position::Column::CompanyId.eq(ctx.company_id))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        // outlet -> position -> employee -> (days, work, ot)
        let mut tree: BTreeMap<Option<i64>, BTreeMap<String, BTreeMap<i64, (u32, i64, i64)>>> =
            BTreeMap::new();
        for record in records {
            let Some(emp) = employees.get(&record.employee_id) else {
                continue;
            };
            let position = emp
                .position_id
                .and_then(|id| positions.get(&id).cloned())
                .unwrap_or_else(|| "Unassigned".to_string());
            let entry = tree
                .entry(record.outlet_id.or(emp.outlet_id))
                .or_default()
                .entry(position)
                .or_default()
                .entry(emp.id)
                .or_insert((0, 0, 0));
            entry.0 += 1;
            entry.1 += record.total_work_minutes as i64;
            entry.2 += record.ot_minutes as i64;
        }

        let result = tree
            .into_iter()
            .map(|(outlet_id, by_position)| OutletSummary {
                outlet_id,
                outlet_name: outlet_id
                    .and_then(|id| outlets.get(&id).cloned())
                    .unwrap_or_else(|| "No outlet".to_string()),
                positions: by_position
                    .into_iter()
                    .map(|(position, by_employee)| PositionSummary {
                        position,
                        employees: by_employee
                            .into_iter()
                            .map(|(employee_id, (days, work, ot))| EmployeeSummary {
                                employee_id,
                                name: employees
                                    .get(&employee_id)
                                    .map(|e| e.name.clone())
                                    .unwrap_or_default(),
                                days_present: days,
                                total_work_minutes: work,
                                total_ot_minutes: ot,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(result)
    }

    /// Approved overtime for the payroll month. Only records whose OT has
    /// been explicitly approved count; undecided OT is excluded from pay.
    pub async fn ot_for_payroll(
        &self,
        ctx: &TenantContext,
        year: i32,
        month: u32,
    ) -> Result<Vec<OtPayrollLine>, ServiceError> {
        use std::collections::BTreeMap;

        let (start, end) = month_bounds(year, month)?;
        let records = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::WorkDate.gte(start))
            .filter(clock_record::Column::WorkDate.lte(end))
            .filter(clock_record::Column::OtApproved.eq(true))
            .filter(clock_record::Column::OtMinutes.gt(0))
            .all(&*self.db_pool)
            .await?;

        let mut minutes_by_employee: BTreeMap<i64, i64> = BTreeMap::new();
        for record in records {
            *minutes_by_employee.entry(record.employee_id).or_default() +=
                record.ot_minutes as i64;
        }

        let mut lines = Vec::with_capacity(minutes_by_employee.len());
        for (employee_id, ot_minutes) in minutes_by_employee {
            let Some(emp) = employee::Entity::find_by_id(employee_id)
                .one(&*self.db_pool)
                .await?
            else {
                continue;
            };
            let hourly_rate = (emp.default_basic_salary
                / Decimal::from(OT_DAYS_PER_MONTH * OT_HOURS_PER_DAY))
            .round_dp(2);
            let ot_hours = work_rules::minutes_to_hours(ot_minutes as i32);
            let ot_amount = (ot_hours * hourly_rate * emp.ot_rate).round_dp(2);
            lines.push(OtPayrollLine {
                employee_id,
                employee_code: emp.employee_code,
                name: emp.name,
                ot_minutes,
                ot_hours,
                hourly_rate,
                ot_amount,
            });
        }
        Ok(lines)
    }

    pub async fn needs_review(
        &self,
        ctx: &TenantContext,
    ) -> Result<Vec<clock_record::Model>, ServiceError> {
        Ok(clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::NeedsAdminReview.eq(true))
            .order_by_asc(clock_record::Column::WorkDate)
            .all(&*self.db_pool)
            .await?)
    }

    /// Clears the review flag on an auto-closed record, optionally
    /// overriding the computed minutes.
    #[instrument(skip(self, ctx))]
    pub async fn mark_reviewed(
        &self,
        ctx: &TenantContext,
        id: i64,
        total_work_minutes: Option<i32>,
        ot_minutes: Option<i32>,
    ) -> Result<clock_record::Model, ServiceError> {
        let record = self.get(ctx, id).await?;
        if !record.needs_admin_review {
            return Err(ServiceError::InvalidOperation(
                "attendance record is not awaiting review".into(),
            ));
        }

        let mut active: clock_record::ActiveModel = record.into();
        if let Some(m) = total_work_minutes {
            active.total_work_minutes = Set(m);
        }
        if let Some(m) = ot_minutes {
            active.ot_minutes = Set(m);
        }
        active.needs_admin_review = Set(false);
        active.reviewed_by = Set(Some(ctx.user_id));
        active.reviewed_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }
}

/// Strips dashes and whitespace; IC comparison is digits-only.
pub fn normalise_ic(ic: &str) -> String {
    ic.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Media on a record becomes deletable 6 months after the work date.
pub fn retention_eligible_date(work_date: NaiveDate) -> NaiveDate {
    work_date
        .checked_add_months(chrono::Months::new(6))
        .unwrap_or(work_date)
}

pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ServiceError::ValidationError(format!("invalid month {}-{}", year, month)))?;
    let end = start
        .checked_add_months(chrono::Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| ServiceError::ValidationError(format!("invalid month {}-{}", year, month)))?;
    Ok((start, end))
}

/// Decodes the base64 payload (tolerating a data-URL prefix) and writes it
/// under the media directory, returning the stored object key.
async fn store_photo(
    payload: &str,
    employee_id: i64,
    date: NaiveDate,
    action: ClockAction,
) -> Result<String, ServiceError> {
    use base64::Engine;

    let raw = payload
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(payload);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| ServiceError::ValidationError(format!("invalid photo payload: {}", e)))?;

    let dir = format!("{}/{}/{}", MEDIA_DIR, employee_id, date);
    let key = format!("{}/{}.jpg", dir, action);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ServiceError::InternalError(format!("media store: {}", e)))?;
    tokio::fs::write(&key, bytes)
        .await
        .map_err(|e| ServiceError::InternalError(format!("media store: {}", e)))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ic_normalisation_strips_separators() {
        assert_eq!(normalise_ic("900520-10-5678"), "900520105678");
        assert_eq!(normalise_ic(" 900520 10 5678 "), "900520105678");
        assert_eq!(normalise_ic("abc"), "");
    }

    #[test]
    fn retention_eligibility_is_six_months_out() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            retention_eligible_date(date),
            NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
        );
        // Month-end clamping.
        let eom = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        assert_eq!(
            retention_eligible_date(eom),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn month_bounds_cover_the_calendar_month() {
        let (start, end) = month_bounds(2025, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert!(month_bounds(2025, 13).is_err());
    }
}
