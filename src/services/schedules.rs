//! Schedule store: roster rows, shift templates, role-based edit windows
//! and the weekly/monthly roster projections.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::{PositionRole, TenantContext};
use crate::db::DbPool;
use crate::entities::{
    clock_record, company, employee, extra_shift_request, position, schedule, shift_template,
};
use crate::errors::ServiceError;

/// Supervisors may only touch dates from T+3 onward.
const SUPERVISOR_EDIT_OFFSET_DAYS: i64 = 3;

/// Position roles excluded from roster grids.
const ROSTER_EXCLUDED_ROLES: [&str; 2] = [position::role::MANAGER, "admin"];

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub employee_id: i64,
    pub schedule_date: NaiveDate,
    pub shift_template_id: Option<i64>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub is_public_holiday: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub employee_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Sunday = 0 ... Saturday = 6
    pub days_of_week: Vec<u8>,
    pub shift_template_id: Option<i64>,
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkCreateSummary {
    pub created: u64,
    pub skipped: u64,
}

#[derive(Debug, Serialize)]
pub struct EditWindow {
    pub can_edit: bool,
    pub any_date: bool,
    /// First editable date for callers under a restricted window
    pub min_editable_date: Option<NaiveDate>,
}

/// One cell of the roster grid.
#[derive(Debug, Clone, Serialize)]
pub struct RosterCell {
    pub schedule_id: i64,
    pub template_code: Option<String>,
    pub color: Option<String>,
    pub is_off: bool,
    pub is_public_holiday: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RosterRow {
    pub employee_id: i64,
    pub employee_code: String,
    pub name: String,
    pub cells: Vec<Option<RosterCell>>,
}

#[derive(Debug, Serialize)]
pub struct WeeklyRoster {
    pub start_date: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<RosterRow>,
}

#[derive(Debug, Serialize)]
pub struct CopyMonthSummary {
    pub copied: u64,
    pub deleted: u64,
    pub skipped_out_of_month: u64,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub code: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub color: Option<String>,
    pub is_off: Option<bool>,
}

#[derive(Clone)]
pub struct ScheduleService {
    db_pool: Arc<DbPool>,
}

impl ScheduleService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn company_today(&self, company_id: i64) -> Result<NaiveDate, ServiceError> {
        let tz = company::Entity::find_by_id(company_id)
            .one(&*self.db_pool)
            .await?
            .and_then(|c| c.timezone.parse::<chrono_tz::Tz>().ok())
            .unwrap_or(chrono_tz::Asia::Kuala_Lumpur);
        Ok(Utc::now().with_timezone(&tz).date_naive())
    }

    /// The §4.3 decision table, evaluated against the company's calendar.
    pub fn edit_window(ctx: &TenantContext, today: NaiveDate) -> EditWindow {
        if ctx.is_elevated() || ctx.position_role == Some(PositionRole::Manager) {
            return EditWindow {
                can_edit: true,
                any_date: true,
                min_editable_date: None,
            };
        }
        if ctx.position_role == Some(PositionRole::Supervisor) {
            return EditWindow {
                can_edit: true,
                any_date: false,
                min_editable_date: Some(today + Duration::days(SUPERVISOR_EDIT_OFFSET_DAYS)),
            };
        }
        EditWindow {
            can_edit: false,
            any_date: false,
            min_editable_date: None,
        }
    }

    fn ensure_can_edit(
        ctx: &TenantContext,
        today: NaiveDate,
        date: NaiveDate,
    ) -> Result<(), ServiceError> {
        let window = Self::edit_window(ctx, today);
        if !window.can_edit {
            return Err(ServiceError::Forbidden(
                "your role may not edit schedules".into(),
            ));
        }
        if window.any_date {
            return Ok(());
        }
        match window.min_editable_date {
            Some(min) if date >= min => Ok(()),
            _ => Err(ServiceError::Forbidden(format!(
                "supervisors may only edit schedules from {} onward",
                today + Duration::days(SUPERVISOR_EDIT_OFFSET_DAYS)
            ))),
        }
    }

    pub async fn permissions(&self, ctx: &TenantContext) -> Result<EditWindow, ServiceError> {
        let today = self.company_today(ctx.company_id).await?;
        Ok(Self::edit_window(ctx, today))
    }

    async fn guarded_employee(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<employee::Model, ServiceError> {
        let emp = employee::Entity::find_by_id(employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;

        if emp.status == employee::status::RESIGNED {
            return Err(ServiceError::InvalidOperation(
                "cannot schedule a resigned employee".into(),
            ));
        }
        if let Some(lwd) = emp.last_working_day {
            if date > lwd {
                return Err(ServiceError::InvalidOperation(format!(
                    "cannot schedule beyond the employee's last working day ({})",
                    lwd
                )));
            }
        }
        Ok(emp)
    }

    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id, date = %request.schedule_date))]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        request: CreateScheduleRequest,
    ) -> Result<schedule::Model, ServiceError> {
        let today = self.company_today(ctx.company_id).await?;
        if request.schedule_date < today && !ctx.is_elevated() {
            return Err(ServiceError::Forbidden(
                "past-dated schedules require an elevated role".into(),
            ));
        }
        Self::ensure_can_edit(ctx, today, request.schedule_date)?;

        let emp = self
            .guarded_employee(ctx, request.employee_id, request.schedule_date)
            .await?;

        let duplicate = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.eq(request.employee_id))
            .filter(schedule::Column::ScheduleDate.eq(request.schedule_date))
            .one(&*self.db_pool)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "a schedule already exists for employee {} on {}",
                request.employee_id, request.schedule_date
            )));
        }

        let (start_time, end_time, status) = match request.shift_template_id {
            Some(template_id) => {
                let template = self.template(ctx, template_id).await?;
                let status = if template.is_off {
                    schedule::status::OFF
                } else {
                    schedule::status::SCHEDULED
                };
                (Some(template.start_time), Some(template.end_time), status)
            }
            None => (
                request.start_time,
                request.end_time,
                schedule::status::SCHEDULED,
            ),
        };

        let saved = schedule::ActiveModel {
            company_id: Set(ctx.company_id),
            employee_id: Set(request.employee_id),
            outlet_id: Set(request.outlet_id.or(emp.outlet_id)),
            department_id: Set(request.department_id.or(emp.department_id)),
            schedule_date: Set(request.schedule_date),
            shift_template_id: Set(request.shift_template_id),
            start_time: Set(start_time),
            end_time: Set(end_time),
            is_public_holiday: Set(request.is_public_holiday.unwrap_or(false)),
            status: Set(status.to_string()),
            created_by: Set(Some(ctx.user_id)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(schedule_id = saved.id, "schedule created");
        Ok(saved)
    }

    /// Expands the date range by days-of-week, diffs against existing
    /// rows, inserts the remainder.
    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id))]
    pub async fn bulk_create(
        &self,
        ctx: &TenantContext,
        request: BulkCreateRequest,
    ) -> Result<BulkCreateSummary, ServiceError> {
        if request.end_date < request.start_date {
            return Err(ServiceError::ValidationError(
                "end_date must not precede start_date".into(),
            ));
        }

        let wanted: Vec<NaiveDate> = iter_days(request.start_date, request.end_date)
            .filter(|d| {
                request
                    .days_of_week
                    .contains(&(d.weekday().num_days_from_sunday() as u8))
            })
            .collect();

        let existing: HashSet<NaiveDate> = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.eq(request.employee_id))
            .filter(schedule::Column::ScheduleDate.gte(request.start_date))
            .filter(schedule::Column::ScheduleDate.lte(request.end_date))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|s| s.schedule_date)
            .collect();

        let mut summary = BulkCreateSummary {
            created: 0,
            skipped: 0,
        };
        for date in wanted {
            if existing.contains(&date) {
                summary.skipped += 1;
                continue;
            }
            let result = self
                .create(
                    ctx,
                    CreateScheduleRequest {
                        employee_id: request.employee_id,
                        schedule_date: date,
                        shift_template_id: request.shift_template_id,
                        start_time: None,
                        end_time: None,
                        outlet_id: request.outlet_id,
                        department_id: request.department_id,
                        is_public_holiday: None,
                    },
                )
                .await;
            match result {
                Ok(_) => summary.created += 1,
                Err(ServiceError::Conflict(_)) => summary.skipped += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    #[instrument(skip(self, ctx))]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: i64,
        request: CreateScheduleRequest,
    ) -> Result<schedule::Model, ServiceError> {
        let existing = schedule::Entity::find_by_id(id)
            .filter(schedule::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Schedule {} not found", id)))?;

        let today = self.company_today(ctx.company_id).await?;
        // Both the current and the target date must be inside the window.
        Self::ensure_can_edit(ctx, today, existing.schedule_date)?;
        Self::ensure_can_edit(ctx, today, request.schedule_date)?;
        if existing.schedule_date < today && !ctx.is_elevated() {
            return Err(ServiceError::Forbidden(
                "past-dated schedules require an elevated role".into(),
            ));
        }

        self.guarded_employee(ctx, existing.employee_id, request.schedule_date)
            .await?;

        let mut active: schedule::ActiveModel = existing.into();
        active.schedule_date = Set(request.schedule_date);
        if let Some(template_id) = request.shift_template_id {
            let template = self.template(ctx, template_id).await?;
            active.shift_template_id = Set(Some(template.id));
            active.start_time = Set(Some(template.start_time));
            active.end_time = Set(Some(template.end_time));
            active.status = Set(if template.is_off {
                schedule::status::OFF.to_string()
            } else {
                schedule::status::SCHEDULED.to_string()
            });
        } else {
            if let Some(t) = request.start_time {
                active.start_time = Set(Some(t));
            }
            if let Some(t) = request.end_time {
                active.end_time = Set(Some(t));
            }
        }
        if let Some(ph) = request.is_public_holiday {
            active.is_public_holiday = Set(ph);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &TenantContext, id: i64) -> Result<(), ServiceError> {
        let existing = schedule::Entity::find_by_id(id)
            .filter(schedule::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Schedule {} not found", id)))?;

        let today = self.company_today(ctx.company_id).await?;
        Self::ensure_can_edit(ctx, today, existing.schedule_date)?;

        existing.delete(&*self.db_pool).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        employee_id: Option<i64>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<schedule::Model>, ServiceError> {
        let mut query =
            schedule::Entity::find().filter(schedule::Column::CompanyId.eq(ctx.company_id));
        if let Some(employee_id) = employee_id {
            query = query.filter(schedule::Column::EmployeeId.eq(employee_id));
        }
        if let Some(start) = start {
            query = query.filter(schedule::Column::ScheduleDate.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(schedule::Column::ScheduleDate.lte(end));
        }
        Ok(query
            .order_by_asc(schedule::Column::ScheduleDate)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn employee_month(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<schedule::Model>, ServiceError> {
        let (start, end) = crate::services::attendance::month_bounds(year, month)?;
        self.list(ctx, Some(employee_id), Some(start), Some(end))
            .await
    }

    /// A department's full roster for one calendar month.
    pub async fn department_month(
        &self,
        ctx: &TenantContext,
        department_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<schedule::Model>, ServiceError> {
        let (start, end) = crate::services::attendance::month_bounds(year, month)?;
        Ok(schedule::Entity::find()
            .filter(schedule::Column::CompanyId.eq(ctx.company_id))
            .filter(schedule::Column::DepartmentId.eq(department_id))
            .filter(schedule::Column::ScheduleDate.gte(start))
            .filter(schedule::Column::ScheduleDate.lte(end))
            .order_by_asc(schedule::Column::ScheduleDate)
            .all(&*self.db_pool)
            .await?)
    }

    // ---- templates ----

    async fn template(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<shift_template::Model, ServiceError> {
        shift_template::Entity::find_by_id(id)
            .filter(shift_template::Column::CompanyId.eq(ctx.company_id))
            .filter(shift_template::Column::IsActive.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shift template {} not found", id)))
    }

    pub async fn list_templates(
        &self,
        ctx: &TenantContext,
    ) -> Result<Vec<shift_template::Model>, ServiceError> {
        Ok(shift_template::Entity::find()
            .filter(shift_template::Column::CompanyId.eq(ctx.company_id))
            .filter(shift_template::Column::IsActive.eq(true))
            .order_by_asc(shift_template::Column::Code)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn create_template(
        &self,
        ctx: &TenantContext,
        request: TemplateRequest,
    ) -> Result<shift_template::Model, ServiceError> {
        Ok(shift_template::ActiveModel {
            company_id: Set(ctx.company_id),
            code: Set(request.code),
            name: Set(request.name),
            start_time: Set(request.start_time),
            end_time: Set(request.end_time),
            color: Set(request.color),
            is_off: Set(request.is_off.unwrap_or(false)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?)
    }

    pub async fn update_template(
        &self,
        ctx: &TenantContext,
        id: i64,
        request: TemplateRequest,
    ) -> Result<shift_template::Model, ServiceError> {
        let existing = self.template(ctx, id).await?;
        let mut active: shift_template::ActiveModel = existing.into();
        active.code = Set(request.code);
        active.name = Set(request.name);
        active.start_time = Set(request.start_time);
        active.end_time = Set(request.end_time);
        active.color = Set(request.color);
        if let Some(is_off) = request.is_off {
            active.is_off = Set(is_off);
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Soft delete; historical schedules keep their template reference.
    pub async fn delete_template(&self, ctx: &TenantContext, id: i64) -> Result<(), ServiceError> {
        let existing = self.template(ctx, id).await?;
        let mut active: shift_template::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db_pool).await?;
        Ok(())
    }

    // ---- template-based assignment ----

    /// Upserts the (employee, date) roster row from a template. On a
    /// working assignment any clock record for the date gains
    /// `has_schedule`.
    #[instrument(skip(self, ctx))]
    pub async fn assign(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        date: NaiveDate,
        shift_template_id: i64,
        is_public_holiday: Option<bool>,
    ) -> Result<schedule::Model, ServiceError> {
        let today = self.company_today(ctx.company_id).await?;
        Self::ensure_can_edit(ctx, today, date)?;
        let emp = self.guarded_employee(ctx, employee_id, date).await?;
        let template = self.template(ctx, shift_template_id).await?;

        let txn = self.db_pool.begin().await?;

        let status = if template.is_off {
            schedule::status::OFF
        } else {
            schedule::status::SCHEDULED
        };

        let existing = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.eq(employee_id))
            .filter(schedule::Column::ScheduleDate.eq(date))
            .one(&txn)
            .await?;

        let saved = match existing {
            Some(sched) => {
                let mut active: schedule::ActiveModel = sched.into();
                active.shift_template_id = Set(Some(template.id));
                active.start_time = Set(Some(template.start_time));
                active.end_time = Set(Some(template.end_time));
                active.status = Set(status.to_string());
                if let Some(ph) = is_public_holiday {
                    active.is_public_holiday = Set(ph);
                }
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?
            }
            None => {
                schedule::ActiveModel {
                    company_id: Set(ctx.company_id),
                    employee_id: Set(employee_id),
                    outlet_id: Set(emp.outlet_id),
                    department_id: Set(emp.department_id),
                    schedule_date: Set(date),
                    shift_template_id: Set(Some(template.id)),
                    start_time: Set(Some(template.start_time)),
                    end_time: Set(Some(template.end_time)),
                    is_public_holiday: Set(is_public_holiday.unwrap_or(false)),
                    status: Set(status.to_string()),
                    created_by: Set(Some(ctx.user_id)),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        if !template.is_off {
            if let Some(record) = clock_record::Entity::find()
                .filter(clock_record::Column::EmployeeId.eq(employee_id))
                .filter(clock_record::Column::WorkDate.eq(date))
                .one(&txn)
                .await?
            {
                let mut active: clock_record::ActiveModel = record.into();
                active.has_schedule = Set(true);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(saved)
    }

    pub async fn bulk_assign(
        &self,
        ctx: &TenantContext,
        assignments: Vec<(i64, NaiveDate)>,
        shift_template_id: i64,
    ) -> Result<BulkCreateSummary, ServiceError> {
        let mut summary = BulkCreateSummary {
            created: 0,
            skipped: 0,
        };
        for (employee_id, date) in assignments {
            match self
                .assign(ctx, employee_id, date, shift_template_id, None)
                .await
            {
                Ok(_) => summary.created += 1,
                Err(ServiceError::InvalidOperation(_)) | Err(ServiceError::Conflict(_)) => {
                    summary.skipped += 1
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    // ---- roster projections ----

    /// 7-day grid of employees x dates for an outlet or a department.
    /// Management positions never appear on the grid.
    pub async fn weekly_roster(
        &self,
        ctx: &TenantContext,
        outlet_id: Option<i64>,
        department_id: Option<i64>,
        start_date: NaiveDate,
    ) -> Result<WeeklyRoster, ServiceError> {
        let dates: Vec<NaiveDate> = (0..7).map(|i| start_date + Duration::days(i)).collect();
        let end_date = dates[6];

        let mut employee_query = employee::Entity::find()
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .filter(employee::Column::Status.eq(employee::status::ACTIVE));
        if let Some(outlet_id) = outlet_id {
            employee_query = employee_query.filter(employee::Column::OutletId.eq(outlet_id));
        }
        if let Some(department_id) = department_id {
            employee_query =
                employee_query.filter(employee::Column::DepartmentId.eq(department_id));
        }
        let employees = employee_query
            .order_by_asc(employee::Column::EmployeeCode)
            .all(&*self.db_pool)
            .await?;

        let excluded_positions: HashSet<i64> = position::Entity::find()
            .filter(position::Column::CompanyId.eq(ctx.company_id))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .filter(|p| ROSTER_EXCLUDED_ROLES.contains(&p.role.as_str()))
            .map(|p| p.id)
            .collect();

        let employees: Vec<employee::Model> = employees
            .into_iter()
            .filter(|e| {
                e.position_id
                    .map_or(true, |pid| !excluded_positions.contains(&pid))
            })
            .collect();

        let employee_ids: Vec<i64> = employees.iter().map(|e| e.id).collect();
        let schedules = schedule::Entity::find()
            .filter(schedule::Column::EmployeeId.is_in(employee_ids))
            .filter(schedule::Column::ScheduleDate.gte(start_date))
            .filter(schedule::Column::ScheduleDate.lte(end_date))
            .all(&*self.db_pool)
            .await?;

        let templates: BTreeMap<i64, shift_template::Model> = shift_template::Entity::find()
            .filter(shift_template::Column::CompanyId.eq(ctx.company_id))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut by_employee_date: BTreeMap<(i64, NaiveDate), schedule::Model> = BTreeMap::new();
        for sched in schedules {
            by_employee_date.insert((sched.employee_id, sched.schedule_date), sched);
        }

        let rows = employees
            .into_iter()
            .map(|emp| {
                let cells = dates
                    .iter()
                    .map(|date| {
                        by_employee_date.get(&(emp.id, *date)).map(|sched| {
                            let template = sched
                                .shift_template_id
                                .and_then(|tid| templates.get(&tid));
                            RosterCell {
                                schedule_id: sched.id,
                                template_code: template.map(|t| t.code.clone()),
                                color: template.and_then(|t| t.color.clone()),
                                is_off: template.map(|t| t.is_off).unwrap_or(false)
                                    || sched.status == schedule::status::OFF,
                                is_public_holiday: sched.is_public_holiday,
                                start_time: sched.start_time,
                                end_time: sched.end_time,
                                status: sched.status.clone(),
                            }
                        })
                    })
                    .collect();
                RosterRow {
                    employee_id: emp.id,
                    employee_code: emp.employee_code,
                    name: emp.name,
                    cells,
                }
            })
            .collect();

        Ok(WeeklyRoster {
            start_date,
            dates,
            rows,
        })
    }

    /// Copies a department's roster from one month to another, shifting
    /// by the offset between the months' first days. Rows whose shifted
    /// date falls outside the target month are dropped. The target range
    /// is cleared first, so repeat invocations are idempotent.
    #[instrument(skip(self, ctx))]
    pub async fn copy_month(
        &self,
        ctx: &TenantContext,
        department_id: i64,
        from_year: i32,
        from_month: u32,
        to_year: i32,
        to_month: u32,
    ) -> Result<CopyMonthSummary, ServiceError> {
        let (from_start, from_end) =
            crate::services::attendance::month_bounds(from_year, from_month)?;
        let (to_start, to_end) = crate::services::attendance::month_bounds(to_year, to_month)?;
        let offset = to_start.signed_duration_since(from_start);

        let txn = self.db_pool.begin().await?;

        let source = schedule::Entity::find()
            .filter(schedule::Column::CompanyId.eq(ctx.company_id))
            .filter(schedule::Column::DepartmentId.eq(department_id))
            .filter(schedule::Column::ScheduleDate.gte(from_start))
            .filter(schedule::Column::ScheduleDate.lte(from_end))
            .filter(schedule::Column::ShiftTemplateId.is_not_null())
            .all(&txn)
            .await?;

        let deleted = schedule::Entity::delete_many()
            .filter(schedule::Column::CompanyId.eq(ctx.company_id))
            .filter(schedule::Column::DepartmentId.eq(department_id))
            .filter(schedule::Column::ScheduleDate.gte(to_start))
            .filter(schedule::Column::ScheduleDate.lte(to_end))
            .exec(&txn)
            .await?
            .rows_affected;

        let mut summary = CopyMonthSummary {
            copied: 0,
            deleted,
            skipped_out_of_month: 0,
        };

        for sched in source {
            let target_date = sched.schedule_date + offset;
            if target_date < to_start || target_date > to_end {
                summary.skipped_out_of_month += 1;
                continue;
            }
            schedule::ActiveModel {
                company_id: Set(sched.company_id),
                employee_id: Set(sched.employee_id),
                outlet_id: Set(sched.outlet_id),
                department_id: Set(sched.department_id),
                schedule_date: Set(target_date),
                shift_template_id: Set(sched.shift_template_id),
                start_time: Set(sched.start_time),
                end_time: Set(sched.end_time),
                is_public_holiday: Set(false),
                status: Set(sched.status.clone()),
                created_by: Set(Some(ctx.user_id)),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            summary.copied += 1;
        }

        txn.commit().await?;
        info!(
            copied = summary.copied,
            deleted = summary.deleted,
            "month roster copied"
        );
        Ok(summary)
    }

    /// Clears a week of roster rows for an outlet or department.
    pub async fn clear_roster(
        &self,
        ctx: &TenantContext,
        outlet_id: Option<i64>,
        department_id: Option<i64>,
        start_date: NaiveDate,
    ) -> Result<u64, ServiceError> {
        let today = self.company_today(ctx.company_id).await?;
        Self::ensure_can_edit(ctx, today, start_date)?;

        let end_date = start_date + Duration::days(6);
        let mut query = schedule::Entity::delete_many()
            .filter(schedule::Column::CompanyId.eq(ctx.company_id))
            .filter(schedule::Column::ScheduleDate.gte(start_date))
            .filter(schedule::Column::ScheduleDate.lte(end_date));
        if let Some(outlet_id) = outlet_id {
            query = query.filter(schedule::Column::OutletId.eq(outlet_id));
        }
        if let Some(department_id) = department_id {
            query = query.filter(schedule::Column::DepartmentId.eq(department_id));
        }
        Ok(query.exec(&*self.db_pool).await?.rows_affected)
    }

    // ---- extra shift requests ----

    pub async fn create_extra_shift_request(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        shift_date: NaiveDate,
        shift_template_id: Option<i64>,
        reason: Option<String>,
    ) -> Result<extra_shift_request::Model, ServiceError> {
        self.guarded_employee(ctx, employee_id, shift_date).await?;
        Ok(extra_shift_request::ActiveModel {
            company_id: Set(ctx.company_id),
            employee_id: Set(employee_id),
            shift_date: Set(shift_date),
            shift_template_id: Set(shift_template_id),
            reason: Set(reason),
            status: Set(extra_shift_request::status::PENDING.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?)
    }

    pub async fn list_extra_shift_requests(
        &self,
        ctx: &TenantContext,
        status: Option<String>,
    ) -> Result<Vec<extra_shift_request::Model>, ServiceError> {
        let mut query = extra_shift_request::Entity::find()
            .filter(extra_shift_request::Column::CompanyId.eq(ctx.company_id));
        if let Some(status) = status {
            query = query.filter(extra_shift_request::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(extra_shift_request::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    /// Approval materialises the schedule through the assignment path.
    #[instrument(skip(self, ctx))]
    pub async fn decide_extra_shift_request(
        &self,
        ctx: &TenantContext,
        id: i64,
        approve: bool,
    ) -> Result<extra_shift_request::Model, ServiceError> {
        let request = extra_shift_request::Entity::find_by_id(id)
            .filter(extra_shift_request::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Extra shift request {} not found", id))
            })?;

        if request.status != extra_shift_request::status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "extra shift request is already {}",
                request.status
            )));
        }

        if approve {
            let template_id = request.shift_template_id.ok_or_else(|| {
                ServiceError::InvalidOperation(
                    "extra shift request has no shift template to assign".into(),
                )
            })?;
            self.assign(ctx, request.employee_id, request.shift_date, template_id, None)
                .await?;
        }

        let mut active: extra_shift_request::ActiveModel = request.into();
        active.status = Set(if approve {
            extra_shift_request::status::APPROVED.to_string()
        } else {
            extra_shift_request::status::REJECTED.to_string()
        });
        active.decided_by = Set(Some(ctx.user_id));
        active.decided_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }
}

fn iter_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), move |d| {
        let next = *d + Duration::days(1);
        (next <= end).then_some(next)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminRole;

    fn ctx(role: AdminRole, position: Option<PositionRole>) -> TenantContext {
        TenantContext {
            user_id: 1,
            company_id: 1,
            outlet_id: None,
            role,
            position_role: position,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn elevated_roles_edit_any_date() {
        for role in [
            AdminRole::SuperAdmin,
            AdminRole::Boss,
            AdminRole::Admin,
            AdminRole::Director,
        ] {
            let window = ScheduleService::edit_window(&ctx(role, None), d(2025, 6, 10));
            assert!(window.any_date, "{:?} should edit any date", role);
        }
    }

    #[test]
    fn manager_position_edits_any_date() {
        let window = ScheduleService::edit_window(
            &ctx(AdminRole::Staff, Some(PositionRole::Manager)),
            d(2025, 6, 10),
        );
        assert!(window.any_date);
    }

    #[test]
    fn supervisor_window_starts_at_t_plus_three() {
        let today = d(2025, 6, 10);
        let caller = ctx(AdminRole::Staff, Some(PositionRole::Supervisor));
        let window = ScheduleService::edit_window(&caller, today);
        assert!(!window.any_date);
        assert_eq!(window.min_editable_date, Some(d(2025, 6, 13)));

        assert!(ScheduleService::ensure_can_edit(&caller, today, d(2025, 6, 10)).is_err());
        assert!(ScheduleService::ensure_can_edit(&caller, today, d(2025, 6, 11)).is_err());
        assert!(ScheduleService::ensure_can_edit(&caller, today, d(2025, 6, 12)).is_err());
        assert!(ScheduleService::ensure_can_edit(&caller, today, d(2025, 6, 13)).is_ok());
    }

    #[test]
    fn crew_cannot_edit_at_all() {
        let caller = ctx(AdminRole::Staff, Some(PositionRole::Crew));
        let window = ScheduleService::edit_window(&caller, d(2025, 6, 10));
        assert!(!window.can_edit);
        assert!(
            ScheduleService::ensure_can_edit(&caller, d(2025, 6, 10), d(2025, 7, 1)).is_err()
        );
    }

    #[test]
    fn day_iteration_expands_by_weekday() {
        // 2025-06-01 is a Sunday.
        let days: Vec<NaiveDate> = iter_days(d(2025, 6, 1), d(2025, 6, 14))
            .filter(|day| [1u8, 3].contains(&(day.weekday().num_days_from_sunday() as u8)))
            .collect();
        // Mondays and Wednesdays in the fortnight.
        assert_eq!(
            days,
            vec![d(2025, 6, 2), d(2025, 6, 4), d(2025, 6, 9), d(2025, 6, 11)]
        );
    }
}
