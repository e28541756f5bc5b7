//! Resignation lifecycle and exit clearance.
//!
//! pending -> clearing -> completed, with reject/withdraw exits from
//! pending and cancel from pending or clearing. Approval seeds the
//! clearance checklist and moves the employee onto notice; processing is
//! handled together with the settlement side effects in one transaction.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    clearance_template, employee, exit_clearance_item, leave_balance, leave_request,
    resignation::{self, status as res_status},
    schedule,
};
use crate::errors::ServiceError;

/// Employment Act 1955 s.12(2) minimum notice, by completed months of
/// service at the notice date.
pub fn required_notice_days(service_months: i32) -> i32 {
    if service_months < 24 {
        28
    } else if service_months < 60 {
        42
    } else {
        56
    }
}

/// Completed months between two dates.
pub fn months_of_service(join_date: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut months =
        (as_of.year() - join_date.year()) * 12 + as_of.month() as i32 - join_date.month() as i32;
    if as_of.day() < join_date.day() {
        months -= 1;
    }
    months.max(0)
}

/// Tenants without templates fall back to this company's defaults.
const DEFAULT_TEMPLATE_COMPANY: i64 = 1;

#[derive(Debug, Deserialize)]
pub struct CreateResignationRequest {
    pub employee_id: i64,
    pub notice_date: NaiveDate,
    pub last_working_day: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaveCleanupSummary {
    pub schedules_deleted: u64,
    pub pending_cancelled: u64,
    pub approved_cancelled: u64,
}

#[derive(Clone)]
pub struct ResignationService {
    db_pool: Arc<DbPool>,
}

impl ResignationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn get_guarded(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<resignation::Model, ServiceError> {
        resignation::Entity::find_by_id(id)
            .filter(resignation::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Resignation {} not found", id)))
    }

    pub async fn get(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<resignation::Model, ServiceError> {
        self.get_guarded(ctx, id).await
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        status: Option<String>,
        outlet_id: Option<i64>,
    ) -> Result<Vec<resignation::Model>, ServiceError> {
        let mut query = resignation::Entity::find()
            .filter(resignation::Column::CompanyId.eq(ctx.company_id));
        if let Some(status) = status {
            query = query.filter(resignation::Column::Status.eq(status));
        }
        let mut rows = query
            .order_by_desc(resignation::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        if let Some(outlet_id) = outlet_id {
            let outlet_employees: std::collections::HashSet<i64> = employee::Entity::find()
                .filter(employee::Column::CompanyId.eq(ctx.company_id))
                .filter(employee::Column::OutletId.eq(outlet_id))
                .all(&*self.db_pool)
                .await?
                .into_iter()
                .map(|e| e.id)
                .collect();
            rows.retain(|r| outlet_employees.contains(&r.employee_id));
        }
        Ok(rows)
    }

    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id))]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        request: CreateResignationRequest,
    ) -> Result<resignation::Model, ServiceError> {
        if request.last_working_day < request.notice_date {
            return Err(ServiceError::ValidationError(
                "last working day cannot precede the notice date".into(),
            ));
        }

        let emp = employee::Entity::find_by_id(request.employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_id))
            })?;
        if !emp.is_active() {
            return Err(ServiceError::InvalidOperation(
                "only active employees can resign".into(),
            ));
        }

        let active_existing = resignation::Entity::find()
            .filter(resignation::Column::EmployeeId.eq(emp.id))
            .filter(resignation::Column::Status.is_not_in(res_status::INACTIVE))
            .one(&*self.db_pool)
            .await?;
        if let Some(existing) = active_existing {
            return Err(ServiceError::Conflict(format!(
                "employee already has an active resignation (#{}, {})",
                existing.id, existing.status
            )));
        }

        let service_months = months_of_service(emp.join_date, request.notice_date);
        let required = required_notice_days(service_months);
        let actual = (request.last_working_day - request.notice_date).num_days() as i32;

        if actual < required {
            info!(
                employee_id = emp.id,
                required, actual, "short notice; buy-out applies at settlement"
            );
        }

        Ok(resignation::ActiveModel {
            company_id: Set(ctx.company_id),
            employee_id: Set(emp.id),
            notice_date: Set(request.notice_date),
            last_working_day: Set(request.last_working_day),
            reason: Set(request.reason),
            status: Set(res_status::PENDING.to_string()),
            required_notice_days: Set(required),
            actual_notice_days: Set(actual),
            notice_waived: Set(false),
            clearance_completed: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?)
    }

    #[instrument(skip(self, ctx, request))]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: i64,
        request: CreateResignationRequest,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != res_status::PENDING {
            return Err(ServiceError::InvalidOperation(format!(
                "only pending resignations can be edited; this one is {}",
                existing.status
            )));
        }
        if request.last_working_day < request.notice_date {
            return Err(ServiceError::ValidationError(
                "last working day cannot precede the notice date".into(),
            ));
        }

        let emp = employee::Entity::find_by_id(existing.employee_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", existing.employee_id))
            })?;

        let service_months = months_of_service(emp.join_date, request.notice_date);
        let mut active: resignation::ActiveModel = existing.into();
        active.notice_date = Set(request.notice_date);
        active.last_working_day = Set(request.last_working_day);
        active.reason = Set(request.reason);
        active.required_notice_days = Set(required_notice_days(service_months));
        active.actual_notice_days =
            Set((request.last_working_day - request.notice_date).num_days() as i32);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Approval seeds the clearance checklist and moves the employee onto
    /// notice with the last working day recorded.
    #[instrument(skip(self, ctx))]
    pub async fn approve(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != res_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "resignation is already {}",
                existing.status
            )));
        }

        let txn = self.db_pool.begin().await?;

        self.seed_clearance_items(&txn, &existing).await?;

        if let Some(emp) = employee::Entity::find_by_id(existing.employee_id)
            .one(&txn)
            .await?
        {
            let mut emp_active: employee::ActiveModel = emp.into();
            emp_active.employment_status = Set(employee::employment_status::NOTICE.to_string());
            emp_active.last_working_day = Set(Some(existing.last_working_day));
            emp_active.updated_at = Set(Some(Utc::now()));
            emp_active.update(&txn).await?;
        }

        let mut active: resignation::ActiveModel = existing.into();
        active.status = Set(res_status::CLEARING.to_string());
        active.approved_by = Set(Some(ctx.user_id));
        active.approved_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        info!(resignation_id = saved.id, "resignation approved");
        Ok(saved)
    }

    async fn seed_clearance_items<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        res: &resignation::Model,
    ) -> Result<u64, ServiceError> {
        let mut templates = clearance_template::Entity::find()
            .filter(clearance_template::Column::CompanyId.eq(res.company_id))
            .filter(clearance_template::Column::IsActive.eq(true))
            .order_by_asc(clearance_template::Column::SortOrder)
            .all(db)
            .await?;

        if templates.is_empty() && res.company_id != DEFAULT_TEMPLATE_COMPANY {
            templates = clearance_template::Entity::find()
                .filter(clearance_template::Column::CompanyId.eq(DEFAULT_TEMPLATE_COMPANY))
                .filter(clearance_template::Column::IsActive.eq(true))
                .order_by_asc(clearance_template::Column::SortOrder)
                .all(db)
                .await?;
        }

        let mut seeded = 0;
        for template in templates {
            exit_clearance_item::ActiveModel {
                resignation_id: Set(res.id),
                name: Set(template.name),
                description: Set(template.description),
                sort_order: Set(template.sort_order),
                is_completed: Set(false),
                ..Default::default()
            }
            .insert(db)
            .await?;
            seeded += 1;
        }
        Ok(seeded)
    }

    #[instrument(skip(self, ctx))]
    pub async fn reject(
        &self,
        ctx: &TenantContext,
        id: i64,
        reason: Option<String>,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != res_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "only pending resignations can be rejected; this one is {}",
                existing.status
            )));
        }
        let mut active: resignation::ActiveModel = existing.into();
        active.status = Set(res_status::REJECTED.to_string());
        if let Some(reason) = reason {
            active.reason = Set(Some(reason));
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Employee withdraws their own notice while still pending.
    #[instrument(skip(self, ctx))]
    pub async fn withdraw(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != res_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "only pending resignations can be withdrawn; this one is {}",
                existing.status
            )));
        }
        let mut active: resignation::ActiveModel = existing.into();
        active.status = Set(res_status::WITHDRAWN.to_string());
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Cancellation from pending or clearing; restores the employee's
    /// employment status when the approval had already moved it.
    #[instrument(skip(self, ctx))]
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != res_status::PENDING && existing.status != res_status::CLEARING {
            return Err(ServiceError::Conflict(format!(
                "only pending or clearing resignations can be cancelled; this one is {}",
                existing.status
            )));
        }

        let txn = self.db_pool.begin().await?;

        if existing.status == res_status::CLEARING {
            if let Some(emp) = employee::Entity::find_by_id(existing.employee_id)
                .one(&txn)
                .await?
            {
                let mut emp_active: employee::ActiveModel = emp.into();
                emp_active.employment_status =
                    Set(employee::employment_status::EMPLOYED.to_string());
                emp_active.last_working_day = Set(None);
                emp_active.updated_at = Set(Some(Utc::now()));
                emp_active.update(&txn).await?;
            }
        }

        let mut active: resignation::ActiveModel = existing.into();
        active.status = Set(res_status::CANCELLED.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        Ok(saved)
    }

    /// Waives the notice shortfall, zeroing the buy-out at settlement.
    #[instrument(skip(self, ctx))]
    pub async fn waive_notice(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if !existing.is_active() || existing.status == res_status::COMPLETED {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot waive notice on a {} resignation",
                existing.status
            )));
        }
        let mut active: resignation::ActiveModel = existing.into();
        active.notice_waived = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    // ---- clearance checklist ----

    pub async fn clearance_items(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
    ) -> Result<Vec<exit_clearance_item::Model>, ServiceError> {
        self.get_guarded(ctx, resignation_id).await?;
        Ok(exit_clearance_item::Entity::find()
            .filter(exit_clearance_item::Column::ResignationId.eq(resignation_id))
            .order_by_asc(exit_clearance_item::Column::SortOrder)
            .all(&*self.db_pool)
            .await?)
    }

    /// Toggles one checklist item and refreshes the parent flag:
    /// complete iff every item is complete and at least one exists.
    #[instrument(skip(self, ctx))]
    pub async fn set_clearance_item(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
        item_id: i64,
        completed: bool,
    ) -> Result<exit_clearance_item::Model, ServiceError> {
        let res = self.get_guarded(ctx, resignation_id).await?;
        if res.status != res_status::CLEARING {
            return Err(ServiceError::InvalidOperation(format!(
                "clearance runs while the resignation is clearing; this one is {}",
                res.status
            )));
        }

        let item = exit_clearance_item::Entity::find_by_id(item_id)
            .filter(exit_clearance_item::Column::ResignationId.eq(resignation_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Clearance item {} not found", item_id))
            })?;

        let txn = self.db_pool.begin().await?;

        let mut active: exit_clearance_item::ActiveModel = item.into();
        active.is_completed = Set(completed);
        active.completed_by = Set(completed.then_some(ctx.user_id));
        active.completed_at = Set(completed.then(Utc::now));
        let saved = active.update(&txn).await?;

        let items = exit_clearance_item::Entity::find()
            .filter(exit_clearance_item::Column::ResignationId.eq(resignation_id))
            .all(&txn)
            .await?;
        let all_complete = !items.is_empty() && items.iter().all(|i| i.is_completed);

        let mut res_active: resignation::ActiveModel = res.into();
        res_active.clearance_completed = Set(all_complete);
        res_active.updated_at = Set(Some(Utc::now()));
        res_active.update(&txn).await?;

        txn.commit().await?;
        Ok(saved)
    }

    /// Deletes and re-seeds the checklist from the current templates.
    #[instrument(skip(self, ctx))]
    pub async fn regenerate_clearance(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
    ) -> Result<u64, ServiceError> {
        let res = self.get_guarded(ctx, resignation_id).await?;
        if res.status != res_status::CLEARING {
            return Err(ServiceError::InvalidOperation(format!(
                "clearance can only be regenerated while clearing; this one is {}",
                res.status
            )));
        }

        let txn = self.db_pool.begin().await?;

        exit_clearance_item::Entity::delete_many()
            .filter(exit_clearance_item::Column::ResignationId.eq(resignation_id))
            .exec(&txn)
            .await?;

        let seeded = self.seed_clearance_items(&txn, &res).await?;

        let mut active: resignation::ActiveModel = res.into();
        active.clearance_completed = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(seeded)
    }

    // ---- processing ----

    /// Leaves and schedules affected if the resignation is processed now.
    pub async fn check_leaves(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
    ) -> Result<Vec<leave_request::Model>, ServiceError> {
        let res = self.get_guarded(ctx, resignation_id).await?;
        Ok(leave_request::Entity::find()
            .filter(leave_request::Column::EmployeeId.eq(res.employee_id))
            .filter(leave_request::Column::StartDate.gt(res.last_working_day))
            .filter(
                leave_request::Column::Status.is_in([
                    leave_request::status::PENDING,
                    leave_request::status::APPROVED,
                ]),
            )
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn leave_entitlement(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
    ) -> Result<Vec<leave_balance::Model>, ServiceError> {
        let res = self.get_guarded(ctx, resignation_id).await?;
        Ok(leave_balance::Entity::find()
            .filter(leave_balance::Column::EmployeeId.eq(res.employee_id))
            .filter(leave_balance::Column::Year.eq(res.last_working_day.year()))
            .all(&*self.db_pool)
            .await?)
    }

    /// Terminal processing. Refuses without completed clearance unless
    /// overridden. Every side effect commits atomically; the status
    /// guards make a double run impossible.
    #[instrument(skip(self, ctx))]
    pub async fn process(
        &self,
        ctx: &TenantContext,
        id: i64,
        override_clearance: bool,
    ) -> Result<resignation::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != res_status::CLEARING {
            return Err(ServiceError::Conflict(format!(
                "only clearing resignations can be processed; this one is {}",
                existing.status
            )));
        }
        if !existing.clearance_completed && !override_clearance {
            return Err(ServiceError::InvalidOperation(
                "clearance checklist is incomplete; complete it or pass override_clearance".into(),
            ));
        }
        if override_clearance && !existing.clearance_completed {
            warn!(resignation_id = id, "clearance overridden by {}", ctx.user_id);
        }

        let lwd = existing.last_working_day;
        let txn = self.db_pool.begin().await?;

        // Employee exits with history preserved.
        let emp = employee::Entity::find_by_id(existing.employee_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", existing.employee_id))
            })?;
        let mut emp_active: employee::ActiveModel = emp.into();
        emp_active.status = Set(employee::status::INACTIVE.to_string());
        emp_active.employment_status = Set(employee::employment_status::EXITED.to_string());
        emp_active.resign_date = Set(Some(lwd));
        emp_active.updated_at = Set(Some(Utc::now()));
        emp_active.update(&txn).await?;

        self.cleanup_after_exit(&txn, existing.employee_id, lwd).await?;

        let mut active: resignation::ActiveModel = existing.into();
        active.status = Set(res_status::COMPLETED.to_string());
        active.settlement_date = Set(Some(Utc::now()));
        active.processed_by = Set(Some(ctx.user_id));
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        info!(resignation_id = saved.id, "resignation processed");
        Ok(saved)
    }

    /// Deletes future schedules and cancels future leaves, restoring the
    /// balance for approved paid leave.
    async fn cleanup_after_exit<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        employee_id: i64,
        last_working_day: NaiveDate,
    ) -> Result<LeaveCleanupSummary, ServiceError> {
        let schedules_deleted = schedule::Entity::delete_many()
            .filter(schedule::Column::EmployeeId.eq(employee_id))
            .filter(schedule::Column::ScheduleDate.gt(last_working_day))
            .exec(db)
            .await?
            .rows_affected;

        let mut summary = LeaveCleanupSummary {
            schedules_deleted,
            pending_cancelled: 0,
            approved_cancelled: 0,
        };

        let future_leaves = leave_request::Entity::find()
            .filter(leave_request::Column::EmployeeId.eq(employee_id))
            .filter(leave_request::Column::StartDate.gt(last_working_day))
            .filter(
                leave_request::Column::Status.is_in([
                    leave_request::status::PENDING,
                    leave_request::status::APPROVED,
                ]),
            )
            .all(db)
            .await?;

        for leave in future_leaves {
            let was_approved = leave.status == leave_request::status::APPROVED;
            let leave_type_id = leave.leave_type_id;
            let total_days = leave.total_days;
            let year = leave.start_date.year();

            let mut active: leave_request::ActiveModel = leave.into();
            active.status = Set(leave_request::status::CANCELLED.to_string());
            active.updated_at = Set(Some(Utc::now()));
            active.update(db).await?;

            if was_approved {
                // Paid leave restores the balance it consumed.
                let lt = crate::entities::leave_type::Entity::find_by_id(leave_type_id)
                    .one(db)
                    .await?;
                if lt.map(|t| t.is_paid).unwrap_or(false) {
                    if let Some(balance) = leave_balance::Entity::find()
                        .filter(leave_balance::Column::EmployeeId.eq(employee_id))
                        .filter(leave_balance::Column::LeaveTypeId.eq(leave_type_id))
                        .filter(leave_balance::Column::Year.eq(year))
                        .one(db)
                        .await?
                    {
                        let mut bal_active: leave_balance::ActiveModel = balance.clone().into();
                        bal_active.used_days = Set(balance.used_days - total_days);
                        bal_active.update(db).await?;
                    }
                }
                summary.approved_cancelled += 1;
            } else {
                summary.pending_cancelled += 1;
            }
        }

        Ok(summary)
    }

    /// Nightly lifecycle advance across all tenants: employees on notice
    /// move to resigned_pending once their last working day has passed,
    /// and their still-pending leave requests beyond it are rejected.
    #[instrument(skip(self))]
    pub async fn advance_employment_statuses(
        &self,
        today: NaiveDate,
    ) -> Result<(u64, u64), ServiceError> {
        let due = employee::Entity::find()
            .filter(
                employee::Column::EmploymentStatus.eq(employee::employment_status::NOTICE),
            )
            .filter(employee::Column::LastWorkingDay.lt(today))
            .all(&*self.db_pool)
            .await?;

        let mut advanced = 0;
        let mut leaves_rejected = 0;
        for emp in due {
            let employee_id = emp.id;
            let lwd = emp.last_working_day;
            let mut active: employee::ActiveModel = emp.into();
            active.employment_status =
                Set(employee::employment_status::RESIGNED_PENDING.to_string());
            active.updated_at = Set(Some(Utc::now()));
            if let Err(e) = active.update(&*self.db_pool).await {
                warn!(employee_id, error = %e, "lifecycle advance failed; continuing");
                continue;
            }
            advanced += 1;

            if let Some(lwd) = lwd {
                let stale = leave_request::Entity::find()
                    .filter(leave_request::Column::EmployeeId.eq(employee_id))
                    .filter(leave_request::Column::Status.eq(leave_request::status::PENDING))
                    .filter(leave_request::Column::StartDate.gt(lwd))
                    .all(&*self.db_pool)
                    .await?;
                for leave in stale {
                    let mut leave_active: leave_request::ActiveModel = leave.into();
                    leave_active.status = Set(leave_request::status::REJECTED.to_string());
                    leave_active.reject_reason =
                        Set(Some("employment ended before leave start".to_string()));
                    leave_active.updated_at = Set(Some(Utc::now()));
                    leave_active.update(&*self.db_pool).await?;
                    leaves_rejected += 1;
                }
            }
        }

        info!(advanced, leaves_rejected, "employment lifecycle advanced");
        Ok((advanced, leaves_rejected))
    }

    /// Standalone leave cleanup for a resignation already in flight.
    #[instrument(skip(self, ctx))]
    pub async fn cleanup_leaves(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<LeaveCleanupSummary, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        let txn = self.db_pool.begin().await?;
        let summary = self
            .cleanup_after_exit(&txn, existing.employee_id, existing.last_working_day)
            .await?;
        txn.commit().await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test_case(0, 28)]
    #[test_case(23, 28)]
    #[test_case(24, 42)]
    #[test_case(59, 42)]
    #[test_case(60, 56)]
    #[test_case(120, 56)]
    fn notice_requirement_by_service_length(months: i32, expected: i32) {
        assert_eq!(required_notice_days(months), expected);
    }

    #[test]
    fn months_of_service_counts_completed_months() {
        assert_eq!(months_of_service(d(2022, 1, 1), d(2025, 3, 14)), 38);
        assert_eq!(months_of_service(d(2022, 1, 15), d(2024, 1, 14)), 23);
        assert_eq!(months_of_service(d(2022, 1, 15), d(2024, 1, 15)), 24);
        assert_eq!(months_of_service(d(2025, 3, 1), d(2025, 3, 1)), 0);
    }
}
