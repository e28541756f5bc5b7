//! Leave requests and balances. Approval consumes balance for paid
//! types; cancellation of approved paid leave restores it. Balance and
//! request move together in one transaction.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    employee, leave_balance, leave_request::{self, status as leave_status}, leave_type,
};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateLeaveRequest {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: Option<Decimal>,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct LeaveService {
    db_pool: Arc<DbPool>,
}

impl LeaveService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn get_guarded(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<leave_request::Model, ServiceError> {
        leave_request::Entity::find_by_id(id)
            .filter(leave_request::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Leave request {} not found", id)))
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        employee_id: Option<i64>,
        status: Option<String>,
    ) -> Result<Vec<leave_request::Model>, ServiceError> {
        let mut query = leave_request::Entity::find()
            .filter(leave_request::Column::CompanyId.eq(ctx.company_id));
        if let Some(employee_id) = employee_id {
            query = query.filter(leave_request::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = status {
            query = query.filter(leave_request::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(leave_request::Column::StartDate)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id))]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        request: CreateLeaveRequest,
    ) -> Result<leave_request::Model, ServiceError> {
        if request.end_date < request.start_date {
            return Err(ServiceError::ValidationError(
                "end_date must not precede start_date".into(),
            ));
        }
        employee::Entity::find_by_id(request.employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_id))
            })?;
        leave_type::Entity::find_by_id(request.leave_type_id)
            .filter(leave_type::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Leave type {} not found", request.leave_type_id))
            })?;

        let total_days = request.total_days.unwrap_or_else(|| {
            Decimal::from((request.end_date - request.start_date).num_days() + 1)
        });

        Ok(leave_request::ActiveModel {
            company_id: Set(ctx.company_id),
            employee_id: Set(request.employee_id),
            leave_type_id: Set(request.leave_type_id),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            total_days: Set(total_days),
            reason: Set(request.reason),
            status: Set(leave_status::PENDING.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?)
    }

    /// Approves the request, consuming balance when the type is paid.
    #[instrument(skip(self, ctx))]
    pub async fn approve(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<leave_request::Model, ServiceError> {
        let request = self.get_guarded(ctx, id).await?;
        if request.status != leave_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "leave request is already {}",
                request.status
            )));
        }

        let lt = leave_type::Entity::find_by_id(request.leave_type_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Leave type {} not found", request.leave_type_id))
            })?;

        let txn = self.db_pool.begin().await?;

        if lt.is_paid {
            let year = request.start_date.year();
            let balance = leave_balance::Entity::find()
                .filter(leave_balance::Column::EmployeeId.eq(request.employee_id))
                .filter(leave_balance::Column::LeaveTypeId.eq(request.leave_type_id))
                .filter(leave_balance::Column::Year.eq(year))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidOperation(format!(
                        "no {} balance for {}; seed the year before approving",
                        lt.name, year
                    ))
                })?;

            if balance.remaining() < request.total_days {
                return Err(ServiceError::InvalidOperation(format!(
                    "insufficient balance: {} day(s) remaining, {} requested",
                    balance.remaining(),
                    request.total_days
                )));
            }

            let mut bal_active: leave_balance::ActiveModel = balance.clone().into();
            bal_active.used_days = Set(balance.used_days + request.total_days);
            bal_active.update(&txn).await?;
        }

        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(leave_status::APPROVED.to_string());
        active.approved_by = Set(Some(ctx.user_id));
        active.approved_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        info!(leave_request_id = saved.id, "leave approved");
        Ok(saved)
    }

    #[instrument(skip(self, ctx))]
    pub async fn reject(
        &self,
        ctx: &TenantContext,
        id: i64,
        reason: Option<String>,
    ) -> Result<leave_request::Model, ServiceError> {
        let request = self.get_guarded(ctx, id).await?;
        if request.status != leave_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "leave request is already {}",
                request.status
            )));
        }
        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(leave_status::REJECTED.to_string());
        active.reject_reason = Set(reason);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Cancels a pending or approved request; approved paid leave puts
    /// its days back on the balance.
    #[instrument(skip(self, ctx))]
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<leave_request::Model, ServiceError> {
        let request = self.get_guarded(ctx, id).await?;
        if request.status != leave_status::PENDING && request.status != leave_status::APPROVED {
            return Err(ServiceError::Conflict(format!(
                "cannot cancel a {} leave request",
                request.status
            )));
        }

        let was_approved = request.status == leave_status::APPROVED;
        let lt = leave_type::Entity::find_by_id(request.leave_type_id)
            .one(&*self.db_pool)
            .await?;

        let txn = self.db_pool.begin().await?;

        if was_approved && lt.map(|t| t.is_paid).unwrap_or(false) {
            let year = request.start_date.year();
            if let Some(balance) = leave_balance::Entity::find()
                .filter(leave_balance::Column::EmployeeId.eq(request.employee_id))
                .filter(leave_balance::Column::LeaveTypeId.eq(request.leave_type_id))
                .filter(leave_balance::Column::Year.eq(year))
                .one(&txn)
                .await?
            {
                let mut bal_active: leave_balance::ActiveModel = balance.clone().into();
                bal_active.used_days = Set(balance.used_days - request.total_days);
                bal_active.update(&txn).await?;
            }
        }

        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(leave_status::CANCELLED.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        Ok(saved)
    }

    pub async fn balances(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        year: i32,
    ) -> Result<Vec<leave_balance::Model>, ServiceError> {
        Ok(leave_balance::Entity::find()
            .filter(leave_balance::Column::CompanyId.eq(ctx.company_id))
            .filter(leave_balance::Column::EmployeeId.eq(employee_id))
            .filter(leave_balance::Column::Year.eq(year))
            .all(&*self.db_pool)
            .await?)
    }
}
