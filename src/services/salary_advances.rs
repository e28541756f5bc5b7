//! Salary advances: an employee-owed balance deducted from payroll in
//! full or by installments. `amount = total_deducted + remaining_balance`
//! holds at all times; the deduct path locks the row to keep it that way.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    employee,
    salary_advance::{self, deduction_method, status as advance_status},
    salary_advance_deduction,
};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateAdvanceRequest {
    pub employee_id: i64,
    pub amount: Decimal,
    pub deduction_method: String,
    pub installment_amount: Option<Decimal>,
    pub expected_deduction_month: Option<i32>,
    pub expected_deduction_year: Option<i32>,
}

#[derive(Clone)]
pub struct SalaryAdvanceService {
    db_pool: Arc<DbPool>,
}

impl SalaryAdvanceService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn get_guarded(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<salary_advance::Model, ServiceError> {
        salary_advance::Entity::find_by_id(id)
            .filter(salary_advance::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Salary advance {} not found", id)))
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        employee_id: Option<i64>,
        status: Option<String>,
    ) -> Result<Vec<salary_advance::Model>, ServiceError> {
        let mut query = salary_advance::Entity::find()
            .filter(salary_advance::Column::CompanyId.eq(ctx.company_id));
        if let Some(employee_id) = employee_id {
            query = query.filter(salary_advance::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = status {
            query = query.filter(salary_advance::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(salary_advance::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id))]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        request: CreateAdvanceRequest,
    ) -> Result<salary_advance::Model, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "advance amount must be positive".into(),
            ));
        }
        match request.deduction_method.as_str() {
            deduction_method::FULL => {}
            deduction_method::INSTALLMENT => {
                let Some(installment) = request.installment_amount else {
                    return Err(ServiceError::ValidationError(
                        "installment_amount is required for installment advances".into(),
                    ));
                };
                if installment <= Decimal::ZERO || installment > request.amount {
                    return Err(ServiceError::ValidationError(
                        "installment_amount must be positive and at most the advance amount"
                            .into(),
                    ));
                }
            }
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "unknown deduction method '{}'",
                    other
                )))
            }
        }

        employee::Entity::find_by_id(request.employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_id))
            })?;

        Ok(salary_advance::ActiveModel {
            company_id: Set(ctx.company_id),
            employee_id: Set(request.employee_id),
            amount: Set(request.amount),
            deduction_method: Set(request.deduction_method),
            installment_amount: Set(request.installment_amount),
            total_deducted: Set(Decimal::ZERO),
            remaining_balance: Set(request.amount),
            status: Set(advance_status::PENDING.to_string()),
            expected_deduction_month: Set(request.expected_deduction_month),
            expected_deduction_year: Set(request.expected_deduction_year),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn activate(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<salary_advance::Model, ServiceError> {
        let advance = self.get_guarded(ctx, id).await?;
        if advance.status != advance_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "advance is already {}",
                advance.status
            )));
        }
        let mut active: salary_advance::ActiveModel = advance.into();
        active.status = Set(advance_status::ACTIVE.to_string());
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<salary_advance::Model, ServiceError> {
        let advance = self.get_guarded(ctx, id).await?;
        if advance.status == advance_status::COMPLETED
            || advance.status == advance_status::CANCELLED
        {
            return Err(ServiceError::Conflict(format!(
                "advance is already {}",
                advance.status
            )));
        }
        if advance.total_deducted > Decimal::ZERO {
            return Err(ServiceError::InvalidOperation(
                "advances with recorded deductions cannot be cancelled".into(),
            ));
        }
        let mut active: salary_advance::ActiveModel = advance.into();
        active.status = Set(advance_status::CANCELLED.to_string());
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// One payroll deduction against the advance. The row is locked for
    /// the duration of the transaction so concurrent payroll runs cannot
    /// double-deduct.
    #[instrument(skip(self, ctx))]
    pub async fn deduct(
        &self,
        ctx: &TenantContext,
        id: i64,
        payroll_month: i32,
        payroll_year: i32,
        amount: Option<Decimal>,
    ) -> Result<salary_advance::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let advance = salary_advance::Entity::find_by_id(id)
            .filter(salary_advance::Column::CompanyId.eq(ctx.company_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Salary advance {} not found", id)))?;

        if advance.status != advance_status::ACTIVE {
            return Err(ServiceError::InvalidOperation(format!(
                "only active advances can be deducted; this one is {}",
                advance.status
            )));
        }

        let step = match advance.deduction_method.as_str() {
            deduction_method::FULL => advance.remaining_balance,
            _ => advance
                .installment_amount
                .unwrap_or(advance.remaining_balance),
        };
        let amount = amount.unwrap_or(step).min(advance.remaining_balance);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidOperation(
                "nothing left to deduct on this advance".into(),
            ));
        }

        salary_advance_deduction::ActiveModel {
            advance_id: Set(advance.id),
            amount: Set(amount),
            payroll_month: Set(payroll_month),
            payroll_year: Set(payroll_year),
            deducted_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let total_deducted = advance.total_deducted + amount;
        let remaining = advance.remaining_balance - amount;

        let mut active: salary_advance::ActiveModel = advance.into();
        active.total_deducted = Set(total_deducted);
        active.remaining_balance = Set(remaining);
        if remaining <= Decimal::ZERO {
            active.status = Set(advance_status::COMPLETED.to_string());
        }
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        info!(
            advance_id = saved.id,
            deducted = %amount,
            remaining = %saved.remaining_balance,
            "advance deduction recorded"
        );
        Ok(saved)
    }

    pub async fn deductions(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<Vec<salary_advance_deduction::Model>, ServiceError> {
        self.get_guarded(ctx, id).await?;
        Ok(salary_advance_deduction::Entity::find()
            .filter(salary_advance_deduction::Column::AdvanceId.eq(id))
            .order_by_asc(salary_advance_deduction::Column::DeductedAt)
            .all(&*self.db_pool)
            .await?)
    }
}
