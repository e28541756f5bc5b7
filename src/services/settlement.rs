//! Final settlement for a resignation: working-days prorated salary,
//! leave encashment, pending-claims sweep, optional prorated bonus,
//! notice buy-out and statutory deductions.
//!
//! Proration is on weekdays (Mon-Fri), never calendar days; the calendar
//! basis historically overpaid and is forbidden.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    claim::{self, status as claim_status},
    company, employee, leave_balance, leave_type, payroll_item, payroll_run, resignation,
};
use crate::errors::ServiceError;
use crate::services::statutory::{self, StatutoryDeductions, StatutoryInput};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementBreakdown {
    pub prorated_salary: Decimal,
    pub weekdays_in_month: i64,
    pub weekdays_worked: i64,
    pub leave_encashment: Decimal,
    pub encashed_days: Decimal,
    pub pending_claims: Decimal,
    pub pending_claim_ids: Vec<i64>,
    pub prorated_bonus: Decimal,
    pub notice_shortfall_days: i32,
    pub notice_buyout: Decimal,
    pub notice_waived: bool,
    pub statutory: StatutoryDeductions,
    pub gross: Decimal,
    pub total_deductions: Decimal,
    pub net: Decimal,
}

/// Weekdays (Mon-Fri) in the calendar month containing `date`. Public
/// holidays are not excluded for proration purposes.
pub fn weekdays_in_month(year: i32, month: u32) -> Result<i64, ServiceError> {
    let (start, end) = crate::services::attendance::month_bounds(year, month)?;
    Ok(weekdays_between(start, end))
}

/// Weekdays in the inclusive date range.
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        day += chrono::Duration::days(1);
    }
    count
}

/// round(basic x weekdays_worked / weekdays_in_month, 2)
pub fn prorate_working_days(
    basic: Decimal,
    weekdays_worked: i64,
    weekdays_in_month: i64,
) -> Decimal {
    if weekdays_in_month <= 0 {
        return Decimal::ZERO;
    }
    (basic * Decimal::from(weekdays_worked) / Decimal::from(weekdays_in_month)).round_dp(2)
}

#[derive(Clone)]
pub struct SettlementService {
    db_pool: Arc<DbPool>,
}

impl SettlementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Computes the full settlement for a resignation and persists the
    /// breakdown and net onto the row.
    #[instrument(skip(self, ctx))]
    pub async fn compute_and_store(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
    ) -> Result<SettlementBreakdown, ServiceError> {
        let res = resignation::Entity::find_by_id(resignation_id)
            .filter(resignation::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Resignation {} not found", resignation_id))
            })?;

        let breakdown = self.compute(ctx, &res).await?;

        let blob = serde_json::to_value(&breakdown)
            .map_err(|e| ServiceError::InternalError(format!("breakdown serialise: {}", e)))?;
        let mut active: resignation::ActiveModel = res.into();
        active.settlement_breakdown = Set(Some(blob));
        active.settlement_net = Set(Some(breakdown.net));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db_pool).await?;

        info!(resignation_id, net = %breakdown.net, "settlement computed");
        Ok(breakdown)
    }

    pub async fn stored(
        &self,
        ctx: &TenantContext,
        resignation_id: i64,
    ) -> Result<Option<SettlementBreakdown>, ServiceError> {
        let res = resignation::Entity::find_by_id(resignation_id)
            .filter(resignation::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Resignation {} not found", resignation_id))
            })?;
        Ok(res
            .settlement_breakdown
            .and_then(|blob| serde_json::from_value(blob).ok()))
    }

    async fn compute(
        &self,
        ctx: &TenantContext,
        res: &resignation::Model,
    ) -> Result<SettlementBreakdown, ServiceError> {
        let emp = employee::Entity::find_by_id(res.employee_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", res.employee_id))
            })?;
        let settings = company::Entity::find_by_id(ctx.company_id)
            .one(&*self.db_pool)
            .await?
            .map(|c| c.settings())
            .unwrap_or_default();

        let lwd = res.last_working_day;
        let basic = emp.default_basic_salary;

        // 1. Prorated salary on working days, skipped entirely when the
        //    final month's payroll is already finalized.
        let wd_in_month = weekdays_in_month(lwd.year(), lwd.month())?;
        let month_start = NaiveDate::from_ymd_opt(lwd.year(), lwd.month(), 1).ok_or_else(|| {
            ServiceError::InternalError("last working day has no month start".into())
        })?;
        let wd_worked = weekdays_between(month_start, lwd);

        let payroll_finalized = self
            .final_month_payroll_exists(ctx, emp.id, lwd.year(), lwd.month() as i32)
            .await?;
        let prorated_salary = if payroll_finalized {
            Decimal::ZERO
        } else {
            prorate_working_days(basic, wd_worked, wd_in_month)
        };

        // 2. Leave encashment over paid types for the exit year.
        let daily_rate = (basic / Decimal::from(settings.settlement_working_days_per_month))
            .round_dp(4);
        let paid_types: std::collections::HashSet<i64> = leave_type::Entity::find()
            .filter(leave_type::Column::CompanyId.eq(ctx.company_id))
            .filter(leave_type::Column::IsPaid.eq(true))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let balances = leave_balance::Entity::find()
            .filter(leave_balance::Column::EmployeeId.eq(emp.id))
            .filter(leave_balance::Column::Year.eq(lwd.year()))
            .all(&*self.db_pool)
            .await?;
        let mut encashed_days = Decimal::ZERO;
        for balance in balances {
            if !paid_types.contains(&balance.leave_type_id) {
                continue;
            }
            let remaining = balance.remaining();
            if remaining > Decimal::ZERO {
                encashed_days += remaining;
            }
        }
        let leave_encashment =
            (encashed_days * daily_rate * settings.settlement_leave_encashment_rate).round_dp(2);

        // 3. Approved claims not yet swept into payroll.
        let open_claims = claim::Entity::find()
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .filter(claim::Column::EmployeeId.eq(emp.id))
            .filter(claim::Column::Status.eq(claim_status::APPROVED))
            .filter(claim::Column::LinkedPayrollItemId.is_null())
            .all(&*self.db_pool)
            .await?;
        let pending_claims: Decimal = open_claims.iter().map(|c| c.amount).sum();
        let pending_claim_ids: Vec<i64> = open_claims.iter().map(|c| c.id).collect();

        // 4. Prorated bonus, only when the tenant opted in.
        let prorated_bonus = if settings.settlement_include_prorated_bonus {
            (emp.default_bonus * Decimal::from(lwd.month()) / dec!(12)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        // 5. Notice buy-out on the shortfall, unless waived.
        let shortfall = (res.required_notice_days - res.actual_notice_days).max(0);
        let notice_buyout = if res.notice_waived || shortfall == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(shortfall) * daily_rate).round_dp(2)
        };

        // 6. Statutory deductions on the salary-like components.
        let statutory = statutory::compute(&StatutoryInput {
            basic: prorated_salary,
            commission: Decimal::ZERO,
            bonus: prorated_bonus,
            marital_status: emp.marital_status.clone(),
            spouse_working: emp.spouse_working,
            children_count: emp.children_count,
            age: emp.age_from_ic(lwd),
        });

        let gross = prorated_salary + leave_encashment + pending_claims + prorated_bonus;
        let total_deductions = statutory.total() + notice_buyout;
        let net = (gross - total_deductions).round_dp(2);

        Ok(SettlementBreakdown {
            prorated_salary,
            weekdays_in_month: wd_in_month,
            weekdays_worked: wd_worked,
            leave_encashment,
            encashed_days,
            pending_claims,
            pending_claim_ids,
            prorated_bonus,
            notice_shortfall_days: shortfall,
            notice_buyout,
            notice_waived: res.notice_waived,
            statutory,
            gross,
            total_deductions,
            net,
        })
    }

    async fn final_month_payroll_exists(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        year: i32,
        month: i32,
    ) -> Result<bool, ServiceError> {
        let Some(run) = payroll_run::Entity::find()
            .filter(payroll_run::Column::CompanyId.eq(ctx.company_id))
            .filter(payroll_run::Column::Year.eq(year))
            .filter(payroll_run::Column::Month.eq(month))
            .filter(payroll_run::Column::Status.eq(payroll_run::status::FINALIZED))
            .one(&*self.db_pool)
            .await?
        else {
            return Ok(false);
        };

        Ok(payroll_item::Entity::find()
            .filter(payroll_item::Column::PayrollRunId.eq(run.id))
            .filter(payroll_item::Column::EmployeeId.eq(employee_id))
            .one(&*self.db_pool)
            .await?
            .is_some())
    }
}
