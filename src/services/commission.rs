//! Commission engine: converts an outlet/department monthly sales figure
//! into per-employee payouts via effective-shift accounting.
//!
//! Payout month N covers shifts worked from the 15th of month N-1 through
//! the 14th of month N inclusive. A public-holiday shift counts double.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    commission_payout, outlet, outlet_sales::{self, status as sales_status}, schedule,
    shift_template,
};
use crate::errors::ServiceError;

const DEFAULT_COMMISSION_RATE: Decimal = dec!(6.00);

#[derive(Debug, Deserialize)]
pub struct UpsertSalesRequest {
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub period_month: i32,
    pub period_year: i32,
    pub total_sales: Decimal,
    pub commission_rate: Option<Decimal>,
}

/// Per-employee shift counts for a period, before pool division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCount {
    pub employee_id: i64,
    pub normal_shifts: i32,
    pub ph_shifts: i32,
}

impl ShiftCount {
    pub fn effective(&self) -> i32 {
        self.normal_shifts + 2 * self.ph_shifts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutLine {
    pub employee_id: i64,
    pub normal_shifts: i32,
    pub ph_shifts: i32,
    pub effective_shifts: i32,
    pub commission_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSplit {
    pub total_effective_shifts: i32,
    pub per_shift_value: Decimal,
    pub lines: Vec<PayoutLine>,
}

/// The work period covered by a payout month: (Y, M-1)-15 .. (Y, M)-14.
pub fn period_range(payout_year: i32, payout_month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let invalid = || {
        ServiceError::ValidationError(format!(
            "invalid payout period {}-{}",
            payout_year, payout_month
        ))
    };
    let (start_year, start_month) = if payout_month == 1 {
        (payout_year - 1, 12)
    } else {
        (payout_year, payout_month - 1)
    };
    let start = NaiveDate::from_ymd_opt(start_year, start_month, 15).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(payout_year, payout_month, 14).ok_or_else(invalid)?;
    Ok((start, end))
}

/// Divides the pool across employees by effective shifts. Pure; the DB
/// write-back happens in [`CommissionService::calculate`].
pub fn split_pool(pool: Decimal, counts: &[ShiftCount]) -> PoolSplit {
    let total_effective_shifts: i32 = counts.iter().map(ShiftCount::effective).sum();
    let per_shift_value = if total_effective_shifts > 0 {
        (pool / Decimal::from(total_effective_shifts)).round_dp(4)
    } else {
        Decimal::ZERO
    };

    let lines = counts
        .iter()
        .filter(|c| c.effective() > 0)
        .map(|c| PayoutLine {
            employee_id: c.employee_id,
            normal_shifts: c.normal_shifts,
            ph_shifts: c.ph_shifts,
            effective_shifts: c.effective(),
            commission_amount: (per_shift_value * Decimal::from(c.effective())).round_dp(2),
        })
        .collect();

    PoolSplit {
        total_effective_shifts,
        per_shift_value,
        lines,
    }
}

#[derive(Clone)]
pub struct CommissionService {
    db_pool: Arc<DbPool>,
}

impl CommissionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn get_guarded(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<outlet_sales::Model, ServiceError> {
        outlet_sales::Entity::find_by_id(id)
            .filter(outlet_sales::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales period {} not found", id)))
    }

    pub async fn get(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<outlet_sales::Model, ServiceError> {
        self.get_guarded(ctx, id).await
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        year: Option<i32>,
        month: Option<i32>,
    ) -> Result<Vec<outlet_sales::Model>, ServiceError> {
        let mut query = outlet_sales::Entity::find()
            .filter(outlet_sales::Column::CompanyId.eq(ctx.company_id));
        if let Some(year) = year {
            query = query.filter(outlet_sales::Column::PeriodYear.eq(year));
        }
        if let Some(month) = month {
            query = query.filter(outlet_sales::Column::PeriodMonth.eq(month));
        }
        Ok(query
            .order_by_desc(outlet_sales::Column::PeriodYear)
            .order_by_desc(outlet_sales::Column::PeriodMonth)
            .all(&*self.db_pool)
            .await?)
    }

    /// Upserts the sales figure for (outlet|department, month, year).
    /// Exactly one grouping dimension must be present; a finalized row
    /// rejects further edits.
    #[instrument(skip(self, ctx, request))]
    pub async fn upsert_sales(
        &self,
        ctx: &TenantContext,
        request: UpsertSalesRequest,
    ) -> Result<outlet_sales::Model, ServiceError> {
        match (request.outlet_id, request.department_id) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(ServiceError::ValidationError(
                    "exactly one of outlet_id or department_id must be set".into(),
                ))
            }
            _ => {}
        }
        if !(1..=12).contains(&request.period_month) {
            return Err(ServiceError::ValidationError(format!(
                "invalid period month {}",
                request.period_month
            )));
        }
        if request.total_sales < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "total_sales must not be negative".into(),
            ));
        }

        let rate = request.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE);
        let pool = (request.total_sales * rate / dec!(100)).round_dp(2);

        let mut query = outlet_sales::Entity::find()
            .filter(outlet_sales::Column::CompanyId.eq(ctx.company_id))
            .filter(outlet_sales::Column::PeriodMonth.eq(request.period_month))
            .filter(outlet_sales::Column::PeriodYear.eq(request.period_year));
        if let Some(outlet_id) = request.outlet_id {
            query = query.filter(outlet_sales::Column::OutletId.eq(outlet_id));
        }
        if let Some(department_id) = request.department_id {
            query = query.filter(outlet_sales::Column::DepartmentId.eq(department_id));
        }

        match query.one(&*self.db_pool).await? {
            Some(existing) => {
                if existing.is_finalized() {
                    return Err(ServiceError::Conflict(
                        "sales period is finalized; revert it before editing".into(),
                    ));
                }
                let mut active: outlet_sales::ActiveModel = existing.into();
                active.total_sales = Set(request.total_sales);
                active.commission_rate = Set(rate);
                active.commission_pool = Set(pool);
                active.updated_at = Set(Some(Utc::now()));
                Ok(active.update(&*self.db_pool).await?)
            }
            None => Ok(outlet_sales::ActiveModel {
                company_id: Set(ctx.company_id),
                outlet_id: Set(request.outlet_id),
                department_id: Set(request.department_id),
                period_month: Set(request.period_month),
                period_year: Set(request.period_year),
                total_sales: Set(request.total_sales),
                commission_rate: Set(rate),
                commission_pool: Set(pool),
                total_effective_shifts: Set(0),
                per_shift_value: Set(Decimal::ZERO),
                status: Set(sales_status::DRAFT.to_string()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&*self.db_pool)
            .await?),
        }
    }

    /// Counts qualifying shifts per employee in the sales period, on the
    /// row's grouping dimension. Off-template and non-scheduled rows do
    /// not count.
    async fn shift_counts<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        sales: &outlet_sales::Model,
    ) -> Result<Vec<ShiftCount>, ServiceError> {
        let (start, end) = period_range(sales.period_year, sales.period_month as u32)?;

        let mut query = schedule::Entity::find()
            .filter(schedule::Column::CompanyId.eq(sales.company_id))
            .filter(schedule::Column::ScheduleDate.gte(start))
            .filter(schedule::Column::ScheduleDate.lte(end))
            .filter(schedule::Column::Status.eq(schedule::status::SCHEDULED));
        if let Some(outlet_id) = sales.outlet_id {
            query = query.filter(schedule::Column::OutletId.eq(outlet_id));
        }
        if let Some(department_id) = sales.department_id {
            query = query.filter(schedule::Column::DepartmentId.eq(department_id));
        }
        let schedules = query.all(db).await?;

        let off_templates: std::collections::HashSet<i64> = shift_template::Entity::find()
            .filter(shift_template::Column::CompanyId.eq(sales.company_id))
            .filter(shift_template::Column::IsOff.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        let mut counts: BTreeMap<i64, (i32, i32)> = BTreeMap::new();
        for sched in schedules {
            if sched
                .shift_template_id
                .is_some_and(|tid| off_templates.contains(&tid))
            {
                continue;
            }
            let entry = counts.entry(sched.employee_id).or_default();
            if sched.is_public_holiday {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|(employee_id, (normal, ph))| ShiftCount {
                employee_id,
                normal_shifts: normal,
                ph_shifts: ph,
            })
            .collect())
    }

    /// Recomputes totals and rewrites every payout row for the period in
    /// one transaction. Safe to repeat: payouts are wiped first.
    #[instrument(skip(self, ctx))]
    pub async fn calculate(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<outlet_sales::Model, ServiceError> {
        let sales = self.get_guarded(ctx, id).await?;
        if sales.is_finalized() {
            return Err(ServiceError::Conflict(
                "sales period is finalized; revert it before recalculating".into(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let counts = self.shift_counts(&txn, &sales).await?;
        let split = split_pool(sales.commission_pool, &counts);

        commission_payout::Entity::delete_many()
            .filter(commission_payout::Column::OutletSalesId.eq(sales.id))
            .exec(&txn)
            .await?;

        for line in &split.lines {
            commission_payout::ActiveModel {
                outlet_sales_id: Set(sales.id),
                employee_id: Set(line.employee_id),
                normal_shifts: Set(line.normal_shifts),
                ph_shifts: Set(line.ph_shifts),
                effective_shifts: Set(line.effective_shifts),
                commission_amount: Set(line.commission_amount),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let mut active: outlet_sales::ActiveModel = sales.into();
        active.total_effective_shifts = Set(split.total_effective_shifts);
        active.per_shift_value = Set(split.per_shift_value);
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;
        info!(
            sales_id = saved.id,
            total_effective = split.total_effective_shifts,
            payouts = split.lines.len(),
            "commission calculated"
        );
        Ok(saved)
    }

    #[instrument(skip(self, ctx))]
    pub async fn finalize(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<outlet_sales::Model, ServiceError> {
        let sales = self.get_guarded(ctx, id).await?;
        if sales.is_finalized() {
            return Err(ServiceError::Conflict("sales period is already finalized".into()));
        }
        let payouts = self.payouts(ctx, id).await?;
        if payouts.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "calculate payouts before finalizing".into(),
            ));
        }

        let mut active: outlet_sales::ActiveModel = sales.into();
        active.status = Set(sales_status::FINALIZED.to_string());
        active.finalized_by = Set(Some(ctx.user_id));
        active.finalized_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn revert(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<outlet_sales::Model, ServiceError> {
        let sales = self.get_guarded(ctx, id).await?;
        if !sales.is_finalized() {
            return Err(ServiceError::InvalidOperation(
                "only finalized sales periods can be reverted".into(),
            ));
        }
        let mut active: outlet_sales::ActiveModel = sales.into();
        active.status = Set(sales_status::DRAFT.to_string());
        active.finalized_by = Set(None);
        active.finalized_at = Set(None);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Deletion cascades payouts; finalized rows refuse.
    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &TenantContext, id: i64) -> Result<(), ServiceError> {
        let sales = self.get_guarded(ctx, id).await?;
        if sales.is_finalized() {
            return Err(ServiceError::Conflict(
                "finalized sales periods cannot be deleted".into(),
            ));
        }
        let txn = self.db_pool.begin().await?;
        commission_payout::Entity::delete_many()
            .filter(commission_payout::Column::OutletSalesId.eq(id))
            .exec(&txn)
            .await?;
        outlet_sales::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn payouts(
        &self,
        ctx: &TenantContext,
        sales_id: i64,
    ) -> Result<Vec<commission_payout::Model>, ServiceError> {
        self.get_guarded(ctx, sales_id).await?;
        Ok(commission_payout::Entity::find()
            .filter(commission_payout::Column::OutletSalesId.eq(sales_id))
            .order_by_asc(commission_payout::Column::EmployeeId)
            .all(&*self.db_pool)
            .await?)
    }

    /// Payout history for one employee across a payout year.
    pub async fn employee_payouts(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
        year: i32,
    ) -> Result<Vec<(outlet_sales::Model, commission_payout::Model)>, ServiceError> {
        let sales_rows = outlet_sales::Entity::find()
            .filter(outlet_sales::Column::CompanyId.eq(ctx.company_id))
            .filter(outlet_sales::Column::PeriodYear.eq(year))
            .all(&*self.db_pool)
            .await?;
        let sales_ids: Vec<i64> = sales_rows.iter().map(|s| s.id).collect();
        let by_id: BTreeMap<i64, outlet_sales::Model> =
            sales_rows.into_iter().map(|s| (s.id, s)).collect();

        let payouts = commission_payout::Entity::find()
            .filter(commission_payout::Column::OutletSalesId.is_in(sales_ids))
            .filter(commission_payout::Column::EmployeeId.eq(employee_id))
            .all(&*self.db_pool)
            .await?;

        Ok(payouts
            .into_iter()
            .filter_map(|p| by_id.get(&p.outlet_sales_id).cloned().map(|s| (s, p)))
            .collect())
    }

    pub async fn outlets(&self, ctx: &TenantContext) -> Result<Vec<outlet::Model>, ServiceError> {
        Ok(outlet::Entity::find()
            .filter(outlet::Column::CompanyId.eq(ctx.company_id))
            .filter(outlet::Column::IsActive.eq(true))
            .order_by_asc(outlet::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_spans_fifteenth_to_fourteenth() {
        let (start, end) = period_range(2025, 2).unwrap();
        assert_eq!(start, d(2025, 1, 15));
        assert_eq!(end, d(2025, 2, 14));
    }

    #[test]
    fn january_rolls_back_to_december() {
        let (start, end) = period_range(2025, 1).unwrap();
        assert_eq!(start, d(2024, 12, 15));
        assert_eq!(end, d(2025, 1, 14));
    }

    #[test]
    fn pool_split_matches_worked_example() {
        // RM120,000 at 6% -> pool 7,200. A: 20 normal + 1 PH, B: 22 normal.
        let pool = dec!(7200);
        let counts = [
            ShiftCount { employee_id: 1, normal_shifts: 20, ph_shifts: 1 },
            ShiftCount { employee_id: 2, normal_shifts: 22, ph_shifts: 0 },
        ];
        let split = split_pool(pool, &counts);
        assert_eq!(split.total_effective_shifts, 44);
        assert_eq!(split.per_shift_value, dec!(163.6364));
        assert_eq!(split.lines.len(), 2);
        assert_eq!(split.lines[0].effective_shifts, 22);
        assert_eq!(split.lines[0].commission_amount, dec!(3600.00));
        assert_eq!(split.lines[1].commission_amount, dec!(3600.00));

        let total: Decimal = split.lines.iter().map(|l| l.commission_amount).sum();
        assert_eq!(total, dec!(7200.00));
    }

    #[test]
    fn public_holiday_shifts_count_double() {
        let count = ShiftCount {
            employee_id: 9,
            normal_shifts: 10,
            ph_shifts: 3,
        };
        assert_eq!(count.effective(), 16);
    }

    #[test]
    fn conservation_holds_within_rounding_slack() {
        let pool = dec!(1000);
        let counts: Vec<ShiftCount> = (1..=7)
            .map(|i| ShiftCount {
                employee_id: i,
                normal_shifts: i as i32,
                ph_shifts: (i % 2) as i32,
            })
            .collect();
        let split = split_pool(pool, &counts);
        let paid: Decimal = split.lines.iter().map(|l| l.commission_amount).sum();
        let slack = Decimal::new(split.lines.len() as i64, 2); // 1 cent per payout
        assert!((pool - paid).abs() <= slack, "paid {} vs pool {}", paid, pool);

        for line in &split.lines {
            let exact = split.per_shift_value * Decimal::from(line.effective_shifts);
            assert!((line.commission_amount - exact).abs() <= dec!(0.005));
        }
    }

    #[test]
    fn empty_period_produces_no_payouts() {
        let split = split_pool(dec!(5000), &[]);
        assert_eq!(split.total_effective_shifts, 0);
        assert_eq!(split.per_shift_value, Decimal::ZERO);
        assert!(split.lines.is_empty());
    }
}
