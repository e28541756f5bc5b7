use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::TenantContext;
use crate::services::salary_advances::CreateAdvanceRequest;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct AdvanceListQuery {
    pub employee_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<AdvanceListQuery>,
) -> ApiResult<Vec<crate::entities::salary_advance::Model>> {
    let rows = state
        .services
        .salary_advances
        .list(&ctx, query.employee_id, query.status)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateAdvanceRequest>,
) -> ApiResult<crate::entities::salary_advance::Model> {
    let row = state.services.salary_advances.create(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn activate(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::salary_advance::Model> {
    let row = state.services.salary_advances.activate(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn cancel(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::salary_advance::Model> {
    let row = state.services.salary_advances.cancel(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

#[derive(Debug, Deserialize)]
pub struct DeductBody {
    pub payroll_month: i32,
    pub payroll_year: i32,
    pub amount: Option<Decimal>,
}

pub async fn deduct(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<DeductBody>,
) -> ApiResult<crate::entities::salary_advance::Model> {
    let row = state
        .services
        .salary_advances
        .deduct(
            &ctx,
            id,
            payload.payroll_month,
            payload.payroll_year,
            payload.amount,
        )
        .await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn deductions(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Vec<crate::entities::salary_advance_deduction::Model>> {
    let rows = state.services.salary_advances.deductions(&ctx, id).await?;
    Ok(Json(ApiResponse::success(rows)))
}
