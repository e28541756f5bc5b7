use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::TenantContext;
use crate::services::commission::UpsertSalesRequest;
use crate::{ApiResponse, ApiResult, AppState};

use super::common::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct SalesListQuery {
    pub year: Option<i32>,
    pub month: Option<i32>,
}

pub async fn list_sales(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<SalesListQuery>,
) -> ApiResult<Vec<crate::entities::outlet_sales::Model>> {
    let sales = state
        .services
        .commission
        .list(&ctx, query.year, query.month)
        .await?;
    Ok(Json(ApiResponse::success(sales)))
}

#[derive(Debug, Serialize)]
pub struct SalesDetail {
    #[serde(flatten)]
    pub sales: crate::entities::outlet_sales::Model,
    pub payouts: Vec<crate::entities::commission_payout::Model>,
}

pub async fn get_sales(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<SalesDetail> {
    let sales = state.services.commission.get(&ctx, id).await?;
    let payouts = state.services.commission.payouts(&ctx, id).await?;
    Ok(Json(ApiResponse::success(SalesDetail { sales, payouts })))
}

pub async fn upsert_sales(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<UpsertSalesRequest>,
) -> ApiResult<crate::entities::outlet_sales::Model> {
    let sales = state.services.commission.upsert_sales(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(sales)))
}

pub async fn calculate(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<SalesDetail> {
    let sales = state.services.commission.calculate(&ctx, id).await?;
    let payouts = state.services.commission.payouts(&ctx, id).await?;
    Ok(Json(ApiResponse::success(SalesDetail { sales, payouts })))
}

pub async fn finalize(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::outlet_sales::Model> {
    let sales = state.services.commission.finalize(&ctx, id).await?;
    Ok(Json(ApiResponse::success(sales)))
}

pub async fn revert(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::outlet_sales::Model> {
    let sales = state.services.commission.revert(&ctx, id).await?;
    Ok(Json(ApiResponse::success(sales)))
}

pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<MessageResponse> {
    state.services.commission.delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "sales period deleted",
    ))))
}

#[derive(Debug, Deserialize)]
pub struct EmployeePayoutQuery {
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct EmployeePayoutLine {
    pub period_month: i32,
    pub period_year: i32,
    pub sales_status: String,
    pub payout: crate::entities::commission_payout::Model,
}

pub async fn employee_payouts(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(employee_id): Path<i64>,
    Query(query): Query<EmployeePayoutQuery>,
) -> ApiResult<Vec<EmployeePayoutLine>> {
    let rows = state
        .services
        .commission
        .employee_payouts(&ctx, employee_id, query.year)
        .await?;
    let lines = rows
        .into_iter()
        .map(|(sales, payout)| EmployeePayoutLine {
            period_month: sales.period_month,
            period_year: sales.period_year,
            sales_status: sales.status,
            payout,
        })
        .collect();
    Ok(Json(ApiResponse::success(lines)))
}

pub async fn outlets(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Vec<crate::entities::outlet::Model>> {
    let outlets = state.services.commission.outlets(&ctx).await?;
    Ok(Json(ApiResponse::success(outlets)))
}
