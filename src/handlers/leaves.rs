use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::auth::TenantContext;
use crate::services::leave::CreateLeaveRequest;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct LeaveListQuery {
    pub employee_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<LeaveListQuery>,
) -> ApiResult<Vec<crate::entities::leave_request::Model>> {
    let rows = state
        .services
        .leave
        .list(&ctx, query.employee_id, query.status)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateLeaveRequest>,
) -> ApiResult<crate::entities::leave_request::Model> {
    let row = state.services.leave.create(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn approve(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::leave_request::Model> {
    let row = state.services.leave.approve(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    pub reason: Option<String>,
}

pub async fn reject(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    payload: Option<Json<RejectBody>>,
) -> ApiResult<crate::entities::leave_request::Model> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let row = state.services.leave.reject(&ctx, id, body.reason).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn cancel(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::leave_request::Model> {
    let row = state.services.leave.cancel(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn balances(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((employee_id, year)): Path<(i64, i32)>,
) -> ApiResult<Vec<crate::entities::leave_balance::Model>> {
    let rows = state.services.leave.balances(&ctx, employee_id, year).await?;
    Ok(Json(ApiResponse::success(rows)))
}
