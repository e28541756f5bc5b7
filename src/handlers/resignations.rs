use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::auth::TenantContext;
use crate::services::resignations::{CreateResignationRequest, LeaveCleanupSummary};
use crate::services::settlement::SettlementBreakdown;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ResignationListQuery {
    pub status: Option<String>,
    pub outlet_id: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<ResignationListQuery>,
) -> ApiResult<Vec<crate::entities::resignation::Model>> {
    let rows = state
        .services
        .resignations
        .list(&ctx, query.status, query.outlet_id)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn get(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateResignationRequest>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.create(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<CreateResignationRequest>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.update(&ctx, id, payload).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn approve(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.approve(&ctx, id).await?;
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
) -> ApiResult<crate::entities::resignation::Model> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let row = state
        .services
        .resignations
        .reject(&ctx, id, body.reason)
        .await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn withdraw(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.withdraw(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn cancel(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.cancel(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn waive_notice(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::resignation::Model> {
    let row = state.services.resignations.waive_notice(&ctx, id).await?;
    Ok(Json(ApiResponse::success(row)))
}

// ---- clearance ----

pub async fn clearance_items(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Vec<crate::entities::exit_clearance_item::Model>> {
    let items = state.services.resignations.clearance_items(&ctx, id).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[derive(Debug, Deserialize)]
pub struct ClearanceItemBody {
    pub is_completed: bool,
}

pub async fn set_clearance_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(payload): Json<ClearanceItemBody>,
) -> ApiResult<crate::entities::exit_clearance_item::Model> {
    let item = state
        .services
        .resignations
        .set_clearance_item(&ctx, id, item_id, payload.is_completed)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn regenerate_clearance(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let seeded = state
        .services
        .resignations
        .regenerate_clearance(&ctx, id)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "seeded": seeded
    }))))
}

// ---- settlement & processing ----

pub async fn check_leaves(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Vec<crate::entities::leave_request::Model>> {
    let leaves = state.services.resignations.check_leaves(&ctx, id).await?;
    Ok(Json(ApiResponse::success(leaves)))
}

pub async fn leave_entitlement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Vec<crate::entities::leave_balance::Model>> {
    let balances = state
        .services
        .resignations
        .leave_entitlement(&ctx, id)
        .await?;
    Ok(Json(ApiResponse::success(balances)))
}

pub async fn stored_settlement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<Option<SettlementBreakdown>> {
    let breakdown = state.services.settlement.stored(&ctx, id).await?;
    Ok(Json(ApiResponse::success(breakdown)))
}

pub async fn compute_settlement(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<SettlementBreakdown> {
    let breakdown = state
        .services
        .settlement
        .compute_and_store(&ctx, id)
        .await?;
    Ok(Json(ApiResponse::success(breakdown)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessBody {
    #[serde(default)]
    pub override_clearance: bool,
}

pub async fn process(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    payload: Option<Json<ProcessBody>>,
) -> ApiResult<crate::entities::resignation::Model> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let row = state
        .services
        .resignations
        .process(&ctx, id, body.override_clearance)
        .await?;
    Ok(Json(ApiResponse::success(row)))
}

pub async fn cleanup_leaves(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<LeaveCleanupSummary> {
    let summary = state.services.resignations.cleanup_leaves(&ctx, id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
