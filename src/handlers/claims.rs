use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::TenantContext;
use crate::entities::claim::CATEGORIES;
use crate::services::claims::{ClaimsSummary, CreateClaimRequest, UpdateClaimRequest};
use crate::{ApiResponse, ApiResult, AppState};

use super::common::BulkOutcome;

#[derive(Debug, Deserialize)]
pub struct ClaimListQuery {
    pub employee_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<ClaimListQuery>,
) -> ApiResult<Vec<crate::entities::claim::Model>> {
    let claims = state
        .services
        .claims
        .list(&ctx, query.employee_id, query.status)
        .await?;
    Ok(Json(ApiResponse::success(claims)))
}

pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateClaimRequest>,
) -> ApiResult<crate::entities::claim::Model> {
    let claim = state.services.claims.create(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(claim)))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClaimRequest>,
) -> ApiResult<crate::entities::claim::Model> {
    let claim = state.services.claims.update(&ctx, id, payload).await?;
    Ok(Json(ApiResponse::success(claim)))
}

pub async fn approve(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::claim::Model> {
    let claim = state.services.claims.approve(&ctx, id).await?;
    Ok(Json(ApiResponse::success(claim)))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

pub async fn reject(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<RejectBody>,
) -> ApiResult<crate::entities::claim::Model> {
    let claim = state.services.claims.reject(&ctx, id, payload.reason).await?;
    Ok(Json(ApiResponse::success(claim)))
}

pub async fn revert(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::claim::Model> {
    let claim = state.services.claims.revert(&ctx, id).await?;
    Ok(Json(ApiResponse::success(claim)))
}

#[derive(Debug, Deserialize)]
pub struct BulkApproveBody {
    pub ids: Vec<i64>,
}

pub async fn bulk_approve(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<BulkApproveBody>,
) -> ApiResult<BulkOutcome> {
    let (processed, errors) = state.services.claims.bulk_approve(&ctx, payload.ids).await?;
    Ok(Json(ApiResponse::success(BulkOutcome { processed, errors })))
}

pub async fn pending_count(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<serde_json::Value> {
    let count = state.services.claims.pending_count(&ctx).await?;
    Ok(Json(ApiResponse::success(json!({ "pending": count }))))
}

pub async fn summary(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<ClaimsSummary> {
    let summary = state.services.claims.summary(&ctx).await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[derive(Debug, Deserialize)]
pub struct ForPayrollQuery {
    pub employee_id: Option<i64>,
}

pub async fn for_payroll(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<ForPayrollQuery>,
) -> ApiResult<Vec<crate::entities::claim::Model>> {
    let claims = state
        .services
        .claims
        .for_payroll(&ctx, query.employee_id)
        .await?;
    Ok(Json(ApiResponse::success(claims)))
}

#[derive(Debug, Deserialize)]
pub struct LinkToPayrollBody {
    pub claim_ids: Vec<i64>,
    pub payroll_item_id: i64,
}

pub async fn link_to_payroll(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<LinkToPayrollBody>,
) -> ApiResult<serde_json::Value> {
    let linked = state
        .services
        .claims
        .link_to_payroll(&ctx, payload.claim_ids, payload.payroll_item_id)
        .await?;
    Ok(Json(ApiResponse::success(json!({ "linked": linked }))))
}

pub async fn allowed_types(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(employee_id): Path<i64>,
) -> ApiResult<Vec<String>> {
    let types = state.services.claims.allowed_types(&ctx, employee_id).await?;
    Ok(Json(ApiResponse::success(types)))
}

pub async fn categories() -> ApiResult<Vec<String>> {
    Ok(Json(ApiResponse::success(
        CATEGORIES.iter().map(|c| c.to_string()).collect(),
    )))
}
