use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::TenantContext;
use crate::services::schedules::{
    BulkCreateRequest, BulkCreateSummary, CopyMonthSummary, CreateScheduleRequest, EditWindow,
    TemplateRequest, WeeklyRoster,
};
use crate::{ApiResponse, ApiResult, AppState};

use super::common::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    pub employee_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<ScheduleListQuery>,
) -> ApiResult<Vec<crate::entities::schedule::Model>> {
    let schedules = state
        .services
        .schedules
        .list(&ctx, query.employee_id, query.start_date, query.end_date)
        .await?;
    Ok(Json(ApiResponse::success(schedules)))
}

#[derive(Debug, Deserialize)]
pub struct DepartmentMonthQuery {
    pub department_id: i64,
    pub year: i32,
    pub month: u32,
}

pub async fn department_month(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<DepartmentMonthQuery>,
) -> ApiResult<Vec<crate::entities::schedule::Model>> {
    let schedules = state
        .services
        .schedules
        .department_month(&ctx, query.department_id, query.year, query.month)
        .await?;
    Ok(Json(ApiResponse::success(schedules)))
}

pub async fn employee_month(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((employee_id, year, month)): Path<(i64, i32, u32)>,
) -> ApiResult<Vec<crate::entities::schedule::Model>> {
    let schedules = state
        .services
        .schedules
        .employee_month(&ctx, employee_id, year, month)
        .await?;
    Ok(Json(ApiResponse::success(schedules)))
}

pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CreateScheduleRequest>,
) -> ApiResult<crate::entities::schedule::Model> {
    let schedule = state.services.schedules.create(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

pub async fn bulk_create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<BulkCreateRequest>,
) -> ApiResult<BulkCreateSummary> {
    let summary = state.services.schedules.bulk_create(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<CreateScheduleRequest>,
) -> ApiResult<crate::entities::schedule::Model> {
    let schedule = state.services.schedules.update(&ctx, id, payload).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<MessageResponse> {
    state.services.schedules.delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "schedule deleted",
    ))))
}

pub async fn permissions(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<EditWindow> {
    let window = state.services.schedules.permissions(&ctx).await?;
    Ok(Json(ApiResponse::success(window)))
}

// ---- templates ----

pub async fn list_templates(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Vec<crate::entities::shift_template::Model>> {
    let templates = state.services.schedules.list_templates(&ctx).await?;
    Ok(Json(ApiResponse::success(templates)))
}

pub async fn create_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<TemplateRequest>,
) -> ApiResult<crate::entities::shift_template::Model> {
    let template = state
        .services
        .schedules
        .create_template(&ctx, payload)
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<TemplateRequest>,
) -> ApiResult<crate::entities::shift_template::Model> {
    let template = state
        .services
        .schedules
        .update_template(&ctx, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

pub async fn delete_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<MessageResponse> {
    state.services.schedules.delete_template(&ctx, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "shift template deactivated",
    ))))
}

// ---- roster ----

#[derive(Debug, Deserialize)]
pub struct WeeklyRosterQuery {
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub start_date: NaiveDate,
}

pub async fn weekly_roster(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<WeeklyRosterQuery>,
) -> ApiResult<WeeklyRoster> {
    let roster = state
        .services
        .schedules
        .weekly_roster(&ctx, query.outlet_id, query.department_id, query.start_date)
        .await?;
    Ok(Json(ApiResponse::success(roster)))
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    pub employee_id: i64,
    pub schedule_date: NaiveDate,
    pub shift_template_id: i64,
    pub is_public_holiday: Option<bool>,
}

pub async fn assign(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<AssignBody>,
) -> ApiResult<crate::entities::schedule::Model> {
    let schedule = state
        .services
        .schedules
        .assign(
            &ctx,
            payload.employee_id,
            payload.schedule_date,
            payload.shift_template_id,
            payload.is_public_holiday,
        )
        .await?;
    Ok(Json(ApiResponse::success(schedule)))
}

#[derive(Debug, Deserialize)]
pub struct BulkAssignBody {
    pub shift_template_id: i64,
    pub assignments: Vec<BulkAssignmentItem>,
}

#[derive(Debug, Deserialize)]
pub struct BulkAssignmentItem {
    pub employee_id: i64,
    pub schedule_date: NaiveDate,
}

pub async fn bulk_assign(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<BulkAssignBody>,
) -> ApiResult<BulkCreateSummary> {
    let assignments = payload
        .assignments
        .into_iter()
        .map(|a| (a.employee_id, a.schedule_date))
        .collect();
    let summary = state
        .services
        .schedules
        .bulk_assign(&ctx, assignments, payload.shift_template_id)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[derive(Debug, Deserialize)]
pub struct ClearRosterBody {
    pub outlet_id: Option<i64>,
    pub department_id: Option<i64>,
    pub start_date: NaiveDate,
}

pub async fn clear_roster(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<ClearRosterBody>,
) -> ApiResult<serde_json::Value> {
    let deleted = state
        .services
        .schedules
        .clear_roster(&ctx, payload.outlet_id, payload.department_id, payload.start_date)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "deleted": deleted
    }))))
}

#[derive(Debug, Deserialize)]
pub struct CopyMonthBody {
    pub department_id: i64,
    pub from_year: i32,
    pub from_month: u32,
    pub to_year: i32,
    pub to_month: u32,
}

pub async fn copy_month(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<CopyMonthBody>,
) -> ApiResult<CopyMonthSummary> {
    let summary = state
        .services
        .schedules
        .copy_month(
            &ctx,
            payload.department_id,
            payload.from_year,
            payload.from_month,
            payload.to_year,
            payload.to_month,
        )
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

// ---- extra shift requests ----

#[derive(Debug, Deserialize)]
pub struct ExtraShiftBody {
    pub employee_id: i64,
    pub shift_date: NaiveDate,
    pub shift_template_id: Option<i64>,
    pub reason: Option<String>,
}

pub async fn create_extra_shift_request(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<ExtraShiftBody>,
) -> ApiResult<crate::entities::extra_shift_request::Model> {
    let request = state
        .services
        .schedules
        .create_extra_shift_request(
            &ctx,
            payload.employee_id,
            payload.shift_date,
            payload.shift_template_id,
            payload.reason,
        )
        .await?;
    Ok(Json(ApiResponse::success(request)))
}

#[derive(Debug, Deserialize)]
pub struct ExtraShiftListQuery {
    pub status: Option<String>,
}

pub async fn list_extra_shift_requests(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<ExtraShiftListQuery>,
) -> ApiResult<Vec<crate::entities::extra_shift_request::Model>> {
    let requests = state
        .services
        .schedules
        .list_extra_shift_requests(&ctx, query.status)
        .await?;
    Ok(Json(ApiResponse::success(requests)))
}

pub async fn approve_extra_shift_request(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::extra_shift_request::Model> {
    let request = state
        .services
        .schedules
        .decide_extra_shift_request(&ctx, id, true)
        .await?;
    Ok(Json(ApiResponse::success(request)))
}

pub async fn reject_extra_shift_request(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::extra_shift_request::Model> {
    let request = state
        .services
        .schedules
        .decide_extra_shift_request(&ctx, id, false)
        .await?;
    Ok(Json(ApiResponse::success(request)))
}
