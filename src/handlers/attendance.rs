use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;

use crate::auth::TenantContext;
use crate::entities::clock_record::ClockAction;
use crate::services::attendance::{
    AdminUpsertRequest, AttendanceFilter, ClockRequest, ClockResponse,
};
use crate::{ApiResponse, ApiResult, AppState};

use super::common::BulkOutcome;

pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<AttendanceFilter>,
) -> ApiResult<Vec<crate::entities::clock_record::Model>> {
    let records = state.services.attendance.list(&ctx, filter).await?;
    Ok(Json(ApiResponse::success(records)))
}

pub async fn upsert(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<AdminUpsertRequest>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state.services.attendance.admin_upsert(&ctx, payload).await?;
    Ok(Json(ApiResponse::success(record)))
}

#[derive(Debug, Deserialize)]
pub struct SetEventBody {
    pub time: NaiveTime,
}

pub async fn set_event(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((id, action)): Path<(i64, ClockAction)>,
    Json(payload): Json<SetEventBody>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state
        .services
        .attendance
        .set_event(&ctx, id, action, payload.time)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn approve(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state.services.attendance.approve(&ctx, id).await?;
    Ok(Json(ApiResponse::success(record)))
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
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state
        .services
        .attendance
        .reject(&ctx, id, payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[derive(Debug, Deserialize)]
pub struct ApproveWithScheduleBody {
    pub shift_template_id: i64,
}

pub async fn approve_with_schedule(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<ApproveWithScheduleBody>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state
        .services
        .attendance
        .approve_with_schedule(&ctx, id, payload.shift_template_id)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TotalsOverrideBody {
    pub total_work_minutes: Option<i32>,
    pub ot_minutes: Option<i32>,
}

pub async fn approve_without_schedule(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    payload: Option<Json<TotalsOverrideBody>>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let record = state
        .services
        .attendance
        .approve_without_schedule(&ctx, id, body.total_work_minutes, body.ot_minutes)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn revert(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state.services.attendance.revert(&ctx, id).await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn approve_ot(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state
        .services
        .attendance
        .decide_ot(&ctx, id, true, None)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn reject_ot(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<RejectBody>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let record = state
        .services
        .attendance
        .decide_ot(&ctx, id, false, Some(payload.reason))
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[derive(Debug, Deserialize)]
pub struct BulkIdsBody {
    pub ids: Vec<i64>,
}

pub async fn bulk_approve_ot(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<BulkIdsBody>,
) -> ApiResult<BulkOutcome> {
    let (processed, errors) = state
        .services
        .attendance
        .bulk_approve_ot(&ctx, payload.ids)
        .await?;
    Ok(Json(ApiResponse::success(BulkOutcome { processed, errors })))
}

#[derive(Debug, Deserialize)]
pub struct RecalculateBody {
    pub month: u32,
    pub year: i32,
}

pub async fn recalculate(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<RecalculateBody>,
) -> ApiResult<crate::services::attendance::RecalculateSummary> {
    let summary = state
        .services
        .attendance
        .recalculate(&ctx, payload.year, payload.month)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// The wire field is named employee_id for historical reasons; it carries
/// the external employee code.
#[derive(Debug, Deserialize)]
pub struct ClockBody {
    pub employee_id: String,
    pub ic_number: String,
    pub action: ClockAction,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub photo: Option<String>,
    pub outlet_id: Option<i64>,
}

pub async fn employee_clock(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<ClockBody>,
) -> ApiResult<ClockResponse> {
    let response = state
        .services
        .attendance
        .employee_clock(
            &ctx,
            ClockRequest {
                employee_code: payload.employee_id,
                ic_number: payload.ic_number,
                action: payload.action,
                lat: payload.lat,
                lng: payload.lng,
                photo: payload.photo,
                outlet_id: payload.outlet_id,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

#[derive(Debug, Deserialize)]
pub struct EmployeeIdentityBody {
    pub employee_id: String,
    pub ic_number: String,
}

pub async fn employee_today(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<EmployeeIdentityBody>,
) -> ApiResult<Option<crate::entities::clock_record::Model>> {
    let record = state
        .services
        .attendance
        .employee_today(&ctx, &payload.employee_id, &payload.ic_number)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[derive(Debug, Deserialize)]
pub struct EmployeeHistoryBody {
    pub employee_id: String,
    pub ic_number: String,
    pub year: i32,
    pub month: u32,
}

pub async fn employee_history(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<EmployeeHistoryBody>,
) -> ApiResult<Vec<crate::entities::clock_record::Model>> {
    let records = state
        .services
        .attendance
        .employee_history(
            &ctx,
            &payload.employee_id,
            &payload.ic_number,
            payload.year,
            payload.month,
        )
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: u32,
    pub year: i32,
}

pub async fn summary(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Vec<crate::services::attendance::OutletSummary>> {
    let summary = state
        .services
        .attendance
        .summary(&ctx, query.year, query.month)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn ot_for_payroll(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Vec<crate::services::attendance::OtPayrollLine>> {
    let lines = state
        .services
        .attendance
        .ot_for_payroll(&ctx, year, month)
        .await?;
    Ok(Json(ApiResponse::success(lines)))
}

pub async fn needs_review(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Vec<crate::entities::clock_record::Model>> {
    let records = state.services.attendance.needs_review(&ctx).await?;
    Ok(Json(ApiResponse::success(records)))
}

pub async fn mark_reviewed(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    payload: Option<Json<TotalsOverrideBody>>,
) -> ApiResult<crate::entities::clock_record::Model> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let record = state
        .services
        .attendance
        .mark_reviewed(&ctx, id, body.total_work_minutes, body.ot_minutes)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerAutoClockoutBody {
    pub date: Option<NaiveDate>,
}

pub async fn trigger_auto_clockout(
    State(state): State<AppState>,
    _ctx: TenantContext,
    payload: Option<Json<TriggerAutoClockoutBody>>,
) -> ApiResult<serde_json::Value> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let summary = match body.date {
        Some(date) => state.services.auto_clockout.run_for_date(date).await,
        None => {
            state
                .services
                .auto_clockout
                .run_yesterday(state.config.tz())
                .await
        }
    };
    let success = summary.errors.is_empty();
    Ok(Json(ApiResponse::success(json!({
        "success": success,
        "summary": summary,
    }))))
}

pub async fn auto_clockout_stats(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<crate::services::auto_clockout::AutoClockoutStats> {
    let stats = state.services.auto_clockout.stats(&ctx).await?;
    Ok(Json(ApiResponse::success(stats)))
}
