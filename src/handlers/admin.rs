//! Admin surface: media retention, driver sync and manual job triggers.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::TenantContext;
use crate::errors::ServiceError;
use crate::{ApiResponse, ApiResult, AppState};

fn today(state: &AppState) -> NaiveDate {
    Utc::now().with_timezone(&state.config.tz()).date_naive()
}

// ---- retention ----

pub async fn retention_status(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<crate::services::retention::RetentionStatus> {
    let status = state.services.retention.status(&ctx, today(&state)).await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn retention_pending(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Vec<crate::entities::clock_record::Model>> {
    let rows = state.services.retention.pending(&ctx, today(&state)).await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn retention_logs(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> ApiResult<Vec<crate::entities::data_retention_log::Model>> {
    let rows = state.services.retention.logs(&ctx).await?;
    Ok(Json(ApiResponse::success(rows)))
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupBody {
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn retention_cleanup(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Option<Json<CleanupBody>>,
) -> ApiResult<crate::services::retention::CleanupSummary> {
    if !ctx.role.is_super_admin() {
        return Err(ServiceError::Forbidden(
            "media retention cleanup requires the super_admin role".into(),
        ));
    }
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let summary = state
        .services
        .retention
        .cleanup(&ctx, today(&state), body.dry_run)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

// ---- driver sync ----

pub async fn aaalive_test(
    State(state): State<AppState>,
    _ctx: TenantContext,
) -> ApiResult<serde_json::Value> {
    let payload = state.services.driver_sync.test().await?;
    Ok(Json(ApiResponse::success(payload)))
}

#[derive(Debug, Deserialize)]
pub struct ShiftsQuery {
    pub date: NaiveDate,
}

pub async fn aaalive_shifts(
    State(state): State<AppState>,
    _ctx: TenantContext,
    Query(query): Query<ShiftsQuery>,
) -> ApiResult<serde_json::Value> {
    let shifts = state.services.driver_sync.fetch_shifts(query.date).await?;
    Ok(Json(ApiResponse::success(json!({
        "date": query.date,
        "count": shifts.len(),
    }))))
}

pub async fn aaalive_drivers(
    State(state): State<AppState>,
    _ctx: TenantContext,
) -> ApiResult<Vec<crate::services::driver_sync::UpstreamDriver>> {
    let drivers = state.services.driver_sync.fetch_drivers().await?;
    Ok(Json(ApiResponse::success(drivers)))
}

/// Body is either `{date}` or `{start, end}` (inclusive).
#[derive(Debug, Deserialize)]
pub struct SyncBody {
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub async fn aaalive_sync(
    State(state): State<AppState>,
    _ctx: TenantContext,
    Json(payload): Json<SyncBody>,
) -> ApiResult<serde_json::Value> {
    let dates: Vec<NaiveDate> = match (payload.date, payload.start, payload.end) {
        (Some(date), None, None) => vec![date],
        (None, Some(start), Some(end)) if start <= end => {
            std::iter::successors(Some(start), |d| {
                let next = *d + chrono::Duration::days(1);
                (next <= end).then_some(next)
            })
            .collect()
        }
        _ => {
            return Err(ServiceError::ValidationError(
                "provide either {date} or {start, end}".into(),
            ))
        }
    };

    let summary = state.services.driver_sync.sync_dates(dates).await;
    let success = summary.errors.is_empty();
    Ok(Json(ApiResponse::success(json!({
        "success": success,
        "summary": summary,
    }))))
}

// ---- manual notifier trigger ----

#[derive(Debug, Default, Deserialize)]
pub struct NotifierBody {
    pub date: Option<NaiveDate>,
}

pub async fn trigger_holiday_notifier(
    State(state): State<AppState>,
    _ctx: TenantContext,
    payload: Option<Json<NotifierBody>>,
) -> ApiResult<serde_json::Value> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let summary = match body.date {
        Some(date) => state.services.holiday_notifier.run_for_date(date).await,
        None => {
            state
                .services
                .holiday_notifier
                .run_for_tomorrow(state.config.tz())
                .await
        }
    };
    let success = summary.errors.is_empty();
    Ok(Json(ApiResponse::success(json!({
        "success": success,
        "summary": summary,
    }))))
}

/// Manual trigger for the employment lifecycle updater.
pub async fn trigger_resignation_updater(
    State(state): State<AppState>,
    _ctx: TenantContext,
) -> ApiResult<serde_json::Value> {
    let (advanced, leaves_rejected) = state
        .services
        .resignations
        .advance_employment_statuses(today(&state))
        .await?;
    Ok(Json(ApiResponse::success(json!({
        "success": true,
        "advanced": advanced,
        "leaves_rejected": leaves_rejected,
    }))))
}
