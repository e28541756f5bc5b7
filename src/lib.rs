//! kerani-api library
//!
//! Back-office engine for a multi-tenant HRMS: time & attendance,
//! rostering, commission, claims, leave and final settlement.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod jobs;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AdminRole, AuthRouterExt};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    // Attendance: employee-facing clock endpoints plus the admin surface.
    let attendance = Router::new()
        .route("/attendance", get(handlers::attendance::list))
        .route("/attendance", post(handlers::attendance::upsert))
        .route(
            "/attendance/{id}/action/{action}",
            axum::routing::put(handlers::attendance::set_event),
        )
        .route("/attendance/{id}/approve", post(handlers::attendance::approve))
        .route("/attendance/{id}/reject", post(handlers::attendance::reject))
        .route(
            "/attendance/{id}/approve-with-schedule",
            post(handlers::attendance::approve_with_schedule),
        )
        .route(
            "/attendance/{id}/approve-without-schedule",
            post(handlers::attendance::approve_without_schedule),
        )
        .route("/attendance/{id}/revert", post(handlers::attendance::revert))
        .route("/attendance/{id}/approve-ot", post(handlers::attendance::approve_ot))
        .route("/attendance/{id}/reject-ot", post(handlers::attendance::reject_ot))
        .route(
            "/attendance/bulk-approve-ot",
            post(handlers::attendance::bulk_approve_ot),
        )
        .route("/attendance/recalculate", post(handlers::attendance::recalculate))
        .route("/attendance/employee/clock", post(handlers::attendance::employee_clock))
        .route("/attendance/employee/today", post(handlers::attendance::employee_today))
        .route(
            "/attendance/employee/history",
            post(handlers::attendance::employee_history),
        )
        .route("/attendance/summary", get(handlers::attendance::summary))
        .route(
            "/attendance/ot-for-payroll/{year}/{month}",
            get(handlers::attendance::ot_for_payroll),
        )
        .route("/attendance/needs-review", get(handlers::attendance::needs_review))
        .route(
            "/attendance/{id}/mark-reviewed",
            post(handlers::attendance::mark_reviewed),
        )
        .route(
            "/attendance/trigger-auto-clockout",
            post(handlers::attendance::trigger_auto_clockout),
        )
        .route(
            "/attendance/auto-clockout-stats",
            get(handlers::attendance::auto_clockout_stats),
        )
        .with_auth();

    // Schedules: edit windows are enforced inside the service per role.
    let schedules = Router::new()
        .route("/schedules", get(handlers::schedules::list))
        .route("/schedules", post(handlers::schedules::create))
        .route("/schedules/calendar", get(handlers::schedules::list))
        .route("/schedules/bulk", post(handlers::schedules::bulk_create))
        .route(
            "/schedules/employees/{id}/month/{year}/{month}",
            get(handlers::schedules::employee_month),
        )
        .route("/schedules/permissions", get(handlers::schedules::permissions))
        .route("/schedules/templates", get(handlers::schedules::list_templates))
        .route("/schedules/templates", post(handlers::schedules::create_template))
        .route(
            "/schedules/templates/{id}",
            axum::routing::put(handlers::schedules::update_template),
        )
        .route(
            "/schedules/templates/{id}",
            axum::routing::delete(handlers::schedules::delete_template),
        )
        .route("/schedules/roster/weekly", get(handlers::schedules::weekly_roster))
        .route("/schedules/roster/assign", post(handlers::schedules::assign))
        .route(
            "/schedules/roster/bulk-assign",
            post(handlers::schedules::bulk_assign),
        )
        .route(
            "/schedules/roster/clear",
            axum::routing::delete(handlers::schedules::clear_roster),
        )
        .route(
            "/schedules/roster/department/weekly",
            get(handlers::schedules::weekly_roster),
        )
        .route(
            "/schedules/roster/department/monthly",
            get(handlers::schedules::department_month),
        )
        .route(
            "/schedules/roster/department/assign",
            post(handlers::schedules::assign),
        )
        .route(
            "/schedules/roster/department/bulk-assign",
            post(handlers::schedules::bulk_assign),
        )
        .route(
            "/schedules/roster/department/copy-month",
            post(handlers::schedules::copy_month),
        )
        .route(
            "/schedules/extra-shift-requests",
            get(handlers::schedules::list_extra_shift_requests),
        )
        .route(
            "/schedules/extra-shift-requests",
            post(handlers::schedules::create_extra_shift_request),
        )
        .route(
            "/schedules/extra-shift-requests/{id}/approve",
            post(handlers::schedules::approve_extra_shift_request),
        )
        .route(
            "/schedules/extra-shift-requests/{id}/reject",
            post(handlers::schedules::reject_extra_shift_request),
        )
        .route("/schedules/{id}", axum::routing::put(handlers::schedules::update))
        .route(
            "/schedules/{id}",
            axum::routing::delete(handlers::schedules::delete),
        )
        .with_auth();

    let commission_read = Router::new()
        .route("/commission/sales", get(handlers::commission::list_sales))
        .route("/commission/sales/{id}", get(handlers::commission::get_sales))
        .route(
            "/commission/payouts/employee/{employee_id}",
            get(handlers::commission::employee_payouts),
        )
        .route("/commission/outlets", get(handlers::commission::outlets))
        .with_auth();

    let commission_write = Router::new()
        .route("/commission/sales", post(handlers::commission::upsert_sales))
        .route(
            "/commission/sales/{id}/calculate",
            post(handlers::commission::calculate),
        )
        .route(
            "/commission/sales/{id}/finalize",
            post(handlers::commission::finalize),
        )
        .route("/commission/sales/{id}/revert", post(handlers::commission::revert))
        .route(
            "/commission/sales/{id}",
            axum::routing::delete(handlers::commission::delete),
        )
        .with_role(AdminRole::Admin);

    let claims = Router::new()
        .route("/claims", get(handlers::claims::list))
        .route("/claims", post(handlers::claims::create))
        .route("/claims/pending-count", get(handlers::claims::pending_count))
        .route("/claims/summary", get(handlers::claims::summary))
        .route("/claims/for-payroll", get(handlers::claims::for_payroll))
        .route("/claims/link-to-payroll", post(handlers::claims::link_to_payroll))
        .route("/claims/bulk-approve", post(handlers::claims::bulk_approve))
        .route("/claims/categories", get(handlers::claims::categories))
        .route(
            "/claims/allowed-types/{employee_id}",
            get(handlers::claims::allowed_types),
        )
        .route("/claims/{id}", axum::routing::put(handlers::claims::update))
        .route("/claims/{id}/approve", post(handlers::claims::approve))
        .route("/claims/{id}/reject", post(handlers::claims::reject))
        .route("/claims/{id}/revert", post(handlers::claims::revert))
        .with_auth();

    let leaves = Router::new()
        .route("/leaves", get(handlers::leaves::list))
        .route("/leaves", post(handlers::leaves::create))
        .route("/leaves/{id}/approve", post(handlers::leaves::approve))
        .route("/leaves/{id}/reject", post(handlers::leaves::reject))
        .route("/leaves/{id}/cancel", post(handlers::leaves::cancel))
        .route(
            "/leaves/balances/{employee_id}/{year}",
            get(handlers::leaves::balances),
        )
        .with_auth();

    let salary_advances = Router::new()
        .route("/salary-advances", get(handlers::salary_advances::list))
        .route("/salary-advances", post(handlers::salary_advances::create))
        .route(
            "/salary-advances/{id}/activate",
            post(handlers::salary_advances::activate),
        )
        .route(
            "/salary-advances/{id}/cancel",
            post(handlers::salary_advances::cancel),
        )
        .route(
            "/salary-advances/{id}/deduct",
            post(handlers::salary_advances::deduct),
        )
        .route(
            "/salary-advances/{id}/deductions",
            get(handlers::salary_advances::deductions),
        )
        .with_role(AdminRole::Admin);

    let resignations = Router::new()
        .route("/resignations", get(handlers::resignations::list))
        .route("/resignations", post(handlers::resignations::create))
        .route("/resignations/{id}", get(handlers::resignations::get))
        .route(
            "/resignations/{id}",
            axum::routing::put(handlers::resignations::update),
        )
        .route("/resignations/{id}/approve", post(handlers::resignations::approve))
        .route("/resignations/{id}/reject", post(handlers::resignations::reject))
        .route(
            "/resignations/{id}/withdraw",
            post(handlers::resignations::withdraw),
        )
        .route("/resignations/{id}/cancel", post(handlers::resignations::cancel))
        .route(
            "/resignations/{id}/waive-notice",
            post(handlers::resignations::waive_notice),
        )
        .route(
            "/resignations/{id}/clearance",
            get(handlers::resignations::clearance_items),
        )
        .route(
            "/resignations/{id}/clearance/generate",
            post(handlers::resignations::regenerate_clearance),
        )
        .route(
            "/resignations/{id}/clearance/{item_id}",
            post(handlers::resignations::set_clearance_item),
        )
        .route(
            "/resignations/{id}/check-leaves",
            get(handlers::resignations::check_leaves),
        )
        .route(
            "/resignations/{id}/leave-entitlement",
            get(handlers::resignations::leave_entitlement),
        )
        .route(
            "/resignations/{id}/settlement",
            get(handlers::resignations::stored_settlement),
        )
        .route(
            "/resignations/{id}/settlement",
            post(handlers::resignations::compute_settlement),
        )
        .route("/resignations/{id}/process", post(handlers::resignations::process))
        .route(
            "/resignations/{id}/cleanup-leaves",
            post(handlers::resignations::cleanup_leaves),
        )
        .with_auth();

    let notifications = Router::new()
        .route(
            "/notifications/employee/{employee_id}",
            get(handlers::notifications::list_for_employee),
        )
        .with_auth();

    // Admin: retention, driver sync and manual job triggers.
    let admin = Router::new()
        .route("/admin/retention/status", get(handlers::admin::retention_status))
        .route("/admin/retention/pending", get(handlers::admin::retention_pending))
        .route("/admin/retention/logs", get(handlers::admin::retention_logs))
        .route("/admin/retention/cleanup", post(handlers::admin::retention_cleanup))
        .route("/admin/aaalive/test", get(handlers::admin::aaalive_test))
        .route("/admin/aaalive/shifts", get(handlers::admin::aaalive_shifts))
        .route("/admin/aaalive/drivers", get(handlers::admin::aaalive_drivers))
        .route("/admin/aaalive/sync", post(handlers::admin::aaalive_sync))
        .route(
            "/admin/notifier/holiday",
            post(handlers::admin::trigger_holiday_notifier),
        )
        .route(
            "/admin/resignation-updater",
            post(handlers::admin::trigger_resignation_updater),
        )
        .with_role(AdminRole::Admin);

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(attendance)
        .merge(schedules)
        .merge(commission_read)
        .merge(commission_write)
        .merge(claims)
        .merge(leaves)
        .merge(salary_advances)
        .merge(resignations)
        .merge(notifications)
        .merge(admin)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "kerani-api",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
