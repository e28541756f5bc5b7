use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::auth::TenantContext;
use crate::{ApiResponse, ApiResult, AppState};

pub async fn list_for_employee(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(employee_id): Path<i64>,
) -> ApiResult<Vec<crate::entities::notification::Model>> {
    let rows = state
        .services
        .notifications
        .list_for_employee(&ctx, employee_id)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}
