use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use vantage_core::models::{ActivityFilter, ActivityLog};

use crate::auth::AdminUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Audit log, newest first. `limit` defaults to 100 and is capped at 1000.
#[utoipa::path(
    get,
    path = "/api/admin/activity-logs",
    tag = "admin",
    params(ActivityFilter),
    responses(
        (status = 200, description = "Activity entries", body = Vec<ActivityLog>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_activity(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(filter): Query<ActivityFilter>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.stores.activities.list_activities(&filter).await?))
}
