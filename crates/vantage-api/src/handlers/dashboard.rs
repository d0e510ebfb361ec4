use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use vantage_core::models::{ActivityFilter, DashboardStats};

use crate::auth::AdminUser;
use crate::constants::DASHBOARD_RECENT_ACTIVITIES;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "admin",
    responses(
        (status = 200, description = "Portal statistics", body = DashboardStats),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let stores = &state.stores;
    let recent = ActivityFilter {
        limit: Some(DASHBOARD_RECENT_ACTIVITIES),
        ..Default::default()
    };

    let (total_companies, total_users, total_reports, total_access_logs, recent_activities) = tokio::try_join!(
        stores.companies.count_companies(),
        stores.users.count_users(),
        stores.reports.count_reports(),
        stores.activities.count_activities(),
        stores.activities.list_activities(&recent),
    )?;

    Ok(Json(DashboardStats {
        total_companies,
        total_users,
        total_reports,
        total_access_logs,
        recent_activities,
    }))
}
