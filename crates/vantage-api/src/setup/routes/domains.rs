//! Route groups by audience: admin, client, report files.

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::Arc;

fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&api("/auth/logout"), post(handlers::auth::logout))
        .route(&api("/auth/me"), get(handlers::auth::me))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&api("/admin/dashboard"), get(handlers::dashboard::dashboard))
        .route(
            &api("/admin/companies"),
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            &api("/admin/companies/{id}"),
            delete(handlers::companies::delete_company),
        )
        .route(
            &api("/admin/users"),
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route(
            &api("/admin/reports/upload"),
            post(handlers::reports_admin::upload_report),
        )
        .route(
            &api("/admin/reports"),
            get(handlers::reports_admin::list_reports),
        )
        .route(
            &api("/admin/reports/{id}"),
            patch(handlers::reports_admin::update_report),
        )
        .route(
            &api("/admin/activity-logs"),
            get(handlers::activity::list_activity),
        )
}

pub fn client_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/client/reports"),
            get(handlers::client_reports::list_reports),
        )
        .route(
            &api("/client/reports/{id}"),
            get(handlers::client_reports::get_report),
        )
        .route(
            &api("/client/reports/{id}/secure-token"),
            get(handlers::client_reports::secure_token),
        )
        .route(&api("/client/company"), get(handlers::client_reports::my_company))
}

/// Authenticated per request (capability token or bearer), not by middleware
pub fn report_file_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/client/reports/{id}/view"),
            get(handlers::report_files::view_report),
        )
        .route(
            &api("/client/reports/{id}/download"),
            get(handlers::report_files::download_file),
        )
        .route(
            &api("/client/reports/{id}/assets/{*path}"),
            get(handlers::report_files::explicit_asset),
        )
        // Relative URLs inside the entry page resolve against /view
        .route(
            &api("/client/reports/{id}/{*path}"),
            get(handlers::report_files::report_asset),
        )
}
