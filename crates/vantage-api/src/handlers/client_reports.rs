//! Report endpoints for signed-in clients (admins see every company)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use vantage_core::models::{Company, Report};
use vantage_core::AppError;
use vantage_services::SecureViewToken;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::ip_extraction::RequestClient;

#[utoipa::path(
    get,
    path = "/api/client/reports",
    tag = "client",
    responses(
        (status = 200, description = "Published reports visible to the caller", body = Vec<Report>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.assets.list_for_caller(&caller).await?))
}

#[utoipa::path(
    get,
    path = "/api/client/reports/{id}",
    tag = "client",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report metadata", body = Report),
        (status = 404, description = "Report not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    RequestClient(client): RequestClient,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.assets.report_metadata(&caller, id, &client).await?))
}

#[utoipa::path(
    get,
    path = "/api/client/reports/{id}/secure-token",
    tag = "client",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Short-lived viewing token", body = SecureViewToken),
        (status = 404, description = "Report not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn secure_token(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.assets.secure_view_token(&caller, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/client/company",
    tag = "client",
    responses(
        (status = 200, description = "The caller's company", body = Company),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn my_company(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let company = state
        .stores
        .companies
        .find_company(caller.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    Ok(Json(company))
}
