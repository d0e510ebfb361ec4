use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;
use vantage_core::models::{Company, CompanyDeletionResponse, CreateCompanyRequest};

use crate::auth::AdminUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/admin/companies",
    tag = "admin",
    request_body = CreateCompanyRequest,
    responses(
        (status = 200, description = "Company created", body = Company),
        (status = 400, description = "Invalid input or duplicate name", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_company(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(vantage_core::AppError::from)?;
    let company = state.companies.create(&admin, request).await?;
    Ok(Json(company))
}

#[utoipa::path(
    get,
    path = "/api/admin/companies",
    tag = "admin",
    responses(
        (status = 200, description = "All companies", body = Vec<Company>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.stores.companies.list_companies().await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/companies/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company, its users and its reports deleted", body = CompanyDeletionResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.companies.delete(&admin, id).await?))
}
