//! Administrator report endpoints: upload, listing and updates

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use vantage_core::models::{Report, ReportUpdate};
use vantage_core::AppError;
use vantage_services::{UploadRequest, UploadSummary};
use vantage_storage::UploadItem;

use crate::auth::AdminUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ReportListQuery {
    pub company_id: Option<Uuid>,
}

/// Multipart form accepted by the upload endpoint
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    title: String,
    description: Option<String>,
    company_id: Uuid,
    /// `true`, `1`, `yes` or `on`
    allow_download: Option<String>,
    notify_users: Option<String>,
    /// HTML pages, assets, or zip archives to expand
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<Vec<u8>>,
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Collect the upload form. Every part carrying a filename is an upload item.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, HttpAppError> {
    let mut title = None;
    let mut description = None;
    let mut company_id = None;
    let mut allow_download = false;
    let mut notify_users = false;
    let mut items = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if let Some(filename) = field.file_name().map(str::to_string) {
            let data = field.bytes().await?;
            items.push(UploadItem::new(filename, data));
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await?;
        match name.as_str() {
            "title" => title = Some(value),
            "description" => description = Some(value).filter(|v| !v.trim().is_empty()),
            "company_id" => {
                let id = Uuid::parse_str(value.trim())
                    .map_err(|_| AppError::InvalidInput("company_id must be a UUID".to_string()))?;
                company_id = Some(id);
            }
            "allow_download" => allow_download = parse_flag(&value),
            "notify_users" => notify_users = parse_flag(&value),
            other => tracing::debug!(field = %other, "Ignoring unknown upload field"),
        }
    }

    Ok(UploadRequest {
        title: title.ok_or_else(|| AppError::InvalidInput("title is required".to_string()))?,
        description,
        company_id: company_id
            .ok_or_else(|| AppError::InvalidInput("company_id is required".to_string()))?,
        allow_download,
        notify_users,
        items,
    })
}

#[utoipa::path(
    post,
    path = "/api/admin/reports/upload",
    tag = "admin",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Report uploaded", body = UploadSummary),
        (status = 400, description = "Missing field or disallowed file type", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn upload_report(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let request = read_upload_form(multipart).await?;
    let summary = state.ingest.upload(&admin, request).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports",
    tag = "admin",
    params(ReportListQuery),
    responses(
        (status = 200, description = "Reports, newest first", body = Vec<Report>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ReportListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(
        state.stores.reports.list_reports(query.company_id, false).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/admin/reports/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = ReportUpdate,
    responses(
        (status = 200, description = "Updated report", body = Report),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_report(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<ReportUpdate>,
) -> Result<impl IntoResponse, HttpAppError> {
    update.validate().map_err(AppError::from)?;
    if update.is_empty() {
        return Err(AppError::InvalidInput("No fields to update".to_string()).into());
    }

    let report = state
        .stores
        .reports
        .update_report(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

    tracing::info!(report_id = %id, admin_id = %admin.user_id, "Report updated");
    Ok(Json(report))
}
