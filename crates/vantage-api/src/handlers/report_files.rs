//! Report file serving: the rewritten entry page, its assets and downloads.
//!
//! Viewing endpoints accept either a capability token (`?token=`) or a bearer
//! JWT, since browsers loading iframe content cannot attach headers. The
//! capability is tried first; if neither resolves the request is 401. HTML is
//! only rewritten with a token that was accepted.

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;
use vantage_core::models::Caller;
use vantage_core::AppError;
use vantage_services::{AssetBody, ServedAsset};

use crate::auth::middleware::authenticate_bearer;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::ip_extraction::RequestClient;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewQuery {
    /// Capability token from `/secure-token`
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Stored path of the file, as listed in the report. Defaults to the entry point.
    pub file_path: Option<String>,
}

/// Caller behind a viewing request, with the capability token when that is
/// what authenticated it
struct Viewer<'a> {
    caller: Caller,
    token: Option<&'a str>,
}

/// Capability token first, then bearer JWT
async fn resolve_viewer<'a>(
    state: &AppState,
    report_id: Uuid,
    token: Option<&'a str>,
    headers: &HeaderMap,
) -> Result<Viewer<'a>, AppError> {
    if let Some(token) = token {
        if let Some(caller) = state.assets.caller_from_capability(token, report_id).await? {
            return Ok(Viewer {
                caller,
                token: Some(token),
            });
        }
        tracing::debug!(report_id = %report_id, "Capability token rejected, trying bearer");
    }

    let caller = authenticate_bearer(state, headers).await.map_err(|_| {
        AppError::Unauthorized("Valid token or bearer authentication required".to_string())
    })?;
    Ok(Viewer {
        caller,
        token: None,
    })
}

fn non_empty(token: &Option<String>) -> Option<&str> {
    token.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// Build the response for a served file. HTML gets a frame policy that only
/// allows the portal itself to embed it.
fn file_response(served: ServedAsset) -> Result<Response, HttpAppError> {
    let (body, length) = match served.body {
        AssetBody::Full(bytes) => {
            let len = bytes.len() as u64;
            (Body::from(bytes), len)
        }
        AssetBody::Stream(stream, len) => (
            Body::from_stream(stream.map_err(io::Error::other)),
            len,
        ),
    };

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, served.content_type)
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0");

    if served.content_type.starts_with("text/html") {
        response = response
            .header(header::CONTENT_SECURITY_POLICY, "frame-ancestors 'self'")
            .header(header::X_FRAME_OPTIONS, "SAMEORIGIN");
    }

    if let Some(filename) = served.filename.as_deref() {
        response = response.header(header::CONTENT_DISPOSITION, attachment_header(filename)?);
    }

    response
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn attachment_header(filename: &str) -> Result<HeaderValue, AppError> {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    ))
    .map_err(|e| AppError::Internal(format!("Invalid content disposition: {}", e)))
}

#[utoipa::path(
    get,
    path = "/api/client/reports/{id}/view",
    tag = "client",
    params(("id" = Uuid, Path, description = "Report ID"), ViewQuery),
    responses(
        (status = 200, description = "Entry page, with the token appended to relative links", content_type = "text/html"),
        (status = 401, description = "No valid token or bearer", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, headers, client))]
pub async fn view_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
    RequestClient(client): RequestClient,
) -> Result<Response, HttpAppError> {
    let viewer = resolve_viewer(&state, id, non_empty(&query.token), &headers).await?;
    let served = state
        .assets
        .view_entry(&viewer.caller, id, viewer.token, &client)
        .await?;
    file_response(served)
}

#[utoipa::path(
    get,
    path = "/api/client/reports/{id}/{path}",
    tag = "client",
    params(
        ("id" = Uuid, Path, description = "Report ID"),
        ("path" = String, Path, description = "Path relative to the entry page"),
        ViewQuery
    ),
    responses(
        (status = 200, description = "Asset content"),
        (status = 401, description = "No valid token or bearer", body = ErrorResponse),
        (status = 403, description = "Path escapes the report directory", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse)
    )
)]
pub async fn report_asset(
    State(state): State<Arc<AppState>>,
    Path((id, path)): Path<(Uuid, String)>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let viewer = resolve_viewer(&state, id, non_empty(&query.token), &headers).await?;
    let served = state
        .assets
        .asset(&viewer.caller, id, &path, viewer.token)
        .await?;
    file_response(served)
}

/// `/{id}/assets/x` is what a relative `assets/x` link on the entry page
/// resolves to, so `assets/x` is looked up first. A miss falls back to `x`.
#[utoipa::path(
    get,
    path = "/api/client/reports/{id}/assets/{path}",
    tag = "client",
    params(
        ("id" = Uuid, Path, description = "Report ID"),
        ("path" = String, Path, description = "Path relative to the entry page"),
        ViewQuery
    ),
    responses(
        (status = 200, description = "Asset content"),
        (status = 401, description = "No valid token or bearer", body = ErrorResponse),
        (status = 403, description = "Path escapes the report directory", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse)
    )
)]
pub async fn explicit_asset(
    State(state): State<Arc<AppState>>,
    Path((id, path)): Path<(Uuid, String)>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let viewer = resolve_viewer(&state, id, non_empty(&query.token), &headers).await?;
    let nested = format!("assets/{}", path);
    let served = match state
        .assets
        .asset(&viewer.caller, id, &nested, viewer.token)
        .await
    {
        Err(AppError::NotFound(_)) => {
            state
                .assets
                .asset(&viewer.caller, id, &path, viewer.token)
                .await?
        }
        other => other?,
    };
    file_response(served)
}

#[utoipa::path(
    get,
    path = "/api/client/reports/{id}/download",
    tag = "client",
    params(("id" = Uuid, Path, description = "Report ID"), DownloadQuery),
    responses(
        (status = 200, description = "File as attachment, the entry point when no file_path is given"),
        (status = 403, description = "Downloads disabled or file not part of the report", body = ErrorResponse),
        (status = 404, description = "Report or file not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
    RequestClient(client): RequestClient,
) -> Result<Response, HttpAppError> {
    let caller = authenticate_bearer(&state, &headers).await?;
    let served = state
        .assets
        .download(&caller, id, non_empty(&query.file_path), &client)
        .await?;
    file_response(served)
}
