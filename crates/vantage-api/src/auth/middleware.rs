use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use vantage_core::models::Caller;
use vantage_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

/// The token of an `Authorization: Bearer` header, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve a bearer JWT into a caller. The user must still exist and be active.
pub async fn authenticate_bearer(state: &AppState, headers: &HeaderMap) -> Result<Caller, AppError> {
    let token = match headers.get("Authorization") {
        None => {
            return Err(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
        }
        Some(_) => bearer_token(headers).ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?,
    };

    let claims = state.jwt.verify(token)?;
    let user = state
        .stores
        .users
        .find_user(claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_string()))?;

    Ok(Caller::from(&user))
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_bearer(&state, request.headers()).await {
        Ok(caller) => {
            tracing::debug!(user_id = %caller.user_id, role = caller.role.as_str(), "Authenticated");
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
