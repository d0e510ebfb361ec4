pub mod jwt;
pub mod middleware;
pub mod password;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vantage_core::models::Caller;
use vantage_core::AppError;

use crate::error::HttpAppError;

/// Authenticated caller placed in request extensions by `auth_middleware`
#[derive(Debug, Clone)]
pub struct AuthUser(pub Caller);

/// Authenticated caller with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub Caller);

// Extension cannot be combined with Multipart, so the caller is read from
// the request parts directly.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authentication context".to_string(),
                ))
            })
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            return Err(HttpAppError(AppError::Forbidden(
                "Admin access required".to_string(),
            )));
        }
        Ok(AdminUser(caller))
    }
}
