//! Login, logout and current-user endpoints

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vantage_core::models::{ActivityType, Company, NewActivity, UserResponse};
use vantage_core::AppError;

use crate::auth::password::verify_password;
use crate::auth::AuthUser;
use crate::constants::TOKEN_TYPE;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ip_extraction::RequestClient;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
    pub company: Option<Company>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

const BAD_CREDENTIALS: &str = "Incorrect email or password";

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Bad credentials or inactive account", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, client, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    RequestClient(client): RequestClient,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = request.email.trim().to_lowercase();
    let user = state.stores.users.find_user_by_email(&email).await?;

    let user = match user {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            state.activity.log(
                NewActivity::new(ActivityType::FailedLogin, format!("Failed login attempt for {}", email))
                    .email(email.clone())
                    .client(client.ip_address, client.user_agent),
            );
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()).into());
        }
    };

    if !user.active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()).into());
    }

    state.stores.users.record_login(user.id).await?;
    let access_token = state.jwt.issue(&user)?;
    let company = state.stores.companies.find_company(user.company_id).await?;

    state
        .activity
        .record(
            NewActivity::new(ActivityType::Login, "User logged in")
                .by(user.id, user.email.clone())
                .client(client.ip_address, client.user_agent),
        )
        .await;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        user: user.into(),
        company,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    RequestClient(client): RequestClient,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .activity
        .record(
            NewActivity::new(ActivityType::Logout, "User logged out")
                .by(caller.user_id, caller.email)
                .client(client.ip_address, client.user_agent),
        )
        .await;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .stores
        .users
        .find_user(caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
