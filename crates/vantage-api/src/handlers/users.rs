use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use vantage_core::models::{ActivityType, CreateUserRequest, NewActivity, User, UserResponse};
use vantage_core::AppError;

use crate::auth::password::hash_password;
use crate::auth::AdminUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    pub company_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "admin",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or duplicate email", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let company = state
        .stores
        .companies
        .find_company(request.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: request.email.trim().to_lowercase(),
        full_name: request.full_name.trim().to_string(),
        company_id: company.id,
        role: request.role,
        active: true,
        password_hash: hash_password(&request.password)?,
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    let user = state.stores.users.insert_user(user).await?;

    state
        .activity
        .record(
            NewActivity::new(
                ActivityType::UserCreate,
                format!("Created user: {} for company: {}", user.email, company.name),
            )
            .by(admin.user_id, admin.email)
            .metadata(serde_json::json!({ "user_id": user.id, "company_id": company.id })),
        )
        .await;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users, newest first", body = Vec<UserResponse>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let users: Vec<UserResponse> = state
        .stores
        .users
        .list_users(query.company_id)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(Json(users))
}
