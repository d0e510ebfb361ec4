//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use crate::setup::routes::health;
use vantage_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vantage API",
        version = "0.1.0",
        description = "Multi-tenant report portal. Administrators upload HTML report bundles for client companies; clients view them through short-lived capability tokens."
    ),
    paths(
        health::health_check,
        // Auth
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        // Admin
        handlers::dashboard::dashboard,
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::delete_company,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::reports_admin::upload_report,
        handlers::reports_admin::list_reports,
        handlers::reports_admin::update_report,
        handlers::activity::list_activity,
        // Client
        handlers::client_reports::list_reports,
        handlers::client_reports::get_report,
        handlers::client_reports::secure_token,
        handlers::client_reports::my_company,
        handlers::report_files::view_report,
        handlers::report_files::explicit_asset,
        handlers::report_files::report_asset,
        handlers::report_files::download_file,
    ),
    components(schemas(
        error::ErrorResponse,
        health::HealthResponse,
        handlers::auth::LoginRequest,
        handlers::auth::LoginResponse,
        handlers::auth::MessageResponse,
        models::Company,
        models::CreateCompanyRequest,
        models::CompanyDeletionResponse,
        models::UserRole,
        models::UserResponse,
        models::CreateUserRequest,
        models::Report,
        models::ReportStatus,
        models::ReportUpdate,
        models::ActivityType,
        models::ActivityLog,
        models::DashboardStats,
        handlers::reports_admin::UploadForm,
        vantage_services::UploadSummary,
        vantage_services::SecureViewToken,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Login and session"),
        (name = "admin", description = "Administration: companies, users, reports, activity"),
        (name = "client", description = "Report listing, viewing and downloads")
    )
)]
pub struct ApiDoc;
