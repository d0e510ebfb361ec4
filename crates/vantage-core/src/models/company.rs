use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::Report;

/// Company (tenant). Owns users and reports.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request DTO for creating a company
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Company name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything removed by a company cascade delete
#[derive(Debug, Clone)]
pub struct CompanyDeletion {
    pub company: Company,
    pub users_deleted: u64,
    /// Deleted reports, kept so their directories can be removed afterwards
    pub reports: Vec<Report>,
}

/// Response for a company cascade delete
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyDeletionResponse {
    pub message: String,
    pub company_id: Uuid,
    pub users_deleted: u64,
    pub reports_deleted: u64,
}
