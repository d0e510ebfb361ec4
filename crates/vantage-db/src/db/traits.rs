//! Store traits
//!
//! Services depend on these traits only; `Stores` bundles one implementation
//! of each.

use async_trait::async_trait;
use uuid::Uuid;
use vantage_core::models::{
    ActivityFilter, ActivityLog, Company, CompanyDeletion, Report, ReportUpdate, User,
};
use vantage_core::AppError;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Insert a company. A duplicate name is a `BadRequest`.
    async fn insert_company(&self, company: Company) -> Result<Company, AppError>;

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, AppError>;

    async fn list_companies(&self) -> Result<Vec<Company>, AppError>;

    async fn count_companies(&self) -> Result<i64, AppError>;

    /// Delete the company with its users and reports atomically.
    /// Returns `None` when the company does not exist.
    async fn delete_company_cascade(&self, id: Uuid) -> Result<Option<CompanyDeletion>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A duplicate email is a `BadRequest`.
    async fn insert_user(&self, user: User) -> Result<User, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Users, optionally restricted to one company, newest first
    async fn list_users(&self, company_id: Option<Uuid>) -> Result<Vec<User>, AppError>;

    async fn record_login(&self, id: Uuid) -> Result<(), AppError>;

    async fn count_users(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_report(&self, report: Report) -> Result<Report, AppError>;

    async fn find_report(&self, id: Uuid) -> Result<Option<Report>, AppError>;

    /// Reports newest first, optionally restricted to one company and to
    /// published reports
    async fn list_reports(
        &self,
        company_id: Option<Uuid>,
        published_only: bool,
    ) -> Result<Vec<Report>, AppError>;

    /// Apply a partial update. Returns `None` when the report does not exist.
    async fn update_report(&self, id: Uuid, update: &ReportUpdate)
        -> Result<Option<Report>, AppError>;

    /// Atomically add one to the view counter. Returns false if the report is gone.
    async fn increment_view_count(&self, id: Uuid) -> Result<bool, AppError>;

    /// Atomically add one to the download counter. Returns false if the report is gone.
    async fn increment_download_count(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count_reports(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert_activity(&self, activity: ActivityLog) -> Result<(), AppError>;

    /// Entries matching `filter`, newest first
    async fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>, AppError>;

    async fn count_activities(&self) -> Result<i64, AppError>;
}
