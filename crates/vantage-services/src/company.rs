//! Company lifecycle: creation and cascade deletion.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;
use vantage_core::models::{
    ActivityType, Caller, Company, CompanyDeletionResponse, CreateCompanyRequest, NewActivity,
    Report,
};
use vantage_core::AppError;
use vantage_db::Stores;
use vantage_storage::{report_dir_of, ReportStorage};

use crate::activity::ActivityLogger;

#[derive(Clone)]
pub struct CompanyService {
    stores: Stores,
    storage: Arc<ReportStorage>,
    activity: ActivityLogger,
}

impl CompanyService {
    pub fn new(stores: Stores, storage: Arc<ReportStorage>, activity: ActivityLogger) -> Self {
        Self {
            stores,
            storage,
            activity,
        }
    }

    pub async fn create(
        &self,
        admin: &Caller,
        request: CreateCompanyRequest,
    ) -> Result<Company, AppError> {
        let company = self
            .stores
            .companies
            .insert_company(Company::new(request.name.trim().to_string(), request.description))
            .await?;

        self.activity
            .record(
                NewActivity::new(
                    ActivityType::CompanyCreate,
                    format!("Created company: {}", company.name),
                )
                .by(admin.user_id, admin.email.clone())
                .metadata(serde_json::json!({ "company_id": company.id })),
            )
            .await;

        Ok(company)
    }

    /// Delete a company with its users and reports, then remove the reports'
    /// directories. Directory removal is best-effort, and a directory still
    /// holding files of a surviving report is kept.
    #[tracing::instrument(skip(self, admin), fields(admin_id = %admin.user_id))]
    pub async fn delete(
        &self,
        admin: &Caller,
        company_id: Uuid,
    ) -> Result<CompanyDeletionResponse, AppError> {
        let deletion = self
            .stores
            .companies
            .delete_company_cascade(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        self.remove_report_dirs(&deletion.reports).await;

        let reports_deleted = deletion.reports.len() as u64;
        tracing::info!(
            company_id = %company_id,
            users_deleted = deletion.users_deleted,
            reports_deleted,
            "Company deleted"
        );

        self.activity
            .record(
                NewActivity::new(
                    ActivityType::CompanyDelete,
                    format!("Deleted company: {}", deletion.company.name),
                )
                .by(admin.user_id, admin.email.clone())
                .metadata(serde_json::json!({
                    "company_id": company_id,
                    "users_deleted": deletion.users_deleted,
                    "reports_deleted": reports_deleted,
                })),
            )
            .await;

        Ok(CompanyDeletionResponse {
            message: format!("Company {} deleted", deletion.company.name),
            company_id,
            users_deleted: deletion.users_deleted,
            reports_deleted,
        })
    }

    async fn remove_report_dirs(&self, deleted: &[Report]) {
        let survivors = match self.stores.reports.list_reports(None, false).await {
            Ok(reports) => reports,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list remaining reports, keeping directories");
                return;
            }
        };
        let in_use: HashSet<String> = survivors
            .iter()
            .flat_map(Report::stored_files)
            .filter_map(report_dir_of)
            .collect();

        let mut seen = HashSet::new();
        for report in deleted {
            let Some((anchor, dir)) = report
                .stored_files()
                .find_map(|p| report_dir_of(p).map(|dir| (p, dir)))
            else {
                continue;
            };
            if !seen.insert(dir.clone()) {
                continue;
            }
            if in_use.contains(&dir) {
                tracing::warn!(
                    report_id = %report.id,
                    directory = %dir,
                    "Report directory shared with another company, keeping it"
                );
                continue;
            }
            if let Err(e) = self.storage.remove_report_dir(anchor).await {
                tracing::warn!(
                    report_id = %report.id,
                    error = %e,
                    "Failed to remove report directory"
                );
            }
        }
    }
}
