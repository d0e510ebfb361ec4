//! Report upload orchestration: company lookup, storage, persistence,
//! activity logging and notifications.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use vantage_core::models::{ActivityType, Caller, NewActivity, Report, ReportStatus};
use vantage_core::validation::format_file_size;
use vantage_core::AppError;
use vantage_db::Stores;
use vantage_storage::{ReportStorage, UploadItem};

use crate::activity::ActivityLogger;
use crate::notify::{Notifier, Recipient, ReportNotice};

/// A report upload as received from an administrator
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub title: String,
    pub description: Option<String>,
    pub company_id: Uuid,
    pub allow_download: bool,
    pub notify_users: bool,
    pub items: Vec<UploadItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadSummary {
    pub message: String,
    pub report_id: Uuid,
    pub files_uploaded: usize,
    /// Human readable, e.g. "1.5 KB"
    pub total_size: String,
    pub notifications_sent: usize,
}

#[derive(Clone)]
pub struct IngestService {
    stores: Stores,
    storage: Arc<ReportStorage>,
    activity: ActivityLogger,
    notifier: Arc<dyn Notifier>,
    allowed_types: Arc<[String]>,
}

impl IngestService {
    pub fn new(
        stores: Stores,
        storage: Arc<ReportStorage>,
        activity: ActivityLogger,
        notifier: Arc<dyn Notifier>,
        allowed_types: Vec<String>,
    ) -> Self {
        Self {
            stores,
            storage,
            activity,
            notifier,
            allowed_types: allowed_types.into(),
        }
    }

    #[tracing::instrument(
        skip(self, uploader, request),
        fields(company_id = %request.company_id, title = %request.title)
    )]
    pub async fn upload(
        &self,
        uploader: &Caller,
        request: UploadRequest,
    ) -> Result<UploadSummary, AppError> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }

        let company = self
            .stores
            .companies
            .find_company(request.company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        let outcome = self
            .storage
            .ingest(&company.name, &title, request.items, &self.allowed_types)
            .await?;

        let now = Utc::now();
        let report = Report {
            id: Uuid::new_v4(),
            title: title.clone(),
            description: request.description,
            company_id: company.id,
            status: ReportStatus::Published,
            tags: Vec::new(),
            main_file: outcome.entry_point,
            supporting_files: outcome.supporting_files,
            file_size: i64::try_from(outcome.total_size).unwrap_or(i64::MAX),
            view_count: 0,
            download_count: 0,
            allow_download: request.allow_download,
            uploaded_by: uploader.user_id,
            created_at: now,
            updated_at: now,
        };
        let report = self.stores.reports.insert_report(report).await?;
        let file_count = report.file_count();

        self.activity
            .record(
                NewActivity::new(
                    ActivityType::ReportUpload,
                    format!("Uploaded report: {} for company: {}", report.title, company.name),
                )
                .by(uploader.user_id, uploader.email.clone())
                .metadata(serde_json::json!({
                    "report_id": report.id,
                    "file_count": file_count,
                })),
            )
            .await;

        let notifications_sent = if request.notify_users {
            let recipients: Vec<Recipient> = self
                .stores
                .users
                .list_users(Some(company.id))
                .await?
                .into_iter()
                .filter(|u| u.active)
                .map(|u| Recipient {
                    email: u.email,
                    full_name: u.full_name,
                })
                .collect();
            let notice = ReportNotice {
                report_title: report.title.clone(),
                company_name: company.name.clone(),
            };
            self.notifier.notify_new_report(&recipients, &notice).await
        } else {
            0
        };

        tracing::info!(
            report_id = %report.id,
            files = file_count,
            size_bytes = outcome.total_size,
            notifications_sent,
            "Report uploaded"
        );

        Ok(UploadSummary {
            message: "Report uploaded successfully".to_string(),
            report_id: report.id,
            files_uploaded: file_count,
            total_size: format_file_size(outcome.total_size),
            notifications_sent,
        })
    }
}
