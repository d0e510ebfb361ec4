use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Report lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "report_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// An uploaded report bundle.
///
/// `main_file` and every entry of `supporting_files` are `/`-separated paths
/// relative to the upload root, all inside the report's own directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub company_id: Uuid,
    pub status: ReportStatus,
    pub tags: Vec<String>,
    pub main_file: String,
    pub supporting_files: Vec<String>,
    pub file_size: i64,
    pub view_count: i64,
    pub download_count: i64,
    pub allow_download: bool,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn is_published(&self) -> bool {
        self.status == ReportStatus::Published
    }

    /// Whether `path` is the entry point or one of the supporting files
    pub fn contains_file(&self, path: &str) -> bool {
        self.main_file == path || self.supporting_files.iter().any(|f| f == path)
    }

    /// Entry point and supporting files, skipping an empty entry point
    pub fn stored_files(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.main_file.as_str())
            .chain(self.supporting_files.iter().map(String::as_str))
            .filter(|p| !p.is_empty())
    }

    /// Number of files stored for this report
    pub fn file_count(&self) -> usize {
        let main = usize::from(!self.main_file.is_empty());
        main + self.supporting_files.len()
    }
}

/// Partial update applied by administrators
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct ReportUpdate {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<ReportStatus>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub allow_download: Option<bool>,
}

impl ReportUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.tags.is_none()
            && self.allow_download.is_none()
    }

    /// Apply the present fields to `report` and bump `updated_at`
    pub fn apply_to(&self, report: &mut Report) {
        if let Some(title) = &self.title {
            report.title = title.clone();
        }
        if let Some(description) = &self.description {
            report.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            report.status = status;
        }
        if let Some(tags) = &self.tags {
            report.tags = tags.clone();
        }
        if let Some(allow_download) = self.allow_download {
            report.allow_download = allow_download;
        }
        report.updated_at = Utc::now();
    }
}
