use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vantage_core::models::{Report, ReportUpdate};
use vantage_core::AppError;

use super::ReportStore;

pub(crate) const REPORT_COLUMNS: &str = "id, title, description, company_id, status, tags, main_file, supporting_files, file_size, view_count, download_count, allow_download, uploaded_by, created_at, updated_at";

/// PostgreSQL report repository
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    #[tracing::instrument(skip(self, report), fields(db.table = "reports", db.operation = "insert", db.record_id = %report.id))]
    async fn insert_report(&self, report: Report) -> Result<Report, AppError> {
        let query = format!(
            r#"
            INSERT INTO reports (id, title, description, company_id, status, tags, main_file,
                supporting_files, file_size, view_count, download_count, allow_download,
                uploaded_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        let report = sqlx::query_as::<Postgres, Report>(&query)
            .bind(report.id)
            .bind(&report.title)
            .bind(&report.description)
            .bind(report.company_id)
            .bind(report.status)
            .bind(&report.tags)
            .bind(&report.main_file)
            .bind(&report.supporting_files)
            .bind(report.file_size)
            .bind(report.view_count)
            .bind(report.download_count)
            .bind(report.allow_download)
            .bind(report.uploaded_by)
            .bind(report.created_at)
            .bind(report.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to insert report");
                AppError::Database(e)
            })?;

        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(db.table = "reports", db.operation = "select", db.record_id = %id))]
    async fn find_report(&self, id: Uuid) -> Result<Option<Report>, AppError> {
        let query = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
        let report = sqlx::query_as::<Postgres, Report>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(db.table = "reports", db.operation = "select"))]
    async fn list_reports(
        &self,
        company_id: Option<Uuid>,
        published_only: bool,
    ) -> Result<Vec<Report>, AppError> {
        let query = format!(
            r#"
            SELECT {} FROM reports
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND (NOT $2 OR status = 'published')
            ORDER BY created_at DESC
            "#,
            REPORT_COLUMNS
        );
        let reports = sqlx::query_as::<Postgres, Report>(&query)
            .bind(company_id)
            .bind(published_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(reports)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "reports", db.operation = "update", db.record_id = %id))]
    async fn update_report(
        &self,
        id: Uuid,
        update: &ReportUpdate,
    ) -> Result<Option<Report>, AppError> {
        let query = format!(
            r#"
            UPDATE reports SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                tags = COALESCE($5, tags),
                allow_download = COALESCE($6, allow_download),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<Postgres, Report>(&query)
            .bind(id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.status)
            .bind(&update.tags)
            .bind(update.allow_download)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(db.table = "reports", db.operation = "update", db.record_id = %id))]
    async fn increment_view_count(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE reports SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.table = "reports", db.operation = "update", db.record_id = %id))]
    async fn increment_download_count(&self, id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE reports SET download_count = download_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.table = "reports", db.operation = "count"))]
    async fn count_reports(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
