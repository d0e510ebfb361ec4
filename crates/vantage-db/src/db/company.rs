use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vantage_core::models::{Company, CompanyDeletion, Report};
use vantage_core::AppError;

use super::report::REPORT_COLUMNS;
use super::transaction::TransactionGuard;
use super::{map_unique_violation, CompanyStore};

const COMPANY_COLUMNS: &str = "id, name, description, active, created_at, updated_at";

/// PostgreSQL company repository
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyStore for CompanyRepository {
    #[tracing::instrument(skip(self, company), fields(db.table = "companies", db.operation = "insert", company.name = %company.name))]
    async fn insert_company(&self, company: Company) -> Result<Company, AppError> {
        let query = format!(
            r#"
            INSERT INTO companies (id, name, description, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );

        sqlx::query_as::<Postgres, Company>(&query)
            .bind(company.id)
            .bind(&company.name)
            .bind(&company.description)
            .bind(company.active)
            .bind(company.created_at)
            .bind(company.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Company name already exists"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select", db.record_id = %id))]
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let query = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<Postgres, Company>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select"))]
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, AppError> {
        let query = format!("SELECT {} FROM companies WHERE name = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<Postgres, Company>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select"))]
    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let query = format!(
            "SELECT {} FROM companies ORDER BY created_at DESC",
            COMPANY_COLUMNS
        );
        let companies = sqlx::query_as::<Postgres, Company>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "count"))]
    async fn count_companies(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "delete", db.record_id = %id))]
    async fn delete_company_cascade(&self, id: Uuid) -> Result<Option<CompanyDeletion>, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "company_cascade_delete").await?;

        let query = format!(
            "SELECT {} FROM companies WHERE id = $1 FOR UPDATE",
            COMPANY_COLUMNS
        );
        let Some(company) = sqlx::query_as::<Postgres, Company>(&query)
            .bind(id)
            .fetch_optional(tx.executor()?)
            .await?
        else {
            tx.commit().await?;
            return Ok(None);
        };

        let users_deleted = sqlx::query("DELETE FROM users WHERE company_id = $1")
            .bind(id)
            .execute(tx.executor()?)
            .await?
            .rows_affected();

        let query = format!(
            "DELETE FROM reports WHERE company_id = $1 RETURNING {}",
            REPORT_COLUMNS
        );
        let reports = sqlx::query_as::<Postgres, Report>(&query)
            .bind(id)
            .fetch_all(tx.executor()?)
            .await?;

        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(tx.executor()?)
            .await?;

        tx.commit().await?;

        tracing::info!(
            company_id = %id,
            users_deleted,
            reports_deleted = reports.len(),
            "Company deleted with its users and reports"
        );

        Ok(Some(CompanyDeletion {
            company,
            users_deleted,
            reports,
        }))
    }
}
