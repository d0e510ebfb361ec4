use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vantage_core::models::User;
use vantage_core::AppError;

use super::{map_unique_violation, UserStore};

const USER_COLUMNS: &str = "id, email, full_name, company_id, role, active, password_hash, last_login, created_at, updated_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "insert", db.record_id = %user.id))]
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let query = format!(
            r#"
            INSERT INTO users (id, email, full_name, company_id, role, active, password_hash, last_login, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<Postgres, User>(&query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(user.company_id)
            .bind(user.role)
            .bind(user.active)
            .bind(&user.password_hash)
            .bind(user.last_login)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Email already registered"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<Postgres, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "select"))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<Postgres, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn list_users(&self, company_id: Option<Uuid>) -> Result<Vec<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY created_at DESC",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<Postgres, User>(&query)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn record_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "count"))]
    async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
