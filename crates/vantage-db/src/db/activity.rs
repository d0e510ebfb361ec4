use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use vantage_core::models::{ActivityFilter, ActivityLog};
use vantage_core::AppError;

use super::ActivityStore;

const ACTIVITY_COLUMNS: &str =
    "id, user_id, user_email, activity_type, description, ip_address, user_agent, metadata, timestamp";

/// PostgreSQL activity log repository
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    #[tracing::instrument(skip(self, activity), fields(db.table = "activity_logs", db.operation = "insert"))]
    async fn insert_activity(&self, activity: ActivityLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, user_id, user_email, activity_type, description,
                ip_address, user_agent, metadata, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(activity.id)
        .bind(activity.user_id)
        .bind(&activity.user_email)
        .bind(activity.activity_type)
        .bind(&activity.description)
        .bind(&activity.ip_address)
        .bind(&activity.user_agent)
        .bind(&activity.metadata)
        .bind(activity.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "activity_logs", db.operation = "select"))]
    async fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>, AppError> {
        let query = format!(
            r#"
            SELECT {} FROM activity_logs
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::activity_type IS NULL OR activity_type = $2)
            ORDER BY timestamp DESC
            LIMIT $3
            "#,
            ACTIVITY_COLUMNS
        );
        let logs = sqlx::query_as::<Postgres, ActivityLog>(&query)
            .bind(filter.user_id)
            .bind(filter.activity_type)
            .bind(filter.effective_limit())
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }

    #[tracing::instrument(skip(self), fields(db.table = "activity_logs", db.operation = "count"))]
    async fn count_activities(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
