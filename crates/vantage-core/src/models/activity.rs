use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Kind of audited activity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "activity_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Logout,
    ReportView,
    ReportDownload,
    ReportUpload,
    UserCreate,
    CompanyCreate,
    CompanyDelete,
    FailedLogin,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub activity_type: ActivityType,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Activity to be recorded
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub activity_type: ActivityType,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
}

impl NewActivity {
    pub fn new(activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            user_id: None,
            user_email: None,
            activity_type,
            description: description.into(),
            ip_address: None,
            user_agent: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn by(mut self, user_id: Uuid, email: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.user_email = Some(email.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn into_log(self) -> ActivityLog {
        ActivityLog {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            user_email: self.user_email,
            activity_type: self.activity_type,
            description: self.description,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            metadata: self.metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Filters for listing activity logs, newest first
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub activity_type: Option<ActivityType>,
    pub limit: Option<i64>,
}

impl ActivityFilter {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Admin dashboard statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_companies: i64,
    pub total_users: i64,
    pub total_reports: i64,
    pub total_access_logs: i64,
    pub recent_activities: Vec<ActivityLog>,
}
