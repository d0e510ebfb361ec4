//! Activity logging.
//!
//! Activity entries are an audit trail; a failure to write one is logged and
//! never fails the request that produced it.

use std::sync::Arc;

use vantage_core::models::NewActivity;
use vantage_db::ActivityStore;

#[derive(Clone)]
pub struct ActivityLogger {
    store: Arc<dyn ActivityStore>,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Write the entry before returning
    pub async fn record(&self, activity: NewActivity) {
        let activity_type = activity.activity_type;
        if let Err(e) = self.store.insert_activity(activity.into_log()).await {
            tracing::warn!(
                error = %e,
                activity_type = ?activity_type,
                "Failed to record activity"
            );
        }
    }

    /// Write the entry in the background
    pub fn log(&self, activity: NewActivity) {
        let logger = self.clone();
        tokio::spawn(async move {
            logger.record(activity).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::models::{ActivityFilter, ActivityType};
    use vantage_db::Stores;

    #[tokio::test]
    async fn test_record_persists_entry() {
        let stores = Stores::in_memory();
        let logger = ActivityLogger::new(stores.activities.clone());

        logger
            .record(
                NewActivity::new(ActivityType::Login, "User logged in")
                    .email("a@example.com")
                    .metadata(serde_json::json!({"source": "test"})),
            )
            .await;

        let entries = stores
            .activities
            .list_activities(&ActivityFilter::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].activity_type, ActivityType::Login);
        assert_eq!(entries[0].user_email.as_deref(), Some("a@example.com"));
    }
}
