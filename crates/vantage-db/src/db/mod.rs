//! Store traits and their implementations
//
// Store boundary
pub mod traits;
//
// PostgreSQL repositories
pub mod activity;
pub mod company;
pub mod report;
pub mod user;
//
// In-memory store
pub mod memory;
//
// Transaction utilities
pub mod transaction;

use std::sync::Arc;

use sqlx::PgPool;

pub use activity::ActivityRepository;
pub use company::CompanyRepository;
pub use memory::MemoryStore;
pub use report::ReportRepository;
pub use traits::{ActivityStore, CompanyStore, ReportStore, UserStore};
pub use user::UserRepository;

/// The four stores the services depend on
#[derive(Clone)]
pub struct Stores {
    pub companies: Arc<dyn CompanyStore>,
    pub users: Arc<dyn UserStore>,
    pub reports: Arc<dyn ReportStore>,
    pub activities: Arc<dyn ActivityStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            companies: Arc::new(CompanyRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            reports: Arc::new(ReportRepository::new(pool.clone())),
            activities: Arc::new(ActivityRepository::new(pool)),
        }
    }

    /// All four stores backed by one shared in-memory state
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            companies: store.clone(),
            users: store.clone(),
            reports: store.clone(),
            activities: store,
        }
    }
}

/// Map a unique-constraint violation to a client error, anything else to a
/// database error.
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> vantage_core::AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            vantage_core::AppError::BadRequest(message.to_string())
        }
        _ => {
            tracing::error!(error = %err, "Database write failed");
            vantage_core::AppError::Database(err)
        }
    }
}
