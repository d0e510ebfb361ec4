//! In-memory implementation of every store trait.
//!
//! All data lives behind one `std::sync::RwLock`; guards are never held
//! across an `.await`, and a cascade delete runs in a single write section.
//! Entries are kept in insertion order, so "newest first" is reverse order.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;
use vantage_core::models::{
    ActivityFilter, ActivityLog, Company, CompanyDeletion, Report, ReportUpdate, User,
};
use vantage_core::AppError;

use super::traits::{ActivityStore, CompanyStore, ReportStore, UserStore};

#[derive(Default)]
struct MemoryState {
    companies: Vec<Company>,
    users: Vec<User>,
    reports: Vec<Report>,
    activities: Vec<ActivityLog>,
}

/// Process-local store, used with `STORE_BACKEND=memory` and in tests
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn insert_company(&self, company: Company) -> Result<Company, AppError> {
        let mut state = self.write()?;
        if state.companies.iter().any(|c| c.name == company.name) {
            return Err(AppError::BadRequest("Company name already exists".to_string()));
        }
        state.companies.push(company.clone());
        Ok(company)
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.read()?.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, AppError> {
        Ok(self
            .read()?
            .companies
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        Ok(self.read()?.companies.iter().rev().cloned().collect())
    }

    async fn count_companies(&self) -> Result<i64, AppError> {
        Ok(self.read()?.companies.len() as i64)
    }

    async fn delete_company_cascade(&self, id: Uuid) -> Result<Option<CompanyDeletion>, AppError> {
        let mut state = self.write()?;
        let Some(index) = state.companies.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        let users_before = state.users.len();
        state.users.retain(|u| u.company_id != id);
        let users_deleted = (users_before - state.users.len()) as u64;

        let (reports, kept): (Vec<Report>, Vec<Report>) = std::mem::take(&mut state.reports)
            .into_iter()
            .partition(|r| r.company_id == id);
        state.reports = kept;

        let company = state.companies.remove(index);

        Ok(Some(CompanyDeletion {
            company,
            users_deleted,
            reports,
        }))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let mut state = self.write()?;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self, company_id: Option<Uuid>) -> Result<Vec<User>, AppError> {
        Ok(self
            .read()?
            .users
            .iter()
            .rev()
            .filter(|u| company_id.map_or(true, |c| u.company_id == c))
            .cloned()
            .collect())
    }

    async fn record_login(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.write()?;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        Ok(self.read()?.users.len() as i64)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_report(&self, report: Report) -> Result<Report, AppError> {
        self.write()?.reports.push(report.clone());
        Ok(report)
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<Report>, AppError> {
        Ok(self.read()?.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reports(
        &self,
        company_id: Option<Uuid>,
        published_only: bool,
    ) -> Result<Vec<Report>, AppError> {
        Ok(self
            .read()?
            .reports
            .iter()
            .rev()
            .filter(|r| company_id.map_or(true, |c| r.company_id == c))
            .filter(|r| !published_only || r.is_published())
            .cloned()
            .collect())
    }

    async fn update_report(
        &self,
        id: Uuid,
        update: &ReportUpdate,
    ) -> Result<Option<Report>, AppError> {
        let mut state = self.write()?;
        Ok(state.reports.iter_mut().find(|r| r.id == id).map(|report| {
            update.apply_to(report);
            report.clone()
        }))
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.write()?;
        Ok(match state.reports.iter_mut().find(|r| r.id == id) {
            Some(report) => {
                report.view_count += 1;
                true
            }
            None => false,
        })
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.write()?;
        Ok(match state.reports.iter_mut().find(|r| r.id == id) {
            Some(report) => {
                report.download_count += 1;
                true
            }
            None => false,
        })
    }

    async fn count_reports(&self) -> Result<i64, AppError> {
        Ok(self.read()?.reports.len() as i64)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn insert_activity(&self, activity: ActivityLog) -> Result<(), AppError> {
        self.write()?.activities.push(activity);
        Ok(())
    }

    async fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>, AppError> {
        let limit = filter.effective_limit() as usize;
        Ok(self
            .read()?
            .activities
            .iter()
            .rev()
            .filter(|a| filter.user_id.map_or(true, |u| a.user_id == Some(u)))
            .filter(|a| filter.activity_type.map_or(true, |t| a.activity_type == t))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_activities(&self) -> Result<i64, AppError> {
        Ok(self.read()?.activities.len() as i64)
    }
}
