//! First-run seeding of the administrator account

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;
use vantage_core::models::{Company, User, UserRole};

use crate::auth::password::hash_password;
use crate::state::AppState;

/// Make sure the admin company and admin user exist.
///
/// Does nothing when `ADMIN_PASSWORD` is unset. An existing admin account is
/// left untouched, including its password.
pub async fn ensure_admin(state: &AppState) -> Result<()> {
    let Some(password) = state.config.admin_password() else {
        tracing::debug!("ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };

    let stores = &state.stores;
    let company_name = state.config.admin_company_name();
    let company = match stores.companies.find_company_by_name(company_name).await? {
        Some(company) => company,
        None => {
            let company = stores
                .companies
                .insert_company(Company::new(
                    company_name.to_string(),
                    Some("Portal administrators".to_string()),
                ))
                .await
                .context("Failed to create admin company")?;
            tracing::info!(company_id = %company.id, name = %company.name, "Created admin company");
            company
        }
    };

    let email = state.config.admin_email().trim().to_lowercase();
    if stores.users.find_user_by_email(&email).await?.is_some() {
        tracing::debug!(email = %email, "Admin user already exists");
        return Ok(());
    }

    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4(),
        email,
        full_name: "Administrator".to_string(),
        company_id: company.id,
        role: UserRole::Admin,
        active: true,
        password_hash: hash_password(password)?,
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    let admin = stores
        .users
        .insert_user(admin)
        .await
        .context("Failed to create admin user")?;
    tracing::info!(user_id = %admin.id, email = %admin.email, "Created admin user");

    Ok(())
}
