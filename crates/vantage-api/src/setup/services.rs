//! Service wiring: stores, report storage, capabilities, notifier and JWT

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use vantage_core::{Config, StoreBackend, CAPABILITY_TOKEN_TTL_SECS};
use vantage_db::Stores;
use vantage_services::{
    ActivityLogger, AssetService, CapabilityStore, CompanyService, InMemoryCapabilityStore,
    IngestService, NoopNotifier, Notifier, SmtpNotifier,
};
use vantage_storage::ReportStorage;

use crate::auth::jwt::JwtService;
use crate::state::AppState;

/// Open the configured store backend
pub async fn setup_stores(config: &Config) -> Result<Stores> {
    match config.store_backend() {
        StoreBackend::Postgres => {
            let pool = super::database::setup_database(config).await?;
            Ok(Stores::postgres(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Ok(Stores::in_memory())
        }
    }
}

fn setup_notifier(config: &Config) -> Arc<dyn Notifier> {
    match SmtpNotifier::from_config(config) {
        Some(notifier) => {
            tracing::info!("Email notifications enabled");
            Arc::new(notifier)
        }
        None => Arc::new(NoopNotifier),
    }
}

/// Build the application state on top of already opened stores
pub async fn initialize_services(config: &Config, stores: Stores) -> Result<Arc<AppState>> {
    let storage = Arc::new(
        ReportStorage::new(config.upload_dir())
            .await
            .with_context(|| {
                format!(
                    "Failed to prepare upload directory {}",
                    config.upload_dir().display()
                )
            })?,
    );
    tracing::info!(upload_dir = %storage.root().display(), "Report storage ready");

    let capabilities: Arc<dyn CapabilityStore> = Arc::new(InMemoryCapabilityStore::new(
        Duration::from_secs(CAPABILITY_TOKEN_TTL_SECS),
    ));
    let activity = ActivityLogger::new(stores.activities.clone());

    let ingest = IngestService::new(
        stores.clone(),
        storage.clone(),
        activity.clone(),
        setup_notifier(config),
        config.allowed_file_types().to_vec(),
    );
    let assets = AssetService::new(
        stores.clone(),
        storage.clone(),
        capabilities,
        activity.clone(),
    );
    let companies = CompanyService::new(stores.clone(), storage.clone(), activity.clone());
    let jwt = JwtService::new(config.jwt_secret(), config.jwt_expiry_hours());

    Ok(Arc::new(AppState {
        config: config.clone(),
        stores,
        storage,
        jwt,
        activity,
        ingest,
        assets,
        companies,
    }))
}
