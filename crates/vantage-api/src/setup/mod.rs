//! Application setup and initialization

pub mod bootstrap;
pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vantage_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_json())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let stores = services::setup_stores(&config).await?;
    let state = services::initialize_services(&config, stores).await?;
    bootstrap::ensure_admin(&state).await?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
