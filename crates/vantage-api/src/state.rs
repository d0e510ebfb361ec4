//! Application state shared by every handler

use std::sync::Arc;

use vantage_core::Config;
use vantage_db::Stores;
use vantage_services::{ActivityLogger, AssetService, CompanyService, IngestService};
use vantage_storage::ReportStorage;

use crate::auth::jwt::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub storage: Arc<ReportStorage>,
    pub jwt: JwtService,
    pub activity: ActivityLogger,
    pub ingest: IngestService,
    pub assets: AssetService,
    pub companies: CompanyService,
}
