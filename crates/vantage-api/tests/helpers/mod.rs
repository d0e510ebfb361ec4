//! Test helpers: build AppState and router for integration tests.
//!
//! Every test app runs on the in-memory store with its own temporary upload
//! root, so tests are independent and need no database.

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use vantage_api::constants;
use vantage_api::setup::{bootstrap, routes, services};
use vantage_api::state::AppState;
use vantage_core::validation::DEFAULT_ALLOWED_FILE_TYPES;
use vantage_core::{BaseConfig, Config, PortalConfig, StoreBackend};
use vantage_db::Stores;

pub const ADMIN_EMAIL: &str = "admin@vantage.test";
pub const ADMIN_PASSWORD: &str = "admin-password-123";

/// API path prefix for tests (`/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub admin_token: String,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_root(&self) -> PathBuf {
        self._temp_dir.path().join("uploads")
    }
}

pub fn test_config(upload_dir: PathBuf) -> Config {
    Config(Box::new(PortalConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 5,
            jwt_secret: "test-secret-that-is-at-least-32-characters".to_string(),
            jwt_expiry_hours: 1,
            environment: "test".to_string(),
            trusted_proxy_count: 0,
            log_format: "text".to_string(),
        },
        store_backend: StoreBackend::Memory,
        database_url: None,
        upload_dir,
        max_upload_size_bytes: 10 * 1024 * 1024,
        allowed_file_types: DEFAULT_ALLOWED_FILE_TYPES
            .iter()
            .map(|s| s.to_string())
            .chain(["css".to_string(), "js".to_string()])
            .collect(),
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        admin_company_name: "Administration".to_string(),
        email_notifications_enabled: false,
        smtp_host: None,
        smtp_port: None,
        smtp_user: None,
        smtp_password: None,
        smtp_from: None,
        smtp_tls: true,
        portal_url: None,
    }))
}

/// Setup a test app with a bootstrapped admin already logged in.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(temp_dir.path().join("uploads"));

    let state = services::initialize_services(&config, Stores::in_memory())
        .await
        .expect("Failed to initialize services");
    bootstrap::ensure_admin(&state)
        .await
        .expect("Failed to bootstrap admin");

    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    let admin_token = auth::login(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    TestApp {
        server,
        state,
        admin_token,
        _temp_dir: temp_dir,
    }
}
