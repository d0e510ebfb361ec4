//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "vantage";

/// Number of activities shown on the admin dashboard
pub const DASHBOARD_RECENT_ACTIVITIES: i64 = 10;

/// Token type returned by the login endpoint
pub const TOKEN_TYPE: &str = "bearer";
