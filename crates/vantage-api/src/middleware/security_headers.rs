use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Security headers configuration
#[derive(Clone)]
pub struct SecurityHeadersConfig {
    pub is_production: bool,
    csp: HeaderValue,
}

impl SecurityHeadersConfig {
    pub fn new(is_production: bool) -> Self {
        Self {
            is_production,
            csp: HeaderValue::from_static(
                "default-src 'self'; img-src 'self' data: https:; \
                 font-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
            ),
        }
    }
}

/// Adds security headers to every response. Headers a handler has already
/// set are left untouched, so report pages can relax framing and caching.
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    let mut defaults: Vec<(&'static str, HeaderValue)> = vec![
        ("x-content-type-options", HeaderValue::from_static("nosniff")),
        ("x-frame-options", HeaderValue::from_static("DENY")),
        (
            "referrer-policy",
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        ("content-security-policy", config.csp.clone()),
        (
            "permissions-policy",
            HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
        ),
        ("cache-control", HeaderValue::from_static("no-store, private")),
    ];

    if config.is_production {
        defaults.push((
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ));
    }

    for (name, value) in defaults {
        let name = HeaderName::from_static(name);
        if !headers.contains_key(&name) {
            headers.insert(name, value);
        }
    }

    response
}
