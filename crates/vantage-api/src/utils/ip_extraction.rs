//! Client address extraction for the activity log.
//!
//! Forwarding headers are only honoured when `TRUSTED_PROXY_COUNT` is above
//! zero; otherwise the socket address is used.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use vantage_services::ClientContext;

use crate::error::HttpAppError;
use crate::state::AppState;

/// Client address and user agent of the current request
#[derive(Debug, Clone, Default)]
pub struct RequestClient(pub ClientContext);

impl FromRequestParts<Arc<AppState>> for RequestClient {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        Ok(RequestClient(ClientContext {
            ip_address: extract_client_ip(
                &parts.headers,
                socket.as_ref(),
                state.config.trusted_proxy_count(),
            ),
            user_agent,
        }))
    }
}

/// Client IP from `X-Forwarded-For` / `X-Real-IP` behind trusted proxies,
/// falling back to the socket address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> Option<String> {
    if trusted_proxy_count > 0 {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| from_forwarded_for(v, trusted_proxy_count));
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| is_valid_ip(ip));
        if let Some(ip) = real_ip {
            return Some(ip.to_string());
        }
    }

    socket_addr.map(|addr| addr.ip().to_string())
}

/// Each trusted proxy appends the address it received the request from, so
/// the client is the `trusted_proxy_count`-th entry from the right.
fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let index = ips.len().saturating_sub(trusted_proxy_count);
    ips.get(index)
        .filter(|ip| is_valid_ip(ip))
        .map(|ip| ip.to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_xff(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_forwarded_for_with_one_proxy() {
        assert_eq!(
            from_forwarded_for("203.0.113.7, 192.168.1.1", 1).as_deref(),
            Some("192.168.1.1")
        );
        assert_eq!(
            from_forwarded_for("203.0.113.7, 192.168.1.1", 2).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn test_short_chain_uses_leftmost() {
        assert_eq!(
            from_forwarded_for("192.168.1.1", 3).as_deref(),
            Some("192.168.1.1")
        );
    }

    #[test]
    fn test_invalid_entry_rejected() {
        assert_eq!(from_forwarded_for("not.an.ip", 1), None);
    }

    #[test]
    fn test_headers_ignored_without_trusted_proxies() {
        let headers = headers_with_xff("203.0.113.7");
        let socket = SocketAddr::from(([127, 0, 0, 1], 8080));
        assert_eq!(
            extract_client_ip(&headers, Some(&socket), 0).as_deref(),
            Some("127.0.0.1")
        );
        assert_eq!(extract_client_ip(&headers, None, 0), None);
        assert_eq!(
            extract_client_ip(&headers, Some(&socket), 1).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 10.1.2.3 "));
        assert_eq!(extract_client_ip(&headers, None, 1).as_deref(), Some("10.1.2.3"));
    }
}
