//! Rate limiter client identity derivation.
//!
//! Combines the caller's address, user agent, and API key into one
//! opaque string so that the token bucket map in `statsgate-ratelimiter`
//! is keyed by "who", not by request shape.

use std::net::SocketAddr;

use axum::http::HeaderMap;

const MAX_USER_AGENT_BYTES: usize = 50;
const MAX_API_KEY_BYTES: usize = 8;

pub fn derive(addr: SocketAddr, headers: &HeaderMap, api_key: Option<&str>) -> String {
    let ip = addr.ip().to_string();
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| truncate_bytes(ua, MAX_USER_AGENT_BYTES))
        .unwrap_or_default();
    let key_fragment = api_key
        .map(|k| truncate_bytes(k, MAX_API_KEY_BYTES))
        .unwrap_or_default();

    format!("{ip}|{user_agent}|{key_fragment}")
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    #[test]
    fn distinct_user_agents_produce_distinct_ids() {
        let mut a = HeaderMap::new();
        a.insert(axum::http::header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let mut b = HeaderMap::new();
        b.insert(axum::http::header::USER_AGENT, HeaderValue::from_static("curl/9.0"));
        assert_ne!(derive(addr(), &a, None), derive(addr(), &b, None));
    }

    #[test]
    fn long_user_agent_is_truncated() {
        let mut headers = HeaderMap::new();
        let long_ua = "x".repeat(500);
        headers.insert(
            axum::http::header::USER_AGENT,
            HeaderValue::from_str(&long_ua).unwrap(),
        );
        let id = derive(addr(), &headers, None);
        assert!(id.len() < 500);
    }

    #[test]
    fn missing_user_agent_does_not_panic() {
        let id = derive(addr(), &HeaderMap::new(), Some("secret-key"));
        assert!(id.contains("secr"));
    }
}
