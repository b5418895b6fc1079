//! Client identification for rate limiting.

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Bucket shared by every request that carries no usable forwarded address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// First hop of `X-Forwarded-For`, or [`UNKNOWN_CLIENT`].
///
/// Only meaningful behind a proxy that sets the header; without one all
/// clients share a single bucket.
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().unwrap());
        headers
    }

    #[test]
    fn test_first_hop_wins() {
        assert_eq!(
            client_identifier(&headers("203.0.113.7, 10.0.0.1, 10.0.0.2")),
            "203.0.113.7"
        );
        assert_eq!(client_identifier(&headers(" 2001:db8::1 ")), "2001:db8::1");
    }

    #[test]
    fn test_sentinel_fallback() {
        assert_eq!(client_identifier(&HeaderMap::new()), UNKNOWN_CLIENT);
        assert_eq!(client_identifier(&headers("not-an-ip")), UNKNOWN_CLIENT);
        assert_eq!(client_identifier(&headers("")), UNKNOWN_CLIENT);
    }
}
