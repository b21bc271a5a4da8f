//! Hop-by-hop header hygiene
//!
//! Headers that only describe a single transport leg must not be relayed
//! across the proxy. `content-length` and `content-encoding` are dropped too:
//! the body may be rewritten, so the inbound framing no longer describes it.

use axum::http::HeaderMap;

/// Headers never forwarded upstream (compared case-insensitively)
pub(crate) const DROPPED_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "content-encoding",
];

/// Check if a header name belongs to the drop set
pub(crate) fn is_dropped_header(name: &str) -> bool {
    DROPPED_HEADERS
        .iter()
        .any(|dropped| name.eq_ignore_ascii_case(dropped))
}

/// Return a copy of `headers` without hop-by-hop and framing headers
pub(crate) fn sanitize_headers(headers: &HeaderMap) -> HeaderMap {
    let mut sanitized = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_dropped_header(name.as_str()) {
            continue;
        }
        sanitized.append(name.clone(), value.clone());
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers_of(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_drops_every_member_of_the_drop_set() {
        let pairs: Vec<(&str, &str)> = DROPPED_HEADERS.iter().map(|h| (*h, "x")).collect();
        let sanitized = sanitize_headers(&headers_of(&pairs));

        assert!(sanitized.is_empty(), "left over: {:?}", sanitized);
    }

    #[test]
    fn test_keeps_end_to_end_headers() {
        let headers = headers_of(&[
            ("content-type", "application/json"),
            ("authorization", "Bearer abc"),
            ("user-agent", "ollama-js/0.5"),
            ("host", "proxy:8080"),
            ("content-length", "42"),
        ]);

        let sanitized = sanitize_headers(&headers);

        assert_eq!(sanitized.len(), 3);
        assert_eq!(sanitized["content-type"], "application/json");
        assert_eq!(sanitized["authorization"], "Bearer abc");
        assert!(sanitized.get("host").is_none());
        assert!(sanitized.get("content-length").is_none());
    }

    #[test]
    fn test_name_matching_is_case_insensitive() {
        assert!(is_dropped_header("Transfer-Encoding"));
        assert!(is_dropped_header("KEEP-ALIVE"));
        assert!(is_dropped_header("Content-Encoding"));
        assert!(!is_dropped_header("content-type"));
        assert!(!is_dropped_header("tea"));
    }

    #[test]
    fn test_does_not_touch_the_input() {
        let headers = headers_of(&[("connection", "close"), ("accept", "*/*")]);
        let _ = sanitize_headers(&headers);

        assert_eq!(headers.len(), 2);
    }
}
