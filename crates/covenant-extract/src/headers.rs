//! Header collection and forwarded-TLS detection.

use covenant_core::{GatewayError, GatewayResult, JsonMap};
use http::HeaderMap;
use serde_json::Value;

/// Authorization header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Protocol the client used, as reported by a TLS-terminating proxy.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// `on` when a TLS-terminating proxy handled the connection.
pub const FORWARDED_SSL_HEADER: &str = "x-forwarded-ssl";

/// Collects headers into a JSON mapping with lower-cased names.
///
/// Repeated headers are joined with `, `. A value that is not UTF-8 is
/// rejected.
pub fn collect(headers: &HeaderMap) -> GatewayResult<JsonMap> {
    let mut collected = JsonMap::new();
    for name in headers.keys() {
        let mut values = Vec::new();
        for value in headers.get_all(name) {
            let text = std::str::from_utf8(value.as_bytes()).map_err(|_| {
                GatewayError::bad_request(format!("header {name} is not valid UTF-8"))
            })?;
            values.push(text);
        }
        collected.insert(name.as_str().to_string(), Value::String(values.join(", ")));
    }
    Ok(collected)
}

/// Returns whether a proxy reports that the client connected over TLS.
#[must_use]
pub fn forwarded_tls(headers: &HeaderMap) -> bool {
    let equals = |name: &str, expected: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(expected))
    };
    equals(FORWARDED_PROTO_HEADER, "https") || equals(FORWARDED_SSL_HEADER, "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_collect_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("Accept", HeaderValue::from_static("text/plain"));
        headers.append("Accept", HeaderValue::from_static("application/json"));
        headers.insert("X-Api-Version", HeaderValue::from_static("2"));

        let collected = collect(&headers).unwrap();
        assert_eq!(collected["accept"], "text/plain, application/json");
        assert_eq!(collected["x-api-version"], "2");
    }

    #[test]
    fn test_collect_rejects_invalid_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert("x-name", HeaderValue::from_bytes(b"\xff\xfe").unwrap());
        let err = collect(&headers).unwrap_err();
        assert!(err.message().contains("x-name"));
    }

    #[test]
    fn test_forwarded_tls() {
        let mut headers = HeaderMap::new();
        assert!(!forwarded_tls(&headers));

        headers.insert(FORWARDED_PROTO_HEADER, HeaderValue::from_static("HTTPS"));
        assert!(forwarded_tls(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_SSL_HEADER, HeaderValue::from_static("on"));
        assert!(forwarded_tls(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_PROTO_HEADER, HeaderValue::from_static("http"));
        assert!(!forwarded_tls(&headers));
    }
}
