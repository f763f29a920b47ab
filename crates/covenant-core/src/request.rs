//! The immutable, canonical view of one inbound request.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::net::IpAddr;

/// A JSON object.
pub type JsonMap = Map<String, Value>;

/// Placeholder for an absent method, root or resource.
pub const UNKNOWN: &str = "__unknown__";

/// A decoded bearer credential.
///
/// `signed_document` is the first two token segments exactly as received,
/// joined by `.`; signatures are verified against these bytes, never against a
/// re-serialization of the claims.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credential {
    header: JsonMap,
    payload: JsonMap,
    signature: String,
    signed_document: String,
}

impl Credential {
    /// Creates a credential from its decoded parts.
    #[must_use]
    pub fn new(
        header: JsonMap,
        payload: JsonMap,
        signed_document: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            header,
            payload,
            signature: signature.into(),
            signed_document: signed_document.into(),
        }
    }

    /// Returns the JWT header claims.
    #[must_use]
    pub const fn header(&self) -> &JsonMap {
        &self.header
    }

    /// Returns the JWT payload claims.
    #[must_use]
    pub const fn payload(&self) -> &JsonMap {
        &self.payload
    }

    /// Returns the raw signature segment.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns `headerSegment.payloadSegment` as received.
    #[must_use]
    pub fn signed_document(&self) -> &str {
        &self.signed_document
    }

    /// Returns the payload `iss` claim, or an empty string.
    #[must_use]
    pub fn issuer(&self) -> &str {
        self.payload
            .get("iss")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Canonical request value threaded through every pipeline stage.
///
/// Built once at the transport boundary with the consuming `with_*` methods
/// and never mutated afterwards. Header names are stored lower-cased.
///
/// # Example
///
/// ```
/// use covenant_core::CanonicalRequest;
/// use serde_json::json;
///
/// let mut headers = serde_json::Map::new();
/// headers.insert("X-Api-Version".into(), json!("2"));
///
/// let request = CanonicalRequest::new("GET", "users", "42").with_headers(headers);
/// assert_eq!(request.method(), "get");
/// assert_eq!(request.header("x-api-version"), Some(&json!("2")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRequest {
    method: String,
    root: String,
    resource: String,
    headers: JsonMap,
    body: JsonMap,
    query: IndexMap<String, String>,
    credential: Credential,
    source_ip: Option<IpAddr>,
    secure: bool,
}

impl CanonicalRequest {
    /// Creates a request for the given route. Empty parts become [`UNKNOWN`].
    #[must_use]
    pub fn new(method: &str, root: &str, resource: &str) -> Self {
        let or_unknown = |part: &str| {
            if part.is_empty() {
                UNKNOWN.to_string()
            } else {
                part.to_string()
            }
        };
        Self {
            method: or_unknown(&method.to_ascii_lowercase()),
            root: or_unknown(root),
            resource: or_unknown(resource),
            headers: JsonMap::new(),
            body: JsonMap::new(),
            query: IndexMap::new(),
            credential: Credential::default(),
            source_ip: None,
            secure: false,
        }
    }

    /// Sets the headers. Names are lower-cased.
    #[must_use]
    pub fn with_headers(mut self, headers: JsonMap) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        self
    }

    /// Sets the body mapping.
    #[must_use]
    pub fn with_body(mut self, body: JsonMap) -> Self {
        self.body = body;
        self
    }

    /// Sets the parsed query string.
    #[must_use]
    pub fn with_query(mut self, query: IndexMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Sets the decoded credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Sets the client address.
    #[must_use]
    pub fn with_source_ip(mut self, ip: IpAddr) -> Self {
        self.source_ip = Some(ip);
        self
    }

    /// Sets the transport-security flag.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns the lower-cased method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the route root (first path segment).
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the resource (remaining path segments).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns all headers.
    #[must_use]
    pub const fn headers(&self) -> &JsonMap {
        &self.headers
    }

    /// Looks up a header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    /// Returns the body mapping.
    #[must_use]
    pub const fn body(&self) -> &JsonMap {
        &self.body
    }

    /// Returns the query parameters.
    #[must_use]
    pub const fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// Returns the decoded credential.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns the client IP, if known.
    #[must_use]
    pub const fn source_ip(&self) -> Option<IpAddr> {
        self.source_ip
    }

    /// Returns whether the request arrived over TLS.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_parts_become_sentinel() {
        let request = CanonicalRequest::new("", "", "");
        assert_eq!(request.method(), UNKNOWN);
        assert_eq!(request.root(), UNKNOWN);
        assert_eq!(request.resource(), UNKNOWN);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = JsonMap::new();
        headers.insert("Content-Type".into(), json!("application/json"));
        let request = CanonicalRequest::new("post", "orders", "new").with_headers(headers);

        assert!(request.headers().contains_key("content-type"));
        assert_eq!(request.header("CONTENT-TYPE"), Some(&json!("application/json")));
    }

    #[test]
    fn test_credential_issuer() {
        let mut payload = JsonMap::new();
        payload.insert("iss".into(), json!("svcA"));
        let cred = Credential::new(JsonMap::new(), payload, "a.b", "sig");
        assert_eq!(cred.issuer(), "svcA");
        assert_eq!(Credential::default().issuer(), "");
    }
}
