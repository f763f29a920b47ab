//! Outbound calls to other contract-guarded services.
//!
//! A [`Caller`] signs its own bearer token with the service's `[ident]`
//! issuer, so the callee's gateway can authenticate it like any other client.
//!
//! # Example
//!
//! ```rust,ignore
//! use covenant_server::Caller;
//!
//! let caller = Caller::new(sentinel.codec().clone());
//! let response = caller
//!     .call_signed("post", "http://billing/orders/new", &[], claims, Some(&body))
//!     .await?;
//! assert!(response.status().is_success());
//! ```

use std::sync::Arc;

use covenant_core::{Credential, JsonMap};
use covenant_token::{split_token, TokenCodec, TokenError};
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors raised by outbound calls.
#[derive(Debug, Error)]
pub enum CallerError {
    /// The method is not a valid HTTP method.
    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A token could not be issued or parsed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// The response body is not JSON.
    #[error("response body is not JSON: {0}")]
    Body(#[from] serde_json::Error),
}

/// A completed outbound call.
#[derive(Debug, Clone)]
pub struct CallResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl CallResponse {
    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// JSON body, `Null` when the body was empty.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Splits the token carried in `header`, if present.
    ///
    /// A `Bearer ` prefix is stripped first.
    pub fn bearer_credential(&self, header: &str) -> Result<Option<Credential>, CallerError> {
        let Some(value) = self.headers.get(header).and_then(|v| v.to_str().ok()) else {
            return Ok(None);
        };
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        Ok(Some(split_token(token)?))
    }
}

/// HTTP client that authenticates as this service.
#[derive(Debug, Clone)]
pub struct Caller {
    client: reqwest::Client,
    codec: Arc<TokenCodec>,
}

impl Caller {
    /// Creates a caller with a default client.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            client: reqwest::Client::new(),
            codec,
        }
    }

    /// Uses a preconfigured client (timeouts, proxies, TLS).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Issues a token for `claims` as this service and performs the call.
    pub async fn call_signed(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        claims: JsonMap,
        body: Option<&Value>,
    ) -> Result<CallResponse, CallerError> {
        let token = self.codec.issue_own_token(claims)?;
        self.call(method, url, headers, Some(&token), body).await
    }

    /// Performs one call with an optional bearer token and JSON body.
    pub async fn call(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<CallResponse, CallerError> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| CallerError::InvalidMethod(method.to_string()))?;

        let mut request = self.client.request(method.clone(), url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        debug!(%method, url, status = status.as_u16(), "outbound call completed");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(CallResponse {
            status,
            headers,
            body,
        })
    }
}
