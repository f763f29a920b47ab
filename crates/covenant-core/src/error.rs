//! Failure taxonomy for the gateway.
//!
//! Every stage of the pipeline returns [`GatewayResult`]. A [`GatewayError`]
//! carries an [`ErrorKind`] that fixes the HTTP status code and the public
//! message, plus an internal message that is enriched with context as the
//! error unwinds. The kind never changes once the error is raised.
//!
//! | `ErrorKind` | Status | Public message |
//! |---|---|---|
//! | `BadRequest` | 400 | `bad request` |
//! | `Unauthorized` | 401 | `access denied` |
//! | `Forbidden` | 403 | `access denied` |
//! | `NotFound` | 404 | `not found` |
//! | `MethodNotAllowed` | 405 | `method not allowed` |
//! | `InternalError` | 500 | `server error` |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias using [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Kinds of failure the gateway can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, missing required field or failed rule.
    BadRequest,
    /// Missing, invalid, expired or unsigned credential.
    Unauthorized,
    /// Reserved for authorization-scope denials.
    Forbidden,
    /// Unknown route root or resource.
    NotFound,
    /// Method not present in the manifest.
    MethodNotAllowed,
    /// Manifest or contract missing or corrupt, internal transport failure.
    InternalError,
}

impl ErrorKind {
    /// Returns the HTTP status code bound to this kind.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the static message that is safe to show to clients.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized | Self::Forbidden => "access denied",
            Self::NotFound => "not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::InternalError => "server error",
        }
    }

    /// Returns a machine-readable code for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error type for the gateway.
///
/// The constructors are `#[track_caller]`, so [`location`](Self::location)
/// points at the line that raised the failure rather than at this module.
///
/// # Example
///
/// ```
/// use covenant_core::{ErrorKind, GatewayError};
///
/// let err = GatewayError::bad_request("'amount' must be integer")
///     .context("failed to validate request");
///
/// assert_eq!(err.kind(), ErrorKind::BadRequest);
/// assert_eq!(err.status_code().as_u16(), 400);
/// assert_eq!(err.message(), "failed to validate request: 'amount' must be integer");
/// ```
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    kind: ErrorKind,
    message: String,
    location: &'static Location<'static>,
    stack: Arc<Backtrace>,
}

impl GatewayError {
    /// Creates an error of the given kind.
    #[must_use]
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: Location::caller(),
            stack: Arc::new(Backtrace::capture()),
        }
    }

    /// Creates a `BadRequest` error.
    #[must_use]
    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Creates an `Unauthorized` error.
    #[must_use]
    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Creates a `Forbidden` error.
    #[must_use]
    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Creates a `NotFound` error.
    #[must_use]
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a `MethodNotAllowed` error.
    #[must_use]
    #[track_caller]
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    /// Creates an `InternalError`.
    #[must_use]
    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Prefixes the internal message, keeping the kind and origin.
    #[must_use]
    pub fn context(mut self, prefix: impl fmt::Display) -> Self {
        self.message = format!("{prefix}: {}", self.message);
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Returns the internal diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source location that raised this error.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Returns the call stack captured when the error was raised.
    ///
    /// Capture follows `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`; when disabled
    /// the backtrace is empty.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.stack
    }

    /// Converts this error to a response body.
    ///
    /// With `expose_internal` set, the internal message is included under
    /// `server`; otherwise only the public message is emitted.
    #[must_use]
    pub fn to_envelope(&self, expose_internal: bool) -> ErrorEnvelope {
        let client = ClientError {
            error: self.kind.public_message().to_string(),
        };
        if expose_internal {
            ErrorEnvelope::Debug {
                client,
                server: self.message.clone(),
            }
        } else {
            ErrorEnvelope::Public(client)
        }
    }
}

/// Public part of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientError {
    /// Public message for the failure kind.
    pub error: String,
}

/// Serializable error body for HTTP responses.
///
/// Serializes as `{"error": "..."}` or, in debug mode,
/// `{"client": {"error": "..."}, "server": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorEnvelope {
    /// Debug body including the internal message.
    Debug {
        /// What a client would normally see.
        client: ClientError,
        /// Internal diagnostic message.
        server: String,
    },
    /// Public body.
    Public(ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ErrorKind::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_messages_hide_details() {
        let err = GatewayError::unauthorized("signature mismatch for issuer svcA");
        assert_eq!(err.kind().public_message(), "access denied");
        let body = serde_json::to_value(err.to_envelope(false)).unwrap();
        assert_eq!(body, serde_json::json!({"error": "access denied"}));
    }

    #[test]
    fn test_debug_envelope_includes_internal_message() {
        let err = GatewayError::not_found("root not found");
        let body = serde_json::to_value(err.to_envelope(true)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "client": {"error": "not found"},
                "server": "root not found"
            })
        );
    }

    #[test]
    fn test_context_preserves_kind() {
        let err = GatewayError::method_not_allowed("method not allowed")
            .context("failed to resolve contract")
            .context("failed to validate request");
        assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
        assert_eq!(
            err.message(),
            "failed to validate request: failed to resolve contract: method not allowed"
        );
    }

    #[test]
    fn test_location_points_at_caller() {
        let err = GatewayError::internal("boom");
        assert!(err.location().file().ends_with("error.rs"));
        assert!(err.location().line() > 0);
    }

    #[test]
    fn test_display_includes_kind() {
        let err = GatewayError::bad_request("header x-api-key is missing");
        assert_eq!(err.to_string(), "BAD_REQUEST: header x-api-key is missing");
    }
}
