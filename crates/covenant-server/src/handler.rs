//! Handlers for certified requests.
//!
//! A handler only ever sees a [`Certificate`]: the fields the contract
//! approved, never the raw request.
//!
//! # Example
//!
//! ```rust,ignore
//! use covenant_server::{HandlerResponse, Gateway};
//!
//! let gateway = gateway.with_handler(|_ctx, cert: Certificate| async move {
//!     let amount = cert.body()["amount"].as_i64().unwrap_or_default();
//!     Ok(HandlerResponse::ok(serde_json::json!({"charged": amount})))
//! });
//! ```

use std::future::Future;
use std::pin::Pin;

use covenant_core::{Certificate, GatewayResult, RequestContext};
use http::StatusCode;
use serde_json::Value;

/// Boxed future returned by [`CertifiedHandler::handle`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = GatewayResult<HandlerResponse>> + Send>>;

/// JSON response produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    status: StatusCode,
    body: Value,
}

impl HandlerResponse {
    /// A `200 OK` response.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Overrides the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the JSON body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }
}

/// Business logic run after a request is certified.
pub trait CertifiedHandler: Send + Sync + 'static {
    /// Handles one certified request.
    fn handle(&self, ctx: RequestContext, certificate: Certificate) -> HandlerFuture;
}

impl<F, Fut> CertifiedHandler for F
where
    F: Fn(RequestContext, Certificate) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GatewayResult<HandlerResponse>> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext, certificate: Certificate) -> HandlerFuture {
        Box::pin(self(ctx, certificate))
    }
}

/// Default handler: answers with the contract's `Response` member.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResponse;

impl CertifiedHandler for EchoResponse {
    fn handle(&self, _ctx: RequestContext, certificate: Certificate) -> HandlerFuture {
        let body = certificate.response().clone();
        Box::pin(async move { Ok(HandlerResponse::ok(body)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{CanonicalRequest, ContractDocument, GatewayError, JsonMap};
    use serde_json::json;

    fn certificate() -> Certificate {
        let contract = ContractDocument::from_slice(
            &br#"{"Request": {"Body": {"amount": "<<integer>>"}}, "Response": {"status": "accepted"}}"#[..],
        )
        .unwrap();
        let mut body = JsonMap::new();
        body.insert("amount".to_string(), json!(12));
        Certificate::seal(
            &contract,
            &CanonicalRequest::new("post", "orders", "new").with_body(body),
        )
    }

    #[tokio::test]
    async fn test_echo_returns_contract_response() {
        let response = EchoResponse
            .handle(RequestContext::new(), certificate())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &json!({"status": "accepted"}));
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let handler = |_ctx: RequestContext, cert: Certificate| async move {
            let amount = cert.body()["amount"].as_i64().unwrap_or_default();
            Ok::<_, GatewayError>(
                HandlerResponse::ok(json!({"charged": amount})).with_status(StatusCode::CREATED),
            )
        };
        let response = handler
            .handle(RequestContext::new(), certificate())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body()["charged"], 12);
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let handler = |_ctx: RequestContext, _cert: Certificate| async move {
            Err::<HandlerResponse, _>(GatewayError::forbidden("account frozen"))
        };
        let err = handler
            .handle(RequestContext::new(), certificate())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "account frozen");
    }
}
