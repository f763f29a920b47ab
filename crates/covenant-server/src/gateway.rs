//! The request pipeline.
//!
//! Every request runs the same sequence under one deadline:
//!
//! ```text
//! collect body → canonicalize → certify → handler → JSON response
//! ```
//!
//! The first failure ends the pipeline and becomes the response.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use covenant_config::GatewayConfig;
use covenant_core::{GatewayError, GatewayResult, RequestContext};
use covenant_extract::RequestCanonicalizer;
use covenant_sentinel::Sentinel;
use covenant_telemetry::{log_request_complete, log_request_rejected, log_request_start, DiagnosticSink};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use serde_json::Value;

use crate::handler::{CertifiedHandler, EchoResponse, HandlerResponse};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Header carrying the request ID on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Certifies requests and dispatches them to a [`CertifiedHandler`].
///
/// Cheap to clone; all state is shared and read-only.
#[derive(Clone)]
pub struct Gateway {
    canonicalizer: RequestCanonicalizer,
    sentinel: Sentinel,
    handler: Arc<dyn CertifiedHandler>,
    diagnostics: DiagnosticSink,
    expose_internal: bool,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl Gateway {
    /// Creates a gateway with the echo handler and no diagnostics.
    #[must_use]
    pub fn new(sentinel: Sentinel) -> Self {
        Self {
            canonicalizer: RequestCanonicalizer::new(),
            sentinel,
            handler: Arc::new(EchoResponse),
            diagnostics: DiagnosticSink::disabled(),
            expose_internal: false,
            request_timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Applies the server and diagnostics settings from `config`.
    #[must_use]
    pub fn configured(mut self, config: &GatewayConfig) -> Self {
        self.canonicalizer = RequestCanonicalizer::new()
            .with_trusted_forwarding(config.server.trust_forwarded_headers);
        self.expose_internal = config.diagnostics.expose_in_response;
        self.request_timeout = Duration::from_millis(config.server.request_timeout_ms);
        self.max_body_bytes = config.server.max_body_bytes;
        self
    }

    /// Replaces the handler run after certification.
    #[must_use]
    pub fn with_handler(mut self, handler: impl CertifiedHandler) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Sets where failures are reported.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSink) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Sets the deadline for the whole pipeline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the largest accepted request body.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Includes internal messages in error bodies.
    #[must_use]
    pub fn with_exposed_errors(mut self, expose: bool) -> Self {
        self.expose_internal = expose;
        self
    }

    /// Returns the sentinel.
    #[must_use]
    pub const fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    /// Returns the pipeline deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Runs the pipeline without a deadline and returns its outcome.
    pub async fn process<B>(
        &self,
        request: Request<B>,
        ctx: &RequestContext,
    ) -> GatewayResult<HandlerResponse>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let body = collect_body(body, self.max_body_bytes).await?;
        let request = Request::from_parts(parts, body);

        let canonical = self.canonicalizer.canonicalize(&request, ctx)?;
        let certificate = self.sentinel.certify(&canonical).await?;
        self.handler.handle(ctx.clone(), certificate).await
    }

    /// Runs the pipeline under the deadline and renders the response.
    pub async fn handle<B>(&self, request: Request<B>, ctx: RequestContext) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        log_request_start!(ctx.request_id(), request.method(), request.uri().path());

        let outcome = tokio::time::timeout(self.request_timeout, self.process(request, &ctx))
            .await
            .unwrap_or_else(|_| Err(GatewayError::internal("request deadline exceeded")));

        let mut response = match outcome {
            Ok(success) => json_response(success.status(), success.body()),
            Err(err) => self.reject(&err, &ctx),
        };

        if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_request_complete!(ctx.request_id(), response.status().as_u16(), duration_ms);
        response
    }

    /// Turns a failure into its error response and reports it.
    pub fn reject(&self, err: &GatewayError, ctx: &RequestContext) -> HttpResponse {
        log_request_rejected!(ctx.request_id(), err);
        self.diagnostics.report(ctx.request_id(), err);

        let envelope = err.to_envelope(self.expose_internal);
        let body = serde_json::to_value(envelope).unwrap_or(Value::Null);
        json_response(err.status_code(), &body)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("sentinel", &self.sentinel)
            .field("expose_internal", &self.expose_internal)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// Builds a JSON response.
#[must_use]
pub fn json_response(status: StatusCode, body: &Value) -> HttpResponse {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

async fn collect_body<B>(body: B, limit: usize) -> GatewayResult<Bytes>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(
            GatewayError::bad_request(format!("request body exceeds {limit} bytes")),
        ),
        Err(e) => Err(GatewayError::bad_request(format!(
            "failed to read request body: {e}"
        ))),
    }
}
