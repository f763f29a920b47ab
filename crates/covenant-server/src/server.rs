//! HTTP/1.1 transport.
//!
//! Accepts TCP connections, answers `GET /health` directly and hands every
//! other request to the [`Gateway`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use covenant_config::{GatewayConfig, ServerConfig};
use covenant_core::RequestContext;
use covenant_sentinel::Sentinel;
use covenant_telemetry::DiagnosticSink;
use http::{Method, Request, StatusCode};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gateway::{json_response, Gateway, HttpResponse};
use crate::handler::CertifiedHandler;
use crate::health::HealthCheck;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::ServerError;

/// The gateway's HTTP server.
///
/// # Example
///
/// ```rust,ignore
/// use covenant_server::Server;
///
/// let server = Server::from_config(&config)?;
/// server.run().await?;
/// ```
#[derive(Debug)]
pub struct Server {
    http_addr: String,
    shutdown_timeout: Duration,
    gateway: Gateway,
    health: HealthCheck,
    diagnostics: Option<JoinHandle<u64>>,
}

impl Server {
    /// Wraps a gateway with default transport settings.
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        let defaults = ServerConfig::default();
        Self {
            http_addr: defaults.http_addr,
            shutdown_timeout: Duration::from_secs(defaults.shutdown_timeout_secs),
            gateway,
            health: HealthCheck::default(),
            diagnostics: None,
        }
    }

    /// Builds the full server from configuration.
    ///
    /// Reads the manifest's service file and spawns the diagnostics worker,
    /// so it must run inside a Tokio runtime.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        let sentinel = Sentinel::from_config(config)?;
        let (sink, worker) = DiagnosticSink::spawn(&config.diagnostics)?;
        let gateway = Gateway::new(sentinel)
            .configured(config)
            .with_diagnostics(sink);

        Ok(Self {
            http_addr: config.server.http_addr.clone(),
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout_secs),
            gateway,
            health: HealthCheck::default(),
            diagnostics: worker,
        })
    }

    /// Replaces the handler run after certification.
    #[must_use]
    pub fn with_handler(mut self, handler: impl CertifiedHandler) -> Self {
        self.gateway = self.gateway.with_handler(handler);
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Returns the gateway.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Returns the configured bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.http_addr.as_str())
            .await
            .map_err(|e| {
                ServerError::BindError(format!("failed to bind to {}: {e}", self.http_addr))
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already-bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        info!(addr = %listener.local_addr()?, "gateway listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                debug!(%remote_addr, error = %e, "connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.shutdown_timeout;
        info!(
            active = tracker.active_connections(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "draining connections"
        );
        if tokio::time::timeout(timeout, tracker.drained()).await.is_err() {
            warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        if let Ok(server) = Arc::try_unwrap(server) {
            server.flush_diagnostics().await;
        }
        info!("gateway stopped");
        Ok(())
    }

    /// Answers one request: `/health` directly, everything else through
    /// the gateway.
    pub async fn handle<B>(&self, request: Request<B>, remote_addr: Option<SocketAddr>) -> HttpResponse
    where
        B: Body<Data = bytes::Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if request.method() == Method::GET && request.uri().path() == "/health" {
            let status = serde_json::to_value(self.health.status()).unwrap_or(Value::Null);
            return json_response(StatusCode::OK, &status);
        }

        let mut ctx = RequestContext::new();
        if let Some(addr) = remote_addr {
            ctx = ctx.with_client_addr(addr);
        }
        self.gateway.handle(request, ctx).await
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request, Some(remote_addr)).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn flush_diagnostics(self) {
        let Self {
            gateway,
            diagnostics,
            ..
        } = self;
        drop(gateway);

        if let Some(worker) = diagnostics {
            match worker.await {
                Ok(logged) => debug!(logged, "diagnostics flushed"),
                Err(e) => warn!(error = %e, "diagnostics worker failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_config::ServiceConfig;
    use covenant_sentinel::RuleEngine;
    use covenant_token::TokenCodec;
    use http_body_util::{BodyExt, Full};

    fn server() -> Server {
        let codec = TokenCodec::new(ServiceConfig::new("gateway").with_issuer_key("gateway", "gw-key"));
        let rules = RuleEngine::new(Arc::new(codec));
        Server::new(Gateway::new(Sentinel::new("/nonexistent", rules)))
    }

    #[tokio::test]
    async fn test_health_skips_pipeline() {
        let request = Request::get("/health")
            .body(Full::new(bytes::Bytes::new()))
            .unwrap();
        let response = server().handle(request, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "covenant");
    }

    #[tokio::test]
    async fn test_other_paths_go_through_gateway() {
        let request = Request::post("/health")
            .body(Full::new(bytes::Bytes::new()))
            .unwrap();
        let response = server().handle(request, None).await;
        assert_ne!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_defaults() {
        let server = server().with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(server.http_addr(), "0.0.0.0:8080");
        assert_eq!(server.shutdown_timeout, Duration::from_secs(5));
    }
}
