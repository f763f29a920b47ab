//! Off-path failure logging.
//!
//! Request handlers hand failures to a [`DiagnosticSink`], which queues them
//! on a bounded channel. A [`DiagnosticWorker`] drains the queue and logs
//! each failure with its origin and captured call stack. When the queue is
//! full, new failures are dropped and counted rather than waited on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use covenant_config::DiagnosticsConfig;
use covenant_core::{GatewayError, RequestId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// One failure waiting to be logged.
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// Request the failure belongs to.
    pub request_id: RequestId,
    /// The failure itself.
    pub error: GatewayError,
}

/// Producer half. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct DiagnosticSink {
    tx: Option<mpsc::Sender<FailureReport>>,
    dropped: Arc<AtomicU64>,
}

/// Consumer half. Logs reports until every sink is gone.
#[derive(Debug)]
pub struct DiagnosticWorker {
    rx: mpsc::Receiver<FailureReport>,
}

impl DiagnosticSink {
    /// Creates a connected sink and worker with room for `capacity` reports.
    pub fn channel(capacity: usize) -> TelemetryResult<(Self, DiagnosticWorker)> {
        if capacity == 0 {
            return Err(TelemetryError::InvalidConfig(
                "diagnostics queue capacity must be greater than 0".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel(capacity);
        let sink = Self {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        Ok((sink, DiagnosticWorker { rx }))
    }

    /// A sink that discards everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Builds a sink from configuration and spawns its worker on the
    /// current runtime.
    ///
    /// Returns a disabled sink and no handle when `log_failures` is off.
    pub fn spawn(config: &DiagnosticsConfig) -> TelemetryResult<(Self, Option<JoinHandle<u64>>)> {
        if !config.log_failures {
            return Ok((Self::disabled(), None));
        }
        let (sink, worker) = Self::channel(config.queue_capacity)?;
        let handle = tokio::spawn(worker.run());
        Ok((sink, Some(handle)))
    }

    /// Returns whether reports go anywhere.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues a failure. Returns `false` if it was dropped.
    pub fn report(&self, request_id: RequestId, error: &GatewayError) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let report = FailureReport {
            request_id,
            error: error.clone(),
        };
        if tx.try_send(report).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Number of reports dropped because the queue was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DiagnosticWorker {
    /// Logs reports until all sinks are dropped. Returns how many were logged.
    pub async fn run(mut self) -> u64 {
        let mut logged = 0;
        while let Some(report) = self.rx.recv().await {
            log_failure(&report);
            logged += 1;
        }
        debug!(logged, "diagnostics worker stopped");
        logged
    }
}

fn log_failure(report: &FailureReport) {
    let err = &report.error;
    let location = err.location();
    let location = format!("{}:{}", location.file(), location.line());

    if err.status_code().is_server_error() {
        error!(
            request_id = %report.request_id,
            error.code = err.kind().as_str(),
            error.message = %err.message(),
            error.location = %location,
            backtrace = %err.backtrace(),
            "request failed"
        );
    } else {
        warn!(
            request_id = %report.request_id,
            error.code = err.kind().as_str(),
            error.message = %err.message(),
            error.location = %location,
            backtrace = %err.backtrace(),
            "request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_reach_worker() {
        let (sink, worker) = DiagnosticSink::channel(4).unwrap();
        assert!(sink.report(RequestId::new(), &GatewayError::not_found("root not found")));
        assert!(sink.report(RequestId::new(), &GatewayError::internal("boom")));
        drop(sink);

        assert_eq!(worker.run().await, 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let (sink, worker) = DiagnosticSink::channel(1).unwrap();
        let err = GatewayError::bad_request("request body is not JSON");

        assert!(sink.report(RequestId::new(), &err));
        assert!(!sink.report(RequestId::new(), &err));
        assert_eq!(sink.dropped(), 1);

        drop(sink);
        assert_eq!(worker.run().await, 1);
    }

    #[test]
    fn test_disabled_sink() {
        let sink = DiagnosticSink::disabled();
        assert!(!sink.is_enabled());
        assert!(!sink.report(RequestId::new(), &GatewayError::internal("x")));
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            DiagnosticSink::channel(0),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_spawn_respects_config() {
        let config = DiagnosticsConfig {
            log_failures: false,
            ..DiagnosticsConfig::default()
        };
        let (sink, handle) = DiagnosticSink::spawn(&config).unwrap();
        assert!(!sink.is_enabled());
        assert!(handle.is_none());

        let (sink, handle) = DiagnosticSink::spawn(&DiagnosticsConfig::default()).unwrap();
        assert!(sink.report(RequestId::new(), &GatewayError::forbidden("nope")));
        drop(sink);
        assert_eq!(handle.unwrap().await.unwrap(), 1);
    }
}
