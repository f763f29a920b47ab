//! Liveness endpoint.
//!
//! `GET /health` answers before any contract lookup, so probes never need
//! a token or a manifest entry.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Body of the `/health` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
    service: String,
    version: String,
    uptime_seconds: u64,
}

impl HealthStatus {
    /// Creates a healthy status.
    #[must_use]
    pub fn healthy(service: impl Into<String>, version: impl Into<String>, uptime: Duration) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            version: version.into(),
            uptime_seconds: uptime.as_secs(),
        }
    }

    /// Returns the status string.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the uptime in seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.uptime_seconds
    }

    /// Returns whether the status is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Reports the server as healthy for as long as it runs.
///
/// # Example
///
/// ```rust
/// use covenant_server::HealthCheck;
///
/// let health = HealthCheck::new("covenant", "0.1.0");
/// let status = health.status();
///
/// assert!(status.is_healthy());
/// assert_eq!(status.service(), "covenant");
/// ```
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    start_time: Instant,
}

impl HealthCheck {
    /// Creates a health check; uptime counts from now.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            start_time: Instant::now(),
        }
    }

    /// Returns the current health status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus::healthy(&self.service, &self.version, self.start_time.elapsed())
    }

    /// Returns the server uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new("covenant", env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus::healthy("covenant", "0.1.0", Duration::from_secs(90));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "covenant");
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["uptime_seconds"], 90);
    }

    #[test]
    fn test_health_check_default() {
        let health = HealthCheck::default();
        let status = health.status();
        assert!(status.is_healthy());
        assert_eq!(status.status(), "healthy");
        assert_eq!(status.version(), env!("CARGO_PKG_VERSION"));
        assert!(health.uptime() < Duration::from_secs(60));
    }
}
