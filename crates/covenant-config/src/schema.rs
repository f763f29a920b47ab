//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration section.
///
/// # Example
///
/// ```
/// use covenant_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_timeout_ms, 30000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Deadline for one request pipeline, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Honor `X-Forwarded-Proto` / `X-Forwarded-Ssl` from an upstream proxy.
    #[serde(default)]
    pub trust_forwarded_headers: bool,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            trust_forwarded_headers: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Manifest location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig {
    /// Directory holding `<method>/<root>/<resource>.json`.
    #[serde(default = "default_manifest_root")]
    pub root: PathBuf,

    /// Service file name, relative to `root`.
    #[serde(default = "default_service_file")]
    pub service_file: String,
}

impl ManifestConfig {
    /// Returns the full path of the service file.
    #[must_use]
    pub fn service_file_path(&self) -> PathBuf {
        self.root.join(&self.service_file)
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            root: default_manifest_root(),
            service_file: default_service_file(),
        }
    }
}

fn default_manifest_root() -> PathBuf {
    PathBuf::from("manifest")
}

fn default_service_file() -> String {
    "service.toml".to_string()
}

/// What to do with a `<<rule>>` that has no registered predicate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRulePolicy {
    /// Fail the request with an internal error.
    #[default]
    Reject,
    /// Let the field pass unchecked.
    Allow,
}

/// Contract validation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Policy for unregistered rule names.
    #[serde(default)]
    pub unknown_rules: UnknownRulePolicy,
}

/// Failure diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Log every failure with its origin and call stack.
    #[serde(default = "default_true")]
    pub log_failures: bool,

    /// Include the internal message in error responses.
    #[serde(default)]
    pub expose_in_response: bool,

    /// Failures buffered for logging before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_failures: true,
            expose_in_response: false,
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert!(!config.trust_forwarded_headers);
    }

    #[test]
    fn test_service_file_path() {
        let config = ManifestConfig {
            root: PathBuf::from("/srv/manifest"),
            ..Default::default()
        };
        assert_eq!(
            config.service_file_path(),
            PathBuf::from("/srv/manifest/service.toml")
        );
    }

    #[test]
    fn test_unknown_rule_policy_serde() {
        let policy: UnknownRulePolicy = serde_json::from_str("\"allow\"").unwrap();
        assert_eq!(policy, UnknownRulePolicy::Allow);
        assert_eq!(UnknownRulePolicy::default(), UnknownRulePolicy::Reject);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<DiagnosticsConfig, _> =
            serde_json::from_str(r#"{"log_failures": true, "verbose": 1}"#);
        assert!(result.is_err());
    }
}
