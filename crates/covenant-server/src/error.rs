//! Server error types.

use covenant_config::ConfigError;
use covenant_telemetry::TelemetryError;
use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("Bind error: {0}")]
    BindError(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging or diagnostics could not be set up.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::BindError("Failed to bind to 0.0.0.0:80".to_string());
        assert_eq!(err.to_string(), "Bind error: Failed to bind to 0.0.0.0:80");

        let err = ServerError::from(ConfigError::validation_error("no manifest"));
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
