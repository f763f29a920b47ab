//! Top-level gateway configuration and its builder.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::{
    ConfigError, DiagnosticsConfig, LogFormat, LoggingConfig, ManifestConfig, ServerConfig,
    ValidationConfig,
};

/// Complete gateway configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use covenant_config::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Manifest location.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Contract validation policy.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Failure diagnostics.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Process logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.manifest.service_file.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "manifest.service_file",
                "must not be empty",
            ));
        }

        if self.diagnostics.queue_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "diagnostics.queue_capacity",
                "must be greater than zero",
            ));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("not a log filter directive: {e}"),
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, internal messages in responses.
    ///
    /// # Example
    ///
    /// ```
    /// use covenant_config::GatewayConfig;
    ///
    /// let config = GatewayConfig::development();
    /// assert!(config.diagnostics.expose_in_response);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config.diagnostics.expose_in_response = true;
        config
    }

    /// Production preset: JSON info logs, public messages only.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.diagnostics.expose_in_response = false;
        config
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    server: Option<ServerConfig>,
    manifest: Option<ManifestConfig>,
    validation: Option<ValidationConfig>,
    diagnostics: Option<DiagnosticsConfig>,
    logging: Option<LoggingConfig>,
}

impl GatewayConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the manifest configuration.
    #[must_use]
    pub fn manifest(mut self, manifest: ManifestConfig) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Set the validation configuration.
    #[must_use]
    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Set the diagnostics configuration.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            server: self.server.unwrap_or_default(),
            manifest: self.manifest.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
            diagnostics: self.diagnostics.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<GatewayConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
