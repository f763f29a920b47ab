//! Layered configuration loader.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, GatewayConfig, LogFormat, UnknownRulePolicy};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables (`PREFIX__SECTION__KEY`)
///
/// # Example
///
/// ```no_run
/// use covenant_config::ConfigLoader;
///
/// # fn main() -> Result<(), covenant_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("covenant.toml")?
///     .with_env_prefix("COVENANT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: GatewayConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = GatewayConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use covenant_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = GatewayConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = GatewayConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// # Example
    ///
    /// ```
    /// use covenant_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [manifest]
    ///     root = "/srv/manifest"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.manifest.root.to_str(), Some("/srv/manifest"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(format.to_string()))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the working directory, if present.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Finalize: apply environment overrides, then validate.
    ///
    /// # Example
    ///
    /// ```
    /// use covenant_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    /// ```
    pub fn load(mut self) -> Result<GatewayConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> GatewayConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<GatewayConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__"))
        else {
            // e.g. COVENANT_CONFIG, which names the file rather than a field
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => {
                self.config.server.http_addr = value.to_string();
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "TRUST_FORWARDED_HEADERS"] => {
                self.config.server.trust_forwarded_headers = parse_flag(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["MANIFEST", "ROOT"] => {
                self.config.manifest.root = PathBuf::from(value);
            }
            ["MANIFEST", "SERVICE_FILE"] => {
                self.config.manifest.service_file = value.to_string();
            }

            ["VALIDATION", "UNKNOWN_RULES"] => {
                self.config.validation.unknown_rules = match value.to_lowercase().as_str() {
                    "reject" => UnknownRulePolicy::Reject,
                    "allow" => UnknownRulePolicy::Allow,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'reject' or 'allow'",
                        ))
                    }
                };
            }

            ["DIAGNOSTICS", "LOG_FAILURES"] => {
                self.config.diagnostics.log_failures = parse_flag(key, value)?;
            }
            ["DIAGNOSTICS", "EXPOSE_IN_RESPONSE"] => {
                self.config.diagnostics.expose_in_response = parse_flag(key, value)?;
            }
            ["DIAGNOSTICS", "QUEUE_CAPACITY"] => {
                self.config.diagnostics.queue_capacity = parse_number(key, value)?;
            }

            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = parse_flag(key, value)?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"diagnostics": {"expose_in_response": true}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.diagnostics.expose_in_response);
    }

    #[test]
    fn test_loader_with_unsupported_format() {
        assert!(ConfigLoader::new().with_string("", "yaml").is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/covenant.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/covenant.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    // Env overrides are exercised through apply_env_var directly; setting
    // process variables would need unsafe on newer editions.

    #[test]
    fn test_apply_env_var_server() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__SERVER__HTTP_ADDR", "192.168.1.1:9000", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__SERVER__TRUST_FORWARDED_HEADERS", "yes", "TEST")
            .unwrap();
        assert_eq!(loader.config.server.http_addr, "192.168.1.1:9000");
        assert!(loader.config.server.trust_forwarded_headers);
    }

    #[test]
    fn test_apply_env_var_manifest() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__MANIFEST__ROOT", "/srv/contracts", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__MANIFEST__SERVICE_FILE", "svc.toml", "TEST")
            .unwrap();
        assert_eq!(
            loader.config.manifest.service_file_path(),
            PathBuf::from("/srv/contracts/svc.toml")
        );
    }

    #[test]
    fn test_apply_env_var_unknown_rules() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__VALIDATION__UNKNOWN_RULES", "allow", "TEST")
            .unwrap();
        assert_eq!(
            loader.config.validation.unknown_rules,
            UnknownRulePolicy::Allow
        );

        let result = loader.apply_env_var("TEST__VALIDATION__UNKNOWN_RULES", "ignore", "TEST");
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result =
            loader.apply_env_var("TEST__DIAGNOSTICS__QUEUE_CAPACITY", "lots", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_ignores_non_section_keys() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST_CONFIG", "/etc/covenant.toml", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__UNKNOWN__KEY", "x", "TEST")
            .unwrap();
        assert_eq!(loader.config, GatewayConfig::default());
    }
}
