//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why gateway or service configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file named explicitly does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The manifest has no service file.
    #[error("service file not found in manifest: {path}")]
    MissingServiceFile {
        /// Expected location of the service file.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("failed to read {path}")]
    ReadError {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file extension or format name is neither TOML nor JSON.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// Malformed TOML (gateway config or service file).
    #[error("invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Malformed JSON gateway config.
    #[error("invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A field holds a value the gateway cannot use.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `COVENANT__*` override could not be parsed.
    #[error("invalid environment override {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// Cross-field validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// A missing configuration file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// A missing manifest service file.
    pub fn missing_service_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingServiceFile { path: path.into() }
    }

    /// An unreadable file.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// A bad field value.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A bad environment override.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// A failed cross-field check.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}
