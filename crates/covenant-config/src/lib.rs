//! Typed configuration for the Covenant gateway.
//!
//! Two documents are configured here:
//!
//! - [`GatewayConfig`] - how the gateway process runs (listener, manifest
//!   location, validation policy, diagnostics, logging). Loaded with
//!   [`ConfigLoader`] from defaults, a TOML/JSON file, `.env` and
//!   `COVENANT__SECTION__KEY` environment variables.
//! - [`ServiceConfig`] - the manifest's service file: per-issuer shared
//!   secrets, this service's own issuer id, and the expected JWT header claims.
//!
//! # Example
//!
//! ```no_run
//! use covenant_config::{ConfigLoader, ServiceConfig};
//!
//! # fn main() -> Result<(), covenant_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("covenant.toml")?
//!     .with_env_prefix("COVENANT")
//!     .load()?;
//!
//! let service = ServiceConfig::from_file(config.manifest.service_file_path())?;
//! println!("issuer: {}", service.own_issuer());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 30000
//! shutdown_timeout_secs = 30
//! trust_forwarded_headers = false
//!
//! [manifest]
//! root = "/etc/covenant/manifest"
//! service_file = "service.toml"
//!
//! [validation]
//! unknown_rules = "reject"
//!
//! [diagnostics]
//! log_failures = true
//! expose_in_response = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;
mod service;

pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use service::{ServiceConfig, TokenHead};
