//! Logging and failure diagnostics for Covenant.
//!
//! - **Logging**: `tracing-subscriber` setup with JSON or pretty output
//! - **Diagnostics**: a bounded, non-blocking queue that logs every failed
//!   request with its origin and call stack
//!
//! # Example
//!
//! ```rust,ignore
//! use covenant_telemetry::{init_logging, DiagnosticSink, LogConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::from(&config.logging))?;
//!     let (sink, _worker) = DiagnosticSink::spawn(&config.diagnostics)?;
//!     // hand `sink` to the server
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diagnostics;
pub mod error;
pub mod logging;

pub use diagnostics::{DiagnosticSink, DiagnosticWorker, FailureReport};
pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
