//! Covenant Server - HTTP transport for the gateway
//!
//! Wires the pieces of the gateway to the network:
//!
//! - [`Server`]: hyper HTTP/1.1 accept loop with graceful shutdown
//! - [`Gateway`]: body collection, canonicalization, certification and
//!   dispatch, all under one deadline
//! - [`CertifiedHandler`]: business logic that only sees a [`Certificate`]
//! - [`Caller`]: outbound client that signs its own bearer tokens
//!
//! # Example
//!
//! ```rust,ignore
//! use covenant_config::ConfigLoader;
//! use covenant_server::{HandlerResponse, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_file("covenant.toml")?.load()?;
//!     Server::from_config(&config)?
//!         .with_handler(|_ctx, cert: Certificate| async move {
//!             Ok(HandlerResponse::ok(cert.response().clone()))
//!         })
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! [`Certificate`]: covenant_core::Certificate

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod caller;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod health;
pub mod server;
pub mod shutdown;

pub use caller::{CallResponse, Caller, CallerError};
pub use error::ServerError;
pub use gateway::{json_response, Gateway, HttpResponse, ResponseBody, REQUEST_ID_HEADER};
pub use handler::{CertifiedHandler, EchoResponse, HandlerFuture, HandlerResponse};
pub use health::{HealthCheck, HealthStatus};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
