//! # Covenant
//!
//! **Contract-driven request authorization gateway**
//!
//! Every request is checked against a JSON contract found by its method and
//! path before any business logic runs:
//!
//! - **Manifest lookup**: `manifest/<method>/<root>/<resource>.json`
//! - **Field rules**: literal values or named predicates such as
//!   `<<integer>>` for headers, body and bearer-token claims
//! - **Authentication**: HMAC-SHA256 tokens signed with per-issuer secrets
//! - **Certificates**: handlers receive only the fields the contract named
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use covenant::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_file("covenant.toml")?.load()?;
//!     init_logging(&LogConfig::from(&config.logging))?;
//!
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
//! ## Architecture
//!
//! ```text
//! Request → Canonicalize → Resolve contract → Headers → Body → JWT claims
//!                                                                  ↓
//! Response ← Handler ← Certificate ← Authenticate ←────────────────┘
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use covenant_core as core;

// Re-export configuration
pub use covenant_config as config;

// Re-export token signing
pub use covenant_token as token;

// Re-export request canonicalization
pub use covenant_extract as extract;

// Re-export contract validation
pub use covenant_sentinel as sentinel;

// Re-export logging and diagnostics
pub use covenant_telemetry as telemetry;

// Re-export the HTTP server
pub use covenant_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use covenant::prelude::*;
/// ```
pub mod prelude {
    pub use covenant_core::{
        CanonicalRequest, Certificate, ErrorKind, GatewayError, GatewayResult, RequestContext,
        RequestId,
    };

    pub use covenant_config::{ConfigLoader, GatewayConfig, ServiceConfig};

    pub use covenant_token::TokenCodec;

    pub use covenant_extract::RequestCanonicalizer;

    pub use covenant_sentinel::{RuleEngine, Sentinel};

    pub use covenant_telemetry::{init_logging, LogConfig};

    pub use covenant_server::{
        Caller, CertifiedHandler, Gateway, HandlerResponse, Server, ShutdownSignal,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_builds_a_sentinel() {
        let codec = TokenCodec::new(ServiceConfig::new("gateway"));
        let sentinel = Sentinel::new("manifest", RuleEngine::new(std::sync::Arc::new(codec)));
        assert_eq!(sentinel.manifest_root(), std::path::Path::new("manifest"));
        assert!(sentinel.rules().has_rule("integer"));
    }
}
