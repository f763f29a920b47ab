//! Covenant Sentinel - Contract Resolution and Certification
//!
//! This crate decides whether a canonical request is allowed through the
//! gateway. It finds the contract that governs the request's route, checks
//! every field the contract names, authenticates the bearer token and seals
//! a [`Certificate`] holding only the approved fields.
//!
//! # Architecture
//!
//! ```text
//!      CanonicalRequest
//!             │
//!  ┌──────────▼─────────────┐      ┌──────────────────────┐
//!  │   ManifestResolver     │◄─────│ manifest/<method>/   │
//!  │ (method, root, res.)   │      │   <root>/<res>.json  │
//!  └──────────┬─────────────┘      └──────────────────────┘
//!             │ contract
//!  ┌──────────▼─────────────┐      ┌──────────────────────┐
//!  │   ContractValidator    │─────►│     RuleEngine       │
//!  │ headers → body → JWT   │      │ (literal / <<named>>)│
//!  └──────────┬─────────────┘      └──────────┬───────────┘
//!             │ authenticate                  │
//!             │                    ┌──────────▼───────────┐
//!             └───────────────────►│     TokenCodec       │
//!                                  └──────────────────────┘
//!             │ seal
//!             ▼
//!        Certificate
//! ```
//!
//! # Example
//!
//! ```ignore
//! use covenant_sentinel::Sentinel;
//!
//! let sentinel = Sentinel::from_config(&config)?;
//! let certificate = sentinel.certify(&canonical).await?;
//! assert_eq!(certificate.root(), "users");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod manifest;
pub mod rules;
pub mod validator;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use covenant_config::{ConfigError, GatewayConfig, ServiceConfig};
use covenant_core::{CanonicalRequest, Certificate, GatewayResult};
use covenant_token::TokenCodec;
use tracing::info;

pub use manifest::{ManifestResolver, METHODS};
pub use rules::{humanize, Predicate, RuleEngine};
pub use validator::{ContractValidator, ValidationState};

/// Certifies requests against one manifest.
///
/// Holds only read-only state; a fresh [`ManifestResolver`] and
/// [`ContractValidator`] are built for every request.
#[derive(Debug, Clone)]
pub struct Sentinel {
    manifest_root: PathBuf,
    rules: Arc<RuleEngine>,
}

impl Sentinel {
    /// Creates a sentinel over a manifest directory.
    #[must_use]
    pub fn new(manifest_root: impl Into<PathBuf>, rules: RuleEngine) -> Self {
        Self {
            manifest_root: manifest_root.into(),
            rules: Arc::new(rules),
        }
    }

    /// Builds a sentinel from gateway configuration, reading the manifest's
    /// service file for issuer keys.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let service_path = config.manifest.service_file_path();
        let service = ServiceConfig::from_file(&service_path)?;
        info!(
            manifest = %config.manifest.root.display(),
            service_file = %service_path.display(),
            issuers = service.issuers().count(),
            "sentinel configured"
        );

        let rules = RuleEngine::new(Arc::new(TokenCodec::new(service)))
            .with_unknown_rule_policy(config.validation.unknown_rules);
        Ok(Self::new(config.manifest.root.clone(), rules))
    }

    /// Returns the manifest directory.
    #[must_use]
    pub fn manifest_root(&self) -> &Path {
        &self.manifest_root
    }

    /// Returns the shared rule engine.
    #[must_use]
    pub const fn rules(&self) -> &Arc<RuleEngine> {
        &self.rules
    }

    /// Returns the shared token codec.
    #[must_use]
    pub fn codec(&self) -> &Arc<TokenCodec> {
        self.rules.codec()
    }

    /// Runs the full validation pipeline for one request.
    ///
    /// Failures keep their kind and are prefixed `failed to validate request`.
    pub async fn certify(&self, request: &CanonicalRequest) -> GatewayResult<Certificate> {
        let resolver = ManifestResolver::open(&self.manifest_root)
            .await
            .map_err(|e| e.context("failed to validate request"))?;
        ContractValidator::new(resolver, Arc::clone(&self.rules))
            .certify(request)
            .await
    }
}
