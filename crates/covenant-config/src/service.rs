//! The manifest's service file.
//!
//! ```toml
//! [auth]
//! svcA = "k1"
//! billing = "a-much-longer-shared-secret"
//!
//! [ident]
//! iss = "gateway"
//!
//! [token]
//! head.alg = "HS256"
//! head.typ = "JWT"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::ConfigError;

/// Expected JWT header claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TokenHead {
    /// Expected `alg` claim.
    #[serde(default = "default_alg")]
    pub alg: String,
    /// Expected `typ` claim.
    #[serde(default = "default_typ")]
    pub typ: String,
}

impl Default for TokenHead {
    fn default() -> Self {
        Self {
            alg: default_alg(),
            typ: default_typ(),
        }
    }
}

fn default_alg() -> String {
    "HS256".to_string()
}

fn default_typ() -> String {
    "JWT".to_string()
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct IdentSection {
    #[serde(default)]
    iss: String,
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct TokenSection {
    #[serde(default)]
    head: TokenHead,
}

/// Issuer keys and token expectations for one manifest.
///
/// Secrets never appear in `Debug` output.
///
/// # Example
///
/// ```
/// use covenant_config::ServiceConfig;
///
/// let service = ServiceConfig::from_toml_str(r#"
///     [auth]
///     svcA = "k1"
///
///     [ident]
///     iss = "gateway"
/// "#).unwrap();
///
/// assert_eq!(service.key_for("svcA"), Some("k1"));
/// assert_eq!(service.own_issuer(), "gateway");
/// assert_eq!(service.token_head().alg, "HS256");
/// ```
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    auth: BTreeMap<String, String>,
    #[serde(default)]
    ident: IdentSection,
    #[serde(default)]
    token: TokenSection,
}

impl ServiceConfig {
    /// Reads and parses a service file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::missing_service_file(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parses a service file from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Builds a service config in code.
    #[must_use]
    pub fn new(own_issuer: impl Into<String>) -> Self {
        Self {
            ident: IdentSection {
                iss: own_issuer.into(),
            },
            ..Self::default()
        }
    }

    /// Adds or replaces an issuer's shared secret.
    #[must_use]
    pub fn with_issuer_key(mut self, issuer: impl Into<String>, key: impl Into<String>) -> Self {
        self.auth.insert(issuer.into(), key.into());
        self
    }

    /// Sets the expected JWT header claims.
    #[must_use]
    pub fn with_token_head(mut self, head: TokenHead) -> Self {
        self.token.head = head;
        self
    }

    /// Returns the shared secret for an issuer.
    #[must_use]
    pub fn key_for(&self, issuer: &str) -> Option<&str> {
        self.auth.get(issuer).map(String::as_str)
    }

    /// Returns the known issuers.
    pub fn issuers(&self) -> impl Iterator<Item = &str> {
        self.auth.keys().map(String::as_str)
    }

    /// Returns this service's own issuer id.
    #[must_use]
    pub fn own_issuer(&self) -> &str {
        &self.ident.iss
    }

    /// Returns the expected JWT header claims.
    #[must_use]
    pub const fn token_head(&self) -> &TokenHead {
        &self.token.head
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("issuers", &self.auth.keys().collect::<Vec<_>>())
            .field("own_issuer", &self.ident.iss)
            .field("token_head", &self.token.head)
            .finish()
    }
}
