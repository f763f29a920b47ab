//! Field rule evaluation.
//!
//! Contracts attach a [`Rule`] to every field they name. A rule is either a
//! literal the value must equal, a `<<name>>` reference to a registered
//! predicate, or a nested placeholder that only enforces the value's shape.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use covenant_config::ServiceConfig;
//! use covenant_core::Rule;
//! use covenant_sentinel::RuleEngine;
//! use covenant_token::TokenCodec;
//! use serde_json::json;
//!
//! let engine = RuleEngine::new(Arc::new(TokenCodec::new(ServiceConfig::new("gateway"))));
//!
//! assert!(engine.apply(&json!(12), &Rule::parse("<<integer>>"), "amount").is_ok());
//! assert!(engine.apply(&json!("12"), &Rule::parse("<<integer>>"), "amount").is_err());
//! assert!(engine.apply(&json!(2), &Rule::parse("2"), "version").is_ok());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use covenant_config::UnknownRulePolicy;
use covenant_core::{GatewayError, GatewayResult, Rule};
use covenant_token::{parse_unix_timestamp, TokenCodec};
use serde_json::Value;
use tracing::warn;

/// A named check over a single JSON value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Dispatches field values against contract rules.
///
/// Built once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct RuleEngine {
    predicates: HashMap<String, Predicate>,
    codec: Arc<TokenCodec>,
    unknown_rules: UnknownRulePolicy,
}

impl RuleEngine {
    /// Creates an engine with the built-in predicates.
    ///
    /// The token predicates (`validAlgorithm`, `validTokenType`,
    /// `validIssuer`) consult `codec`.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        let mut engine = Self {
            predicates: HashMap::new(),
            codec: Arc::clone(&codec),
            unknown_rules: UnknownRulePolicy::default(),
        };

        engine.register("notEmptyString", |value| {
            value.as_str().is_some_and(|s| !s.trim().is_empty())
        });
        engine.register("integer", |value| value.is_i64() || value.is_u64());
        engine.register("validUnixTimestamp", |value| {
            parse_unix_timestamp(value).is_some()
        });
        engine.register("unexpiredTimestamp", |value| {
            parse_unix_timestamp(value).is_some_and(|ts| ts > Utc::now())
        });

        let c = Arc::clone(&codec);
        engine.register("validAlgorithm", move |value| c.is_valid_algorithm(value));
        let c = Arc::clone(&codec);
        engine.register("validTokenType", move |value| c.is_valid_token_type(value));
        let c = codec;
        engine.register("validIssuer", move |value| c.is_valid_issuer(value));

        engine
    }

    /// Sets how `<<name>>` references without a predicate are treated.
    #[must_use]
    pub fn with_unknown_rule_policy(mut self, policy: UnknownRulePolicy) -> Self {
        self.unknown_rules = policy;
        self
    }

    /// Adds a predicate under `name`, replacing any existing one.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_rule<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Returns whether a predicate is registered under `name`.
    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Returns the unknown-rule policy in effect.
    #[must_use]
    pub const fn unknown_rule_policy(&self) -> UnknownRulePolicy {
        self.unknown_rules
    }

    /// Returns the codec backing the token predicates.
    #[must_use]
    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Checks `value` of `field` against `rule`.
    pub fn apply(&self, value: &Value, rule: &Rule, field: &str) -> GatewayResult<()> {
        match rule {
            Rule::Nested => {
                if value.is_object() || value.is_array() {
                    Ok(())
                } else {
                    Err(GatewayError::bad_request(format!(
                        "{field} must be array/object"
                    )))
                }
            }
            Rule::Named(name) => match self.predicates.get(name) {
                Some(predicate) if predicate(value) => Ok(()),
                Some(_) => Err(GatewayError::bad_request(format!(
                    "'{field}' must be {}",
                    humanize(name)
                ))),
                None => match self.unknown_rules {
                    UnknownRulePolicy::Allow => {
                        warn!(rule = %name, field = %field, "unknown rule allowed by policy");
                        Ok(())
                    }
                    UnknownRulePolicy::Reject => Err(GatewayError::internal(format!(
                        "unknown rule '{name}' for '{field}'"
                    ))),
                },
            },
            Rule::Literal(expected) => {
                if loosely_equals(value, expected) {
                    Ok(())
                } else {
                    Err(GatewayError::bad_request(format!(
                        "'{field}' must be '{expected}'"
                    )))
                }
            }
        }
    }

    /// Verifies a token signature under `issuer`'s key.
    #[must_use]
    pub fn signature_matches(&self, signature: &str, signed_document: &str, issuer: &str) -> bool {
        self.codec.verify_signature(signed_document, signature, issuer)
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("RuleEngine")
            .field("predicates", &names)
            .field("unknown_rules", &self.unknown_rules)
            .finish_non_exhaustive()
    }
}

fn loosely_equals(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(text) => text == expected,
        Value::Number(_) | Value::Bool(_) => value.to_string() == expected,
        _ => false,
    }
}

/// Splits a camelCase rule name into lowercase words.
///
/// Runs of capitals stay together: `validJWTIssuer` becomes
/// `valid jwt issuer`.
#[must_use]
pub fn humanize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}
