//! Per-request contract validation.

use std::fmt;
use std::sync::Arc;

use covenant_core::{
    CanonicalRequest, Certificate, ContractDocument, FieldRules, GatewayError, GatewayResult,
    JsonMap,
};
use serde_json::Value;
use tracing::debug;

use crate::manifest::ManifestResolver;
use crate::rules::RuleEngine;

const AUTHORIZATION: &str = "authorization";

/// How far a request has progressed through validation.
///
/// States only move forward; the first failure leaves the validator at the
/// last state it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationState {
    /// Canonicalized, nothing checked yet.
    Parsed,
    /// A contract was found for the request's route.
    ContractResolved,
    /// Contract headers are present and valid.
    HeadersValidated,
    /// Contract body fields are present and valid.
    BodyValidated,
    /// Contract JWT header claims are present and valid.
    JwtHeaderValidated,
    /// Contract JWT payload claims are present and valid.
    JwtPayloadValidated,
    /// The token signature and claims check out.
    Authenticated,
    /// A certificate has been sealed.
    Certified,
}

impl ValidationState {
    /// Returns a snake_case name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::ContractResolved => "contract_resolved",
            Self::HeadersValidated => "headers_validated",
            Self::BodyValidated => "body_validated",
            Self::JwtHeaderValidated => "jwt_header_validated",
            Self::JwtPayloadValidated => "jwt_payload_validated",
            Self::Authenticated => "authenticated",
            Self::Certified => "certified",
        }
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Group {
    Headers,
    Body,
    JwtHeader,
    JwtPayload,
}

impl Group {
    fn missing(self, field: &str) -> GatewayError {
        match self {
            Self::Headers => GatewayError::bad_request(format!("header {field} is missing")),
            Self::Body => GatewayError::bad_request(format!("body variable \"{field}\" is missing")),
            Self::JwtHeader => {
                GatewayError::unauthorized(format!("JWT header variable \"{field}\" is missing"))
            }
            Self::JwtPayload => {
                GatewayError::unauthorized(format!("JWT body variable \"{field}\" is missing"))
            }
        }
    }

    const fn reached(self) -> ValidationState {
        match self {
            Self::Headers => ValidationState::HeadersValidated,
            Self::Body => ValidationState::BodyValidated,
            Self::JwtHeader => ValidationState::JwtHeaderValidated,
            Self::JwtPayload => ValidationState::JwtPayloadValidated,
        }
    }
}

/// Validates one canonical request against its contract and seals a
/// [`Certificate`].
///
/// A validator is built for a single request and discarded afterwards.
#[derive(Debug)]
pub struct ContractValidator {
    resolver: ManifestResolver,
    rules: Arc<RuleEngine>,
    contract: Option<ContractDocument>,
    state: ValidationState,
}

impl ContractValidator {
    /// Creates a validator over an opened manifest.
    #[must_use]
    pub fn new(resolver: ManifestResolver, rules: Arc<RuleEngine>) -> Self {
        Self {
            resolver,
            rules,
            contract: None,
            state: ValidationState::Parsed,
        }
    }

    /// Returns the last state reached.
    #[must_use]
    pub const fn state(&self) -> ValidationState {
        self.state
    }

    /// Returns the resolved contract, once there is one.
    #[must_use]
    pub const fn contract(&self) -> Option<&ContractDocument> {
        self.contract.as_ref()
    }

    /// Resolves the request's contract and checks all four field groups.
    pub async fn resolve_and_validate(&mut self, request: &CanonicalRequest) -> GatewayResult<()> {
        let contract = self
            .resolver
            .resolve(request.method(), request.root(), request.resource())
            .await?;
        self.state = ValidationState::ContractResolved;

        let rules = contract.request();
        self.validate_group(Group::Headers, &rules.headers, |name| {
            request.header(name)
        })?;
        self.validate_group(Group::Body, &rules.body, |name| request.body().get(name))?;
        self.validate_group(Group::JwtHeader, &rules.jwt_header, |name| {
            request.credential().header().get(name)
        })?;
        self.validate_group(Group::JwtPayload, &rules.jwt_payload, |name| {
            request.credential().payload().get(name)
        })?;

        self.contract = Some(contract);
        Ok(())
    }

    /// Verifies the bearer token: signature first, then issuer, `alg`,
    /// `typ` and `exp`.
    pub fn authenticate(&mut self, request: &CanonicalRequest) -> GatewayResult<()> {
        if self.state != ValidationState::JwtPayloadValidated {
            return Err(GatewayError::internal(format!(
                "cannot authenticate from state {}",
                self.state
            )));
        }

        let credential = request.credential();
        let issuer = credential.issuer();
        if !self
            .rules
            .signature_matches(credential.signature(), credential.signed_document(), issuer)
        {
            return Err(GatewayError::unauthorized("failed to authenticate request"));
        }

        let codec = self.rules.codec();
        if !codec.is_valid_issuer(&Value::String(issuer.to_string())) {
            return Err(GatewayError::unauthorized(format!("unknown issuer '{issuer}'")));
        }
        if !claim_satisfies(credential.header(), "alg", |v| codec.is_valid_algorithm(v)) {
            return Err(GatewayError::unauthorized("unexpected token algorithm"));
        }
        if !claim_satisfies(credential.header(), "typ", |v| codec.is_valid_token_type(v)) {
            return Err(GatewayError::unauthorized("unexpected token type"));
        }
        if !codec.is_token_unexpired(credential.payload()) {
            return Err(GatewayError::unauthorized("token expired"));
        }

        self.state = ValidationState::Authenticated;
        Ok(())
    }

    /// Projects exactly the contract-named fields into a certificate.
    pub fn seal(&mut self, request: &CanonicalRequest) -> GatewayResult<Certificate> {
        let contract = match (&self.contract, self.state) {
            (Some(contract), ValidationState::Authenticated) => contract,
            _ => {
                return Err(GatewayError::internal(format!(
                    "cannot seal from state {}",
                    self.state
                )))
            }
        };
        let certificate = Certificate::seal(contract, request);
        self.state = ValidationState::Certified;
        Ok(certificate)
    }

    /// Runs the whole pipeline.
    ///
    /// Failures keep their kind and are prefixed `failed to validate request`.
    pub async fn certify(mut self, request: &CanonicalRequest) -> GatewayResult<Certificate> {
        let result = async {
            self.resolve_and_validate(request).await?;
            self.authenticate(request)?;
            self.seal(request)
        }
        .await;

        match result {
            Ok(certificate) => {
                debug!(
                    method = %certificate.method(),
                    root = %certificate.root(),
                    resource = %certificate.resource(),
                    "request certified"
                );
                Ok(certificate)
            }
            Err(e) => {
                debug!(state = %self.state, kind = %e.kind(), "validation stopped");
                Err(e.context("failed to validate request"))
            }
        }
    }

    fn validate_group<'r>(
        &mut self,
        group: Group,
        rules: &FieldRules,
        lookup: impl Fn(&str) -> Option<&'r Value>,
    ) -> GatewayResult<()> {
        for (field, rule) in rules {
            let value = lookup(field)
                .filter(|v| !v.is_null())
                .ok_or_else(|| group.missing(field))?;

            if matches!(group, Group::Headers) && field.eq_ignore_ascii_case(AUTHORIZATION) {
                continue;
            }
            self.rules.apply(value, rule, field)?;
        }
        self.state = group.reached();
        Ok(())
    }
}

fn claim_satisfies(claims: &JsonMap, name: &str, check: impl Fn(&Value) -> bool) -> bool {
    claims.get(name).is_some_and(check)
}
