//! Token issuance and verification.

use chrono::{DateTime, Utc};
use covenant_config::ServiceConfig;
use covenant_core::{Credential, JsonMap};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::base64url;
use crate::error::{Segment, TokenError};
use crate::timestamp::parse_unix_timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies bearer tokens with per-issuer shared secrets.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    service: ServiceConfig,
}

impl TokenCodec {
    /// Creates a codec over a service configuration.
    #[must_use]
    pub fn new(service: ServiceConfig) -> Self {
        Self { service }
    }

    /// Returns the underlying service configuration.
    #[must_use]
    pub const fn service(&self) -> &ServiceConfig {
        &self.service
    }

    /// Issues a token signed with `issuer`'s key.
    ///
    /// An unknown issuer signs with the empty key; such a token will only
    /// verify against that same unknown issuer.
    pub fn issue_token(
        &self,
        issuer: &str,
        header: &JsonMap,
        payload: &JsonMap,
    ) -> Result<String, TokenError> {
        let signed_document = Self::signed_document(header, payload)?;
        let signature = self.sign(issuer, &signed_document);
        Ok(format!("{signed_document}.{signature}"))
    }

    /// Returns only the signature segment [`issue_token`](Self::issue_token)
    /// would produce.
    pub fn signature_for(
        &self,
        issuer: &str,
        header: &JsonMap,
        payload: &JsonMap,
    ) -> Result<String, TokenError> {
        Ok(self.sign(issuer, &Self::signed_document(header, payload)?))
    }

    /// Issues a token as this service.
    ///
    /// The header gets the configured `alg`/`typ`, and `iss` is set to the
    /// service's own issuer id unless the payload already carries one.
    pub fn issue_own_token(&self, mut payload: JsonMap) -> Result<String, TokenError> {
        let head = self.service.token_head();
        let mut header = JsonMap::new();
        header.insert("alg".to_string(), Value::String(head.alg.clone()));
        header.insert("typ".to_string(), Value::String(head.typ.clone()));

        let issuer = self.service.own_issuer().to_string();
        payload
            .entry("iss")
            .or_insert_with(|| Value::String(issuer.clone()));
        let issuer = payload
            .get("iss")
            .and_then(Value::as_str)
            .unwrap_or(&issuer)
            .to_string();

        self.issue_token(&issuer, &header, &payload)
    }

    /// Checks `signature` against the HMAC of `signed_document` under
    /// `issuer`'s key. The comparison runs in constant time.
    #[must_use]
    pub fn verify_signature(&self, signed_document: &str, signature: &str, issuer: &str) -> bool {
        let expected = self.sign(issuer, signed_document);
        let matches: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
        if !matches {
            debug!(issuer = %issuer, "token signature mismatch");
        }
        matches
    }

    /// Returns whether `value` equals the configured `alg`.
    #[must_use]
    pub fn is_valid_algorithm(&self, value: &Value) -> bool {
        value.as_str() == Some(self.service.token_head().alg.as_str())
    }

    /// Returns whether `value` equals the configured `typ`.
    #[must_use]
    pub fn is_valid_token_type(&self, value: &Value) -> bool {
        value.as_str() == Some(self.service.token_head().typ.as_str())
    }

    /// Returns whether `value` names an issuer with a configured key.
    #[must_use]
    pub fn is_valid_issuer(&self, value: &Value) -> bool {
        value
            .as_str()
            .is_some_and(|issuer| self.service.key_for(issuer).is_some())
    }

    /// Returns whether the claims carry an `exp` that is still in the future.
    #[must_use]
    pub fn is_token_unexpired(&self, claims: &JsonMap) -> bool {
        self.is_token_unexpired_at(claims, Utc::now())
    }

    /// Like [`is_token_unexpired`](Self::is_token_unexpired) with an explicit clock.
    #[must_use]
    pub fn is_token_unexpired_at(&self, claims: &JsonMap, now: DateTime<Utc>) -> bool {
        claims
            .get("exp")
            .and_then(parse_unix_timestamp)
            .is_some_and(|expires| expires > now)
    }

    /// Returns the configured `alg`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.service.token_head().alg
    }

    /// Returns the configured `typ`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.service.token_head().typ
    }

    /// Returns this service's own issuer id.
    #[must_use]
    pub fn own_issuer(&self) -> &str {
        self.service.own_issuer()
    }

    fn signed_document(header: &JsonMap, payload: &JsonMap) -> Result<String, TokenError> {
        let header = base64url::encode(serde_json::to_vec(header)?);
        let payload = base64url::encode(serde_json::to_vec(payload)?);
        Ok(format!("{header}.{payload}"))
    }

    fn sign(&self, issuer: &str, signed_document: &str) -> String {
        let key = self.service.key_for(issuer).unwrap_or_default();
        let mut mac =
            HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
        mac.update(signed_document.as_bytes());
        base64url::encode(mac.finalize().into_bytes())
    }
}

/// Splits a raw `header.payload.signature` token into a [`Credential`].
///
/// The first two segments are kept verbatim as the signed document.
pub fn split_token(token: &str) -> Result<Credential, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(TokenError::Malformed {
            found: segments.len(),
        });
    };

    Ok(Credential::new(
        decode_claims(header, Segment::Header)?,
        decode_claims(payload, Segment::Payload)?,
        format!("{header}.{payload}"),
        *signature,
    ))
}

fn decode_claims(segment: &str, which: Segment) -> Result<JsonMap, TokenError> {
    let bytes = base64url::decode(segment).map_err(|_| TokenError::Decode(which))?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        _ => Err(TokenError::NotJson(which)),
    }
}
