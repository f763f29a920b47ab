//! Parsed contract documents.
//!
//! A contract file has the shape:
//!
//! ```json
//! {
//!   "Request": {
//!     "Headers": {
//!       "X-Api-Version": "2",
//!       "Authorization": {
//!         "Header": { "alg": "<<validAlgorithm>>", "typ": "<<validTokenType>>" },
//!         "Payload": { "iss": "<<validIssuer>>", "exp": "<<validUnixTimestamp>>" }
//!       }
//!     },
//!     "Body": { "amount": "<<integer>>" }
//!   },
//!   "Response": { "status": "accepted" }
//! }
//! ```
//!
//! Missing members are empty mappings. Members that are present must be JSON
//! objects, and every rule must be a string, number, boolean, object or array.

use crate::error::{GatewayError, GatewayResult};
use bytes::Bytes;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Field name to rule, in contract order.
pub type FieldRules = IndexMap<String, Rule>;

const REQUEST: &str = "Request";
const RESPONSE: &str = "Response";
const HEADERS: &str = "Headers";
const BODY: &str = "Body";
const AUTHORIZATION: &str = "Authorization";
const JWT_HEADER: &str = "Header";
const JWT_PAYLOAD: &str = "Payload";

fn named_rule_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^<<([A-Za-z_][A-Za-z0-9_]*)>>$").expect("valid regex"))
}

/// A single validation directive attached to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `<<ruleName>>`: the value must satisfy the named predicate.
    Named(String),
    /// The value must equal this text.
    Literal(String),
    /// Placeholder for a nested object or array: only the shape is enforced.
    Nested,
}

impl Rule {
    /// Parses a rule from its string form.
    ///
    /// # Example
    ///
    /// ```
    /// use covenant_core::Rule;
    ///
    /// assert_eq!(Rule::parse("<<integer>>"), Rule::Named("integer".into()));
    /// assert_eq!(Rule::parse("v2"), Rule::Literal("v2".into()));
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        named_rule_pattern()
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map_or_else(
                || Self::Literal(text.to_string()),
                |name| Self::Named(name.as_str().to_string()),
            )
    }

    /// Builds a rule from a contract value.
    ///
    /// Numbers and booleans become literals of their JSON text.
    pub fn from_value(field: &str, value: &Value) -> GatewayResult<Self> {
        match value {
            Value::String(text) => Ok(Self::parse(text)),
            Value::Object(_) | Value::Array(_) => Ok(Self::Nested),
            Value::Number(_) | Value::Bool(_) => Ok(Self::Literal(value.to_string())),
            Value::Null => Err(GatewayError::internal(format!(
                "malformed contract: rule for '{field}' is null"
            ))),
        }
    }
}

/// Rules for the four field groups of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContract {
    /// Request headers, in contract spelling.
    pub headers: FieldRules,
    /// Top-level body fields.
    pub body: FieldRules,
    /// Claims of the JWT header segment.
    pub jwt_header: FieldRules,
    /// Claims of the JWT payload segment.
    pub jwt_payload: FieldRules,
}

/// A parsed contract file for one (method, root, resource).
#[derive(Debug, Clone)]
pub struct ContractDocument {
    raw: Bytes,
    request: RequestContract,
    response: Value,
}

impl ContractDocument {
    /// Parses a contract from the exact bytes of its file.
    pub fn from_slice(raw: impl Into<Bytes>) -> GatewayResult<Self> {
        let raw = raw.into();
        let document: Value = serde_json::from_slice(&raw)
            .map_err(|e| GatewayError::internal(format!("failed to parse contract JSON: {e}")))?;
        let top = as_object(&document, "contract")?;

        let empty = Map::new();
        let request = member(top, REQUEST)?.unwrap_or(&empty);
        let headers = member(request, HEADERS)?.unwrap_or(&empty);
        let auth = match headers.get(AUTHORIZATION) {
            Some(Value::Object(auth)) => Some(auth),
            _ => None,
        };

        let contract = RequestContract {
            headers: rules(headers)?,
            body: rules(member(request, BODY)?.unwrap_or(&empty))?,
            jwt_header: match auth {
                Some(auth) => rules(member(auth, JWT_HEADER)?.unwrap_or(&empty))?,
                None => FieldRules::new(),
            },
            jwt_payload: match auth {
                Some(auth) => rules(member(auth, JWT_PAYLOAD)?.unwrap_or(&empty))?,
                None => FieldRules::new(),
            },
        };

        Ok(Self {
            raw,
            request: contract,
            response: match top.get(RESPONSE) {
                None | Some(Value::Null) => Value::Object(Map::new()),
                Some(value) => value.clone(),
            },
        })
    }

    /// Returns the request rules.
    #[must_use]
    pub const fn request(&self) -> &RequestContract {
        &self.request
    }

    /// Returns the opaque `Response` member, an empty object when absent.
    #[must_use]
    pub const fn response(&self) -> &Value {
        &self.response
    }

    /// Returns the bytes this document was parsed from.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> GatewayResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        GatewayError::internal(format!("malformed contract: '{what}' must be an object"))
    })
}

fn member<'a>(
    parent: &'a Map<String, Value>,
    name: &str,
) -> GatewayResult<Option<&'a Map<String, Value>>> {
    match parent.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_object(value, name).map(Some),
    }
}

fn rules(group: &Map<String, Value>) -> GatewayResult<FieldRules> {
    group
        .iter()
        .map(|(field, value)| Ok((field.clone(), Rule::from_value(field, value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const FULL: &str = r#"{
        "Request": {
            "Headers": {
                "X-Api-Version": "2",
                "Authorization": {
                    "Header": {"alg": "<<validAlgorithm>>"},
                    "Payload": {"iss": "<<validIssuer>>", "exp": "<<validUnixTimestamp>>"}
                }
            },
            "Body": {"amount": "<<integer>>", "meta": {}, "retry": true}
        },
        "Response": {"status": "accepted"}
    }"#;

    #[test]
    fn test_parse_full_contract() {
        let doc = ContractDocument::from_slice(FULL.as_bytes().to_vec()).unwrap();
        let req = doc.request();

        assert_eq!(req.headers["X-Api-Version"], Rule::Literal("2".into()));
        assert_eq!(req.headers["Authorization"], Rule::Nested);
        assert_eq!(req.body["amount"], Rule::Named("integer".into()));
        assert_eq!(req.body["meta"], Rule::Nested);
        assert_eq!(req.body["retry"], Rule::Literal("true".into()));
        assert_eq!(req.jwt_header["alg"], Rule::Named("validAlgorithm".into()));
        assert_eq!(
            req.jwt_payload.keys().collect::<Vec<_>>(),
            vec!["iss", "exp"]
        );
        assert_eq!(doc.response(), &serde_json::json!({"status": "accepted"}));
        assert_eq!(doc.as_bytes(), FULL.as_bytes());
    }

    #[test]
    fn test_missing_members_are_empty() {
        let doc = ContractDocument::from_slice(&b"{}"[..]).unwrap();
        assert_eq!(doc.request(), &RequestContract::default());
        assert_eq!(doc.response(), &serde_json::json!({}));
    }

    #[test]
    fn test_invalid_json_is_internal_error() {
        let err = ContractDocument::from_slice(&b"{not json"[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.message().contains("failed to parse contract JSON"));
    }

    #[test]
    fn test_non_object_member_is_internal_error() {
        let err = ContractDocument::from_slice(&br#"{"Request": {"Body": []}}"#[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.message().contains("'Body'"));
    }

    #[test]
    fn test_null_rule_is_internal_error() {
        let err =
            ContractDocument::from_slice(&br#"{"Request": {"Body": {"x": null}}}"#[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }

    #[test]
    fn test_rule_parse_edge_cases() {
        assert_eq!(Rule::parse("<<>>"), Rule::Literal("<<>>".into()));
        assert_eq!(Rule::parse("<<integer"), Rule::Literal("<<integer".into()));
        assert_eq!(Rule::parse(" <<integer>>"), Rule::Literal(" <<integer>>".into()));
        assert_eq!(Rule::parse("<<notEmptyString>>"), Rule::Named("notEmptyString".into()));
    }
}
