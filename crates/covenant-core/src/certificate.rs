//! The sealed output of a successful validation.

use crate::contract::{ContractDocument, FieldRules};
use crate::request::{CanonicalRequest, JsonMap};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

/// A contract-scoped snapshot of a validated request.
///
/// Holds only the fields the resolved contract named, plus the contract's
/// opaque `Response` member. There is no way back to the raw request.
///
/// Serializes as:
///
/// ```json
/// {
///   "Request": {"Method": "get", "Root": "users", "Resource": "42", "Headers": {}, "Body": {}},
///   "JWT": {"Head": {}, "Payload": {}},
///   "Response": {}
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    method: String,
    root: String,
    resource: String,
    headers: JsonMap,
    body: JsonMap,
    jwt_header: JsonMap,
    jwt_payload: JsonMap,
    response: Value,
}

impl Certificate {
    /// Projects `request` onto the fields `contract` names.
    ///
    /// Called by the contract validator once every check has passed. Header
    /// names keep the contract's spelling; fields the request lacks are
    /// left out.
    #[doc(hidden)]
    #[must_use]
    pub fn seal(contract: &ContractDocument, request: &CanonicalRequest) -> Self {
        let rules = contract.request();
        let credential = request.credential();

        let headers = rules
            .headers
            .keys()
            .filter_map(|name| request.header(name).map(|v| (name.clone(), v.clone())))
            .collect();

        Self {
            method: request.method().to_string(),
            root: request.root().to_string(),
            resource: request.resource().to_string(),
            headers,
            body: project(&rules.body, request.body()),
            jwt_header: project(&rules.jwt_header, credential.header()),
            jwt_payload: project(&rules.jwt_payload, credential.payload()),
            response: contract.response().clone(),
        }
    }

    /// Returns the lower-cased method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the route root.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the resource.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the approved headers, keyed as the contract spells them.
    #[must_use]
    pub const fn headers(&self) -> &JsonMap {
        &self.headers
    }

    /// Returns the approved body fields.
    #[must_use]
    pub const fn body(&self) -> &JsonMap {
        &self.body
    }

    /// Returns the approved JWT header claims.
    #[must_use]
    pub const fn jwt_header(&self) -> &JsonMap {
        &self.jwt_header
    }

    /// Returns the approved JWT payload claims.
    #[must_use]
    pub const fn jwt_payload(&self) -> &JsonMap {
        &self.jwt_payload
    }

    /// Returns the contract's `Response` member, unmodified.
    #[must_use]
    pub const fn response(&self) -> &Value {
        &self.response
    }
}

impl Serialize for Certificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct RequestView<'a>(&'a Certificate);
        impl Serialize for RequestView<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut state = serializer.serialize_struct("Request", 5)?;
                state.serialize_field("Method", &self.0.method)?;
                state.serialize_field("Root", &self.0.root)?;
                state.serialize_field("Resource", &self.0.resource)?;
                state.serialize_field("Headers", &self.0.headers)?;
                state.serialize_field("Body", &self.0.body)?;
                state.end()
            }
        }

        struct JwtView<'a>(&'a Certificate);
        impl Serialize for JwtView<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut state = serializer.serialize_struct("JWT", 2)?;
                state.serialize_field("Head", &self.0.jwt_header)?;
                state.serialize_field("Payload", &self.0.jwt_payload)?;
                state.end()
            }
        }

        let mut state = serializer.serialize_struct("Certificate", 3)?;
        state.serialize_field("Request", &RequestView(self))?;
        state.serialize_field("JWT", &JwtView(self))?;
        state.serialize_field("Response", &self.response)?;
        state.end()
    }
}

fn project(rules: &FieldRules, source: &JsonMap) -> JsonMap {
    rules
        .keys()
        .filter_map(|name| source.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}
