//! # Covenant Token
//!
//! Issuance and verification of the gateway's three-segment bearer tokens:
//! `base64url(header) . base64url(payload) . base64url(HMAC-SHA256)`.
//!
//! The signing key is looked up by issuer in the manifest's
//! [`ServiceConfig`](covenant_config::ServiceConfig). A [`TokenCodec`] is
//! immutable once built and is shared between requests behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use covenant_config::ServiceConfig;
//! use covenant_token::{split_token, TokenCodec};
//! use serde_json::json;
//!
//! let codec = TokenCodec::new(ServiceConfig::new("gateway").with_issuer_key("svcA", "k1"));
//!
//! let header = json!({"alg": "HS256", "typ": "JWT"});
//! let payload = json!({"iss": "svcA", "exp": 4_102_444_800_i64});
//! let token = codec
//!     .issue_token("svcA", header.as_object().unwrap(), payload.as_object().unwrap())
//!     .unwrap();
//!
//! let credential = split_token(&token).unwrap();
//! assert!(codec.verify_signature(credential.signed_document(), credential.signature(), "svcA"));
//! ```

#![doc(html_root_url = "https://docs.rs/covenant-token/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod base64url;
mod codec;
mod error;
mod timestamp;

pub use codec::{split_token, TokenCodec};
pub use error::{Segment, TokenError};
pub use timestamp::parse_unix_timestamp;
