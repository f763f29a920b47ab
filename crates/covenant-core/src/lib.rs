//! # Covenant Core
//!
//! Core types shared by every stage of the Covenant gateway.
//!
//! - [`GatewayError`] / [`ErrorKind`] - the failure taxonomy and its HTTP mapping
//! - [`ContractDocument`] / [`Rule`] - parsed contract files
//! - [`CanonicalRequest`] / [`Credential`] - the immutable view of an inbound request
//! - [`Certificate`] - the sealed, contract-scoped projection handed to business logic
//! - [`RequestContext`] / [`RequestId`] - per-request bookkeeping at the transport boundary

#![doc(html_root_url = "https://docs.rs/covenant-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod certificate;
pub mod contract;
mod context;
mod error;
mod request;

pub use certificate::Certificate;
pub use context::{RequestContext, RequestId};
pub use contract::{ContractDocument, FieldRules, RequestContract, Rule};
pub use error::{ClientError, ErrorEnvelope, ErrorKind, GatewayError, GatewayResult};
pub use request::{CanonicalRequest, Credential, JsonMap, UNKNOWN};
