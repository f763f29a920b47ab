//! # Covenant Extract
//!
//! Turns a transport-level HTTP request into the immutable
//! [`CanonicalRequest`](covenant_core::CanonicalRequest) every later stage
//! works from.
//!
//! | Part | Source | Rule |
//! |------|--------|------|
//! | method | request line | lower-cased, `__unknown__` when empty |
//! | root | first path segment | `__unknown__` when absent |
//! | resource | remaining path segments | joined with `/`, `__unknown__` when absent |
//! | headers | header map | names lower-cased, repeated values joined with `, ` |
//! | body | raw bytes | empty, or a JSON object |
//! | credential | `Authorization: Bearer ...` | three base64url segments |
//! | secure | TLS, or trusted `X-Forwarded-*` | |
//!
//! After the credential is decoded the `authorization` header value is
//! replaced with `true`, so the raw bearer token is never handed on.

#![doc(html_root_url = "https://docs.rs/covenant-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bearer;
mod body;
mod canonical;
pub mod headers;
mod route;

pub use canonical::RequestCanonicalizer;
pub use route::split_route;
