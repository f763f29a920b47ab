//! Canonicalization of complete HTTP requests.

use bytes::Bytes;
use covenant_config::ServiceConfig;
use covenant_core::{ErrorKind, RequestContext};
use covenant_extract::RequestCanonicalizer;
use covenant_token::{base64url, TokenCodec};
use serde_json::json;

fn issued_token() -> String {
    let codec = TokenCodec::new(ServiceConfig::new("gateway").with_issuer_key("svcA", "k1"));
    codec
        .issue_token(
            "svcA",
            json!({"alg": "HS256", "typ": "JWT"}).as_object().unwrap(),
            json!({"iss": "svcA", "exp": 4_102_444_800_i64}).as_object().unwrap(),
        )
        .unwrap()
}

fn canonicalize(builder: http::request::Builder, body: &'static str) -> covenant_core::GatewayResult<covenant_core::CanonicalRequest> {
    let request = builder.body(Bytes::from_static(body.as_bytes())).unwrap();
    RequestCanonicalizer::new().canonicalize(&request, &RequestContext::new())
}

#[test]
fn test_signed_document_is_kept_verbatim() {
    let token = issued_token();
    let canonical = canonicalize(
        http::Request::builder()
            .method("PUT")
            .uri("/users/42/orders")
            .header("Authorization", format!("Bearer {token}")),
        "",
    )
    .unwrap();

    let credential = canonical.credential();
    let mut segments = token.split('.');
    let header = segments.next().unwrap();
    let payload = segments.next().unwrap();
    let signature = segments.next().unwrap();

    assert_eq!(credential.signed_document(), format!("{header}.{payload}"));
    assert_eq!(credential.signature(), signature);
    assert_eq!(credential.header()["alg"], "HS256");
    assert_eq!(credential.payload()["iss"], "svcA");
    assert_eq!(canonical.resource(), "42/orders");
}

#[test]
fn test_missing_authorization_is_bad_request() {
    let err = canonicalize(http::Request::builder().uri("/users/42"), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.message().contains("authorization token not set"));
}

#[test]
fn test_undecodable_header_segment_is_named() {
    let err = canonicalize(
        http::Request::builder()
            .uri("/users/42")
            .header("Authorization", "Bearer %%%.e30.sig"),
        "",
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.message().ends_with("failed to decode JWT header"));
}

#[test]
fn test_non_json_payload_segment_is_named() {
    let payload = base64url::encode("iss=svcA");
    let err = canonicalize(
        http::Request::builder()
            .uri("/users/42")
            .header("Authorization", format!("Bearer e30.{payload}.sig")),
        "",
    )
    .unwrap_err();
    assert!(err.message().ends_with("JWT payload is not JSON"));
}

#[test]
fn test_lowercase_bearer_is_rejected() {
    let err = canonicalize(
        http::Request::builder()
            .uri("/users/42")
            .header("Authorization", format!("bearer {}", issued_token())),
        "",
    )
    .unwrap_err();
    assert!(err.message().contains("unacceptable auth type"));
}

#[test]
fn test_array_body_is_rejected() {
    let err = canonicalize(
        http::Request::builder()
            .method("POST")
            .uri("/orders/new")
            .header("Authorization", format!("Bearer {}", issued_token())),
        "[1, 2, 3]",
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}
