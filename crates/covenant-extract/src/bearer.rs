use covenant_core::{Credential, GatewayError, GatewayResult, JsonMap};
use covenant_token::split_token;
use serde_json::Value;

use crate::headers::AUTHORIZATION_HEADER;

const BEARER_PREFIX: &str = "Bearer ";

/// Decodes the bearer token and masks the header it came from.
pub fn take_credential(headers: &mut JsonMap) -> GatewayResult<Credential> {
    let value = headers
        .get(AUTHORIZATION_HEADER)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::bad_request("authorization token not set"))?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| GatewayError::bad_request("unacceptable auth type"))?;

    let credential =
        split_token(token.trim()).map_err(|e| GatewayError::bad_request(e.to_string()))?;

    headers.insert(AUTHORIZATION_HEADER.to_string(), Value::Bool(true));
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(authorization: &str) -> JsonMap {
        let mut headers = JsonMap::new();
        headers.insert(AUTHORIZATION_HEADER.into(), json!(authorization));
        headers
    }

    #[test]
    fn test_masks_authorization() {
        let mut headers = headers("Bearer e30.eyJpc3MiOiJzdmNBIn0.c2ln");
        let credential = take_credential(&mut headers).unwrap();

        assert_eq!(credential.issuer(), "svcA");
        assert_eq!(credential.signed_document(), "e30.eyJpc3MiOiJzdmNBIn0");
        assert_eq!(credential.signature(), "c2ln");
        assert_eq!(headers[AUTHORIZATION_HEADER], json!(true));
    }

    #[test]
    fn test_missing_header() {
        let err = take_credential(&mut JsonMap::new()).unwrap_err();
        assert_eq!(err.message(), "authorization token not set");
    }

    #[test]
    fn test_wrong_scheme() {
        let err = take_credential(&mut headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(err.message(), "unacceptable auth type");
    }

    #[test]
    fn test_wrong_segment_count() {
        let err = take_credential(&mut headers("Bearer e30.e30")).unwrap_err();
        assert!(err.message().contains("3 segments"));
    }
}
