use covenant_core::{GatewayError, GatewayResult, JsonMap};
use serde_json::Value;

/// Parses a request body. Blank bodies are an empty mapping.
pub fn parse(raw: &[u8]) -> GatewayResult<JsonMap> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonMap::new());
    }
    match serde_json::from_slice(raw) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(_) => Err(GatewayError::bad_request(
            "request body must be a JSON object",
        )),
        Err(_) => Err(GatewayError::bad_request("request body is not JSON")),
    }
}
