//! Route splitting.

use covenant_core::{GatewayError, GatewayResult};

/// Splits a path into its root and resource, percent-decoding each segment.
///
/// Empty segments are skipped, so `//users///42/` is the same as `/users/42`.
/// A segment that decodes to invalid UTF-8 or to a string containing `/` is
/// a `BadRequest`.
///
/// # Example
///
/// ```
/// use covenant_extract::split_route;
///
/// assert_eq!(
///     split_route("/users/42/orders").unwrap(),
///     (Some("users".into()), Some("42/orders".into()))
/// );
/// assert_eq!(
///     split_route("/users/john%20doe").unwrap(),
///     (Some("users".into()), Some("john doe".into()))
/// );
/// assert_eq!(split_route("/").unwrap(), (None, None));
/// ```
pub fn split_route(path: &str) -> GatewayResult<(Option<String>, Option<String>)> {
    let mut segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode_segment);

    let root = segments.next().transpose()?;
    let rest = segments.collect::<GatewayResult<Vec<_>>>()?;
    let resource = if rest.is_empty() {
        None
    } else {
        Some(rest.join("/"))
    };
    Ok((root, resource))
}

fn decode_segment(segment: &str) -> GatewayResult<String> {
    let decoded = urlencoding::decode(segment).map_err(|e| {
        GatewayError::bad_request(format!("path segment '{segment}' is not UTF-8: {e}"))
    })?;
    if decoded.contains('/') {
        return Err(GatewayError::bad_request(format!(
            "path segment '{segment}' encodes a '/'"
        )));
    }
    Ok(decoded.into_owned())
}
