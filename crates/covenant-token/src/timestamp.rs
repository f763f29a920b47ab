use chrono::{DateTime, Utc};
use serde_json::Value;

/// Interprets a JSON value as Unix seconds.
///
/// Accepts integers, finite floats, and strings holding either. Returns `None`
/// for anything else or for instants chrono cannot represent.
///
/// # Example
///
/// ```
/// use covenant_token::parse_unix_timestamp;
/// use serde_json::json;
///
/// assert_eq!(parse_unix_timestamp(&json!(0)).unwrap().timestamp(), 0);
/// assert!(parse_unix_timestamp(&json!("1700000000")).is_some());
/// assert!(parse_unix_timestamp(&json!("tomorrow")).is_none());
/// ```
#[must_use]
pub fn parse_unix_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map_or_else(|| number.as_f64().and_then(from_float), from_seconds),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().map_or_else(
                || text.parse::<f64>().ok().and_then(from_float),
                from_seconds,
            )
        }
        _ => None,
    }
}

fn from_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_float(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds.abs() >= 9.2e18 {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_and_string_forms_agree() {
        let a = parse_unix_timestamp(&json!(1_700_000_000)).unwrap();
        let b = parse_unix_timestamp(&json!(" 1700000000 ")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_float_keeps_fraction() {
        let ts = parse_unix_timestamp(&json!(1.5)).unwrap();
        assert_eq!(ts.timestamp(), 1);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_negative_is_before_epoch() {
        let ts = parse_unix_timestamp(&json!(-60)).unwrap();
        assert_eq!(ts.timestamp(), -60);
    }

    #[test]
    fn test_rejects_non_timestamps() {
        assert!(parse_unix_timestamp(&json!(null)).is_none());
        assert!(parse_unix_timestamp(&json!(true)).is_none());
        assert!(parse_unix_timestamp(&json!("")).is_none());
        assert!(parse_unix_timestamp(&json!("NaN")).is_none());
        assert!(parse_unix_timestamp(&json!(i64::MAX)).is_none());
        assert!(parse_unix_timestamp(&json!({"exp": 1})).is_none());
    }
}
