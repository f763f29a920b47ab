//! Token error types.

use std::fmt;
use thiserror::Error;

/// Which claim segment of a token failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// The first segment.
    Header,
    /// The second segment.
    Payload,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Payload => "payload",
        })
    }
}

/// Errors raised while splitting or issuing a token.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token does not have exactly three segments.
    #[error("token must have 3 segments, found {found}")]
    Malformed {
        /// Number of `.`-separated segments found.
        found: usize,
    },

    /// A segment is not valid base64url.
    #[error("failed to decode JWT {0}")]
    Decode(Segment),

    /// A segment does not hold a JSON object.
    #[error("JWT {0} is not JSON")]
    NotJson(Segment),

    /// Claims could not be serialized.
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_segment() {
        assert_eq!(
            TokenError::Decode(Segment::Header).to_string(),
            "failed to decode JWT header"
        );
        assert_eq!(
            TokenError::NotJson(Segment::Payload).to_string(),
            "JWT payload is not JSON"
        );
        assert_eq!(
            TokenError::Malformed { found: 2 }.to_string(),
            "token must have 3 segments, found 2"
        );
    }
}
