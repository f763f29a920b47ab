//! URL-safe base64 without padding.
//!
//! Encoding never emits `=`; decoding accepts input with or without it.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::{DecodeError, Engine as _};

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes with the URL-safe alphabet, unpadded.
///
/// # Example
///
/// ```
/// assert_eq!(covenant_token::base64url::encode(b"\xfb\xff"), "-_8");
/// ```
#[must_use]
pub fn encode(input: impl AsRef<[u8]>) -> String {
    ENGINE.encode(input)
}

/// Decodes URL-safe base64, padded or not.
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    ENGINE.decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_strips_padding() {
        assert_eq!(encode(b"a"), "YQ");
        assert_eq!(encode(b"ab"), "YWI");
        assert_eq!(encode(b"abc"), "YWJj");
    }

    #[test]
    fn test_decode_tolerates_padding() {
        assert_eq!(decode("YQ").unwrap(), b"a");
        assert_eq!(decode("YQ==").unwrap(), b"a");
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(decode("+/8").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = encode(&bytes);
            prop_assert!(!encoded.contains(['=', '+', '/']));
            prop_assert_eq!(decode(&encoded).unwrap(), bytes);
        }
    }
}
