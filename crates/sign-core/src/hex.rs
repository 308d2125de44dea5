//! Hex text <-> byte conversion for request payloads and signing results.

use crate::error::{Error, Result};

/// Decode a hex string into bytes.
///
/// Accepts upper- and lowercase digits. Fails on odd length or any character
/// outside `[0-9a-fA-F]`.
///
/// # Examples
///
/// ```
/// use sign_core::hex::decode;
///
/// assert_eq!(decode("0102ab").unwrap(), vec![0x01, 0x02, 0xAB]);
/// assert!(decode("abc").is_err());
/// ```
pub fn decode(text: &str) -> Result<Vec<u8>> {
    ::hex::decode(text).map_err(|e| Error::InvalidEncoding(e.to_string()))
}

/// Encode bytes as uppercase hex, two characters per byte.
///
/// # Examples
///
/// ```
/// use sign_core::hex::encode;
///
/// assert_eq!(encode(&[0x01, 0x02, 0xAB]), "0102AB");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    ::hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mixed_case() {
        assert_eq!(decode("0102AB").unwrap(), vec![0x01, 0x02, 0xAB]);
        assert_eq!(decode("deadBEEF").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_odd_length() {
        assert!(matches!(decode("abc"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode("0"), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn test_decode_invalid_charset() {
        assert!(matches!(decode("xyz0"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode("0x01"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode("01 2"), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn test_encode_uppercase_in_order() {
        assert_eq!(encode(&[0x00, 0x0F, 0xF0, 0xFF]), "000FF0FF");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_roundtrip_all_byte_values() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_encode_normalizes_case() {
        let s = "a1b2c3d4e5f6";
        assert_eq!(encode(&decode(s).unwrap()), s.to_uppercase());
    }
}
