//! # Text Encoding
//!
//! Every key and envelope byte sequence crosses the crate boundary as text.
//! Raw bytes use standard base64 (with padding); key pairs use PEM
//! containers, which callers may also hand over wrapped in one more layer of
//! base64.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ACCEPTED KEY CONTAINER FORMS                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  PEM                         "-----BEGIN PUBLIC KEY-----\nMIIB..."      │
//! │                                          │                              │
//! │  base64(PEM)                 "LS0tLS1CRUdJTi..."                       │
//! │        │                                 │                              │
//! │        └── decode ── starts with ────────┘                              │
//! │                      "-----BEGIN"?                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{Error, Result};

/// Prefix every PEM container starts with
pub const PEM_PREFIX: &str = "-----BEGIN";

/// Encode bytes as standard base64
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode standard base64 into bytes
///
/// Surrounding whitespace is ignored, so values copied from forms or
/// terminals decode cleanly.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(text.trim())?)
}

/// Check whether text is a PEM container (after trimming whitespace)
pub fn is_pem(text: &str) -> bool {
    text.trim_start().starts_with(PEM_PREFIX)
}

/// Normalize a key container to PEM text
///
/// Accepts either a PEM container or the base64 encoding of one.
pub fn normalize_container(text: &str) -> Result<String> {
    if is_pem(text) {
        return Ok(text.trim().to_string());
    }

    let bytes = decode(text)
        .map_err(|_| Error::InvalidKey("Key is neither PEM nor base64-encoded PEM".into()))?;
    let pem = String::from_utf8(bytes)
        .map_err(|_| Error::InvalidKey("Base64 key container is not UTF-8 text".into()))?;

    if !is_pem(&pem) {
        return Err(Error::InvalidKey(
            "Base64 key container does not contain a PEM block".into(),
        ));
    }

    Ok(pem.trim().to_string())
}

/// Wrap a PEM container in base64 (single-line transport form)
pub fn encode_container(pem: &str) -> String {
    encode(pem.as_bytes())
}

/// Serde helper for serializing byte vectors as base64
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s.trim()).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let samples: [&[u8]; 4] = [b"", b"\x00", b"hello world", &[0xFF; 33]];
        for bytes in samples {
            assert_eq!(decode(&encode(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode("  aGVsbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode("***").unwrap_err();
        assert!(matches!(err, Error::EncodingError(_)));
    }

    #[test]
    fn test_normalize_accepts_pem() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        assert_eq!(normalize_container(pem).unwrap(), pem.trim());
    }

    #[test]
    fn test_normalize_accepts_base64_pem() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----";
        let wrapped = encode_container(pem);
        assert!(!is_pem(&wrapped));
        assert_eq!(normalize_container(&wrapped).unwrap(), pem);
    }

    #[test]
    fn test_normalize_rejects_base64_of_non_pem() {
        let wrapped = encode(b"just some bytes");
        assert!(matches!(
            normalize_container(&wrapped),
            Err(Error::InvalidKey(_))
        ));
    }
}
