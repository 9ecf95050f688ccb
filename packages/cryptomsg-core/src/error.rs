//! # Error Handling
//!
//! Error types for every operation in the crate.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Parameter Errors (checked before any cryptographic work)          │
//! │  │   ├── InvalidParameter      - Bad size or configuration value       │
//! │  │   └── MissingKeyMaterial    - Mode needs a key that wasn't given    │
//! │  │                                                                      │
//! │  ├── Key Errors                                                        │
//! │  │   ├── InvalidKeyLength      - AES key not 16/24/32 bytes            │
//! │  │   ├── KeyTypeMismatch       - Public container used as private...  │
//! │  │   ├── InvalidKey            - Unparseable key container             │
//! │  │   ├── UnsupportedKeySize    - RSA modulus not 2048/3072/4096        │
//! │  │   └── KeyGenerationFailed   - RNG / prime search failure            │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── PlaintextTooLarge     - Over the OAEP size bound              │
//! │  │   ├── EncryptionFailed      - Encryption operation failed           │
//! │  │   ├── DecryptionFailed      - ANY decrypt-path failure (generic)    │
//! │  │   └── SigningFailed         - Signing operation failed              │
//! │  │                                                                      │
//! │  └── Encoding Errors                                                   │
//! │      ├── EncodingError         - Invalid base64 / UTF-8 input          │
//! │      ├── SerializationError    - JSON encoding failed                  │
//! │      └── DeserializationError  - JSON decoding failed                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decryption Failures Are Opaque
//!
//! `DecryptionFailed` carries no payload. Bad PKCS#7 padding, a bad OAEP
//! block, a wrong key, a truncated ciphertext and a failed hybrid key unwrap
//! all produce the same value, so a caller that relays errors to a peer
//! cannot be turned into a padding oracle.
//!
//! Signature verification never produces an error for a bad signature; it
//! returns `false`.

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Parameter Errors (100-199)
    // ========================================================================

    /// A size or configuration value is outside its allowed set
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The selected mode requires key material that was not supplied
    #[error("Missing key material: {0} is required for this mode")]
    MissingKeyMaterial(&'static str),

    // ========================================================================
    // Key Errors (200-299)
    // ========================================================================

    /// Symmetric key is not 16, 24 or 32 bytes long
    #[error("Invalid key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    /// A key container holds the wrong kind of key
    #[error("Key type mismatch: expected a {expected} key, found a {found} key")]
    KeyTypeMismatch {
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind declared by the container
        found: &'static str,
    },

    /// Key container could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// RSA modulus size outside 2048/3072/4096 bits
    #[error("Unsupported key size: {0} bits (expected 2048, 3072 or 4096)")]
    UnsupportedKeySize(usize),

    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Plaintext exceeds what OAEP can carry for this key
    #[error("Plaintext too large: {size} bytes (max {max} bytes for a {key_size_bits}-bit key)")]
    PlaintextTooLarge {
        /// Length of the rejected plaintext
        size: usize,
        /// Largest plaintext the key accepts
        max: usize,
        /// Modulus size of the key
        key_size_bits: usize,
    },

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    // ========================================================================
    // Encoding Errors (900-999)
    // ========================================================================

    /// Text encoding (base64, UTF-8, PEM framing) is invalid
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Parameters
    /// - 200-299: Keys
    /// - 300-399: Crypto
    /// - 900-999: Encoding
    pub fn code(&self) -> i32 {
        match self {
            // Parameters (100-199)
            Error::InvalidParameter(_) => 100,
            Error::MissingKeyMaterial(_) => 101,

            // Keys (200-299)
            Error::InvalidKeyLength(_) => 200,
            Error::KeyTypeMismatch { .. } => 201,
            Error::InvalidKey(_) => 202,
            Error::UnsupportedKeySize(_) => 203,
            Error::KeyGenerationFailed(_) => 204,

            // Crypto (300-399)
            Error::PlaintextTooLarge { .. } => 300,
            Error::EncryptionFailed(_) => 301,
            Error::DecryptionFailed => 302,
            Error::SigningFailed(_) => 303,

            // Encoding (900-999)
            Error::EncodingError(_) => 900,
            Error::SerializationError(_) => 901,
            Error::DeserializationError(_) => 902,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can be resolved by calling again with different
    /// input. Decrypt-path failures are terminal: the same ciphertext and
    /// key will fail the same way every time.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter(_)
                | Error::MissingKeyMaterial(_)
                | Error::KeyTypeMismatch { .. }
                | Error::PlaintextTooLarge { .. }
                | Error::KeyGenerationFailed(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::EncodingError(format!("Invalid base64: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::InvalidParameter("test".into()).code(), 100);
        assert_eq!(Error::InvalidKeyLength(7).code(), 200);
        assert_eq!(Error::DecryptionFailed.code(), 302);
        assert_eq!(Error::EncodingError("test".into()).code(), 900);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::MissingKeyMaterial("recipient public key").is_recoverable());
        assert!(Error::PlaintextTooLarge {
            size: 191,
            max: 190,
            key_size_bits: 2048
        }
        .is_recoverable());
        assert!(!Error::DecryptionFailed.is_recoverable());
        assert!(!Error::InvalidKeyLength(10).is_recoverable());
    }

    #[test]
    fn test_decryption_failed_message_is_generic() {
        assert_eq!(Error::DecryptionFailed.to_string(), "Decryption failed");
    }

    #[test]
    fn test_plaintext_too_large_reports_maximum() {
        let err = Error::PlaintextTooLarge {
            size: 191,
            max: 190,
            key_size_bits: 2048,
        };
        let message = err.to_string();
        assert!(message.contains("191"));
        assert!(message.contains("190"));
        assert!(message.contains("2048"));
    }

    #[test]
    fn test_base64_error_conversion() {
        use base64::Engine;
        let err: Error = base64::engine::general_purpose::STANDARD
            .decode("not base64!!")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), 900);
    }
}
