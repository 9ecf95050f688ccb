//! # Asymmetric Encryption
//!
//! RSA with OAEP padding (SHA-256 for both the label hash and MGF1).
//!
//! ## Size Bound
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      OAEP PLAINTEXT CAPACITY                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  max = modulus_bytes - 2 × hash_len - 2      (hash_len = 32)           │
//! │                                                                         │
//! │  ┌──────────────┬────────────────┬────────────────────┐                │
//! │  │ Modulus      │ Modulus bytes  │ Max plaintext      │                │
//! │  ├──────────────┼────────────────┼────────────────────┤                │
//! │  │ 2048 bits    │ 256            │ 190 bytes          │                │
//! │  │ 3072 bits    │ 384            │ 318 bytes          │                │
//! │  │ 4096 bits    │ 512            │ 446 bytes          │                │
//! │  └──────────────┴────────────────┴────────────────────┘                │
//! │                                                                         │
//! │  Longer payloads are rejected, never truncated or chunked. Use the     │
//! │  hybrid mode for arbitrary-length messages.                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! OAEP mixes a random seed into every block, so encrypting the same
//! plaintext twice gives two different ciphertexts. Any decryption failure
//! is the single opaque [`Error::DecryptionFailed`].

use rand::rngs::OsRng;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::encoding::{self, base64_bytes};
use super::keys::{PrivateKey, PublicKey, KEY_PAIR_SIZES};
use crate::error::{Error, Result};
use crate::trace::{Artifact, NoTrace, TraceSink};

/// SHA-256 output length in bytes
pub const HASH_LEN: usize = 32;

/// Bytes OAEP-SHA256 adds to every block
pub const OAEP_OVERHEAD: usize = 2 * HASH_LEN + 2;

/// Characters of the public key PEM shown in traces
const PEM_PREVIEW_CHARS: usize = 80;

/// Padding scheme used for RSA encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsymmetricPadding {
    /// OAEP with SHA-256 and MGF1-SHA256
    #[serde(rename = "OAEP-SHA256")]
    OaepSha256,
}

/// Result of asymmetric encryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsymmetricEnvelope {
    /// RSA ciphertext (modulus-length bytes)
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    /// Padding scheme
    pub padding: AsymmetricPadding,
    /// Modulus size of the recipient key in bits
    pub key_size: usize,
}

impl AsymmetricEnvelope {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::DeserializationError(e.to_string()))
    }
}

/// Largest plaintext OAEP-SHA256 accepts for a modulus of `key_size_bytes`
pub fn max_plaintext_len(key_size_bytes: usize) -> usize {
    key_size_bytes.saturating_sub(OAEP_OVERHEAD)
}

/// Fail with `UnsupportedKeySize` unless the modulus is 2048/3072/4096 bits
pub fn check_key_size(size_bits: usize) -> Result<()> {
    if KEY_PAIR_SIZES.contains(&size_bits) {
        Ok(())
    } else {
        Err(Error::UnsupportedKeySize(size_bits))
    }
}

/// Encrypt a short plaintext to `public_key`
///
/// ## Errors
///
/// - `UnsupportedKeySize` if the key is not 2048/3072/4096 bits
/// - `PlaintextTooLarge` (with the computed maximum) if the plaintext
///   exceeds the OAEP bound
pub fn encrypt(plaintext: &[u8], public_key: &PublicKey) -> Result<AsymmetricEnvelope> {
    encrypt_with(plaintext, public_key, &mut NoTrace)
}

/// [`encrypt`], reporting intermediate artifacts to `trace`
pub fn encrypt_with<T: TraceSink>(
    plaintext: &[u8],
    public_key: &PublicKey,
    trace: &mut T,
) -> Result<AsymmetricEnvelope> {
    let key_size = public_key.size_bits();
    check_key_size(key_size)?;

    let max = max_plaintext_len(public_key.size_bytes());
    if plaintext.len() > max {
        tracing::warn!(
            "Rejected {}-byte plaintext for {}-bit key (max {})",
            plaintext.len(),
            key_size,
            max
        );
        return Err(Error::PlaintextTooLarge {
            size: plaintext.len(),
            max,
            key_size_bits: key_size,
        });
    }

    trace.record("RSA public key", || {
        public_key
            .to_pem()
            .map(|pem| Artifact::pem_preview(&pem, PEM_PREVIEW_CHARS))
            .unwrap_or_else(|e| Artifact::info(e.to_string()))
            .with("key_size", key_size)
    });
    trace.record("Apply OAEP padding", || {
        Artifact::info("OAEP (Optimal Asymmetric Encryption Padding) with SHA-256")
            .with("details", "Adds randomness so equal plaintexts encrypt differently")
            .with("max_plaintext", max)
    });

    let ciphertext = public_key
        .rsa()
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

    let preview = trace.preview_len();
    trace.record("Encrypt with RSA", || Artifact::hex_preview(&ciphertext, preview));
    trace.record("Encode as base64", || {
        Artifact::base64(encoding::encode(&ciphertext))
    });

    tracing::debug!(
        "RSA-{}-OAEP encrypted {} bytes",
        key_size,
        plaintext.len()
    );

    Ok(AsymmetricEnvelope {
        ciphertext,
        padding: AsymmetricPadding::OaepSha256,
        key_size,
    })
}

/// Decrypt an OAEP envelope with `private_key`
///
/// ## Errors
///
/// - `UnsupportedKeySize` if the private key is not 2048/3072/4096 bits
/// - `DecryptionFailed` for every other failure: wrong key, malformed or
///   tampered ciphertext, bad padding, size mismatch
pub fn decrypt(envelope: &AsymmetricEnvelope, private_key: &PrivateKey) -> Result<Vec<u8>> {
    let key_size = private_key.size_bits();
    check_key_size(key_size)?;

    if envelope.key_size != key_size || envelope.ciphertext.len() != key_size / 8 {
        return Err(Error::DecryptionFailed);
    }

    let plaintext = private_key
        .rsa()
        .decrypt(Oaep::new::<Sha256>(), &envelope.ciphertext)
        .map_err(|_| Error::DecryptionFailed)?;

    tracing::debug!("RSA-{}-OAEP decrypted {} bytes", key_size, plaintext.len());
    Ok(plaintext)
}

// ============================================================================
// TESTS
// ============================================================================
