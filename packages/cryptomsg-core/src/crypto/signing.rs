//! # Digital Signatures
//!
//! RSA-PSS over SHA-256 (MGF1-SHA256, 32-byte random salt).
//!
//! ## Signature Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SIGNING FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Message ──► SHA-256 ──► PSS encode (random salt) ──► RSA private op    │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                            Signature (modulus bytes)    │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                       VERIFICATION FLOW                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Message ──► SHA-256 ──┐                                               │
//! │  Signature ──► RSA public op ──► PSS decode ──► compare ──► true/false │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Properties
//!
//! | Property | Description |
//! |----------|-------------|
//! | Probabilistic | Two signatures of one message differ, both verify |
//! | Fail closed | Malformed signature, wrong key, wrong message: all `false` |
//! | No oracle | Verification never reports *why* it failed |

use rand::rngs::OsRng;
use rsa::Pss;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::asymmetric::check_key_size;
use super::encoding::{self, base64_bytes};
use super::keys::{PrivateKey, PublicKey};
use crate::error::{Error, Result};
use crate::trace::{Artifact, NoTrace, TraceSink};

/// Hash applied to the message before signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256
    #[serde(rename = "SHA256")]
    Sha256,
}

/// Signature padding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureScheme {
    /// RSASSA-PSS
    #[serde(rename = "RSA-PSS")]
    RsaPss,
}

/// A detached signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Signature bytes (modulus length)
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    /// Signature scheme
    pub algorithm: SignatureScheme,
    /// Message hash
    pub hash: HashAlgorithm,
}

impl SignatureEnvelope {
    /// Wrap raw signature bytes (e.g. decoded from the text boundary)
    pub fn from_bytes(signature: Vec<u8>) -> Self {
        Self {
            signature,
            algorithm: SignatureScheme::RsaPss,
            hash: HashAlgorithm::Sha256,
        }
    }

    /// Signature as base64
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.signature)
    }
}

/// Sign `message` with RSA-PSS-SHA256
///
/// ## Example
///
/// ```ignore
/// let signature = sign(b"Hello, World!", &keypair.private)?;
/// assert!(verify(b"Hello, World!", &signature, &keypair.public)?);
/// ```
pub fn sign(message: &[u8], private_key: &PrivateKey) -> Result<SignatureEnvelope> {
    sign_with(message, private_key, &mut NoTrace)
}

/// [`sign`], reporting intermediate artifacts to `trace`
pub fn sign_with<T: TraceSink>(
    message: &[u8],
    private_key: &PrivateKey,
    trace: &mut T,
) -> Result<SignatureEnvelope> {
    check_key_size(private_key.size_bits())?;

    let digest = Sha256::digest(message);
    trace.record("Compute SHA-256 hash", || Artifact::hex(&digest));
    trace.record("Apply PSS padding", || {
        Artifact::info("PSS (Probabilistic Signature Scheme)")
            .with("details", "Adds a random salt so signatures are not deterministic")
    });

    let signature = private_key
        .rsa()
        .sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), &digest)
        .map_err(|e| Error::SigningFailed(e.to_string()))?;

    let preview = trace.preview_len();
    trace.record("Sign with private key", || {
        Artifact::hex_preview(&signature, preview)
    });
    trace.record("Encode as base64", || {
        Artifact::base64(encoding::encode(&signature))
    });

    tracing::debug!(
        "RSA-{}-PSS signed {} bytes",
        private_key.size_bits(),
        message.len()
    );
    Ok(SignatureEnvelope::from_bytes(signature))
}

/// Verify an RSA-PSS-SHA256 signature
///
/// ## Returns
///
/// `Ok(true)` if valid, `Ok(false)` for any malformed, mismatched or
/// foreign signature.
///
/// ## Errors
///
/// Only `UnsupportedKeySize`, raised before any verification work.
pub fn verify(
    message: &[u8],
    signature: &SignatureEnvelope,
    public_key: &PublicKey,
) -> Result<bool> {
    check_key_size(public_key.size_bits())?;

    if signature.signature.len() != public_key.size_bytes() {
        tracing::warn!("Signature verification failed");
        return Ok(false);
    }

    let digest = Sha256::digest(message);
    let valid = public_key
        .rsa()
        .verify(Pss::new::<Sha256>(), &digest, &signature.signature)
        .is_ok();

    if !valid {
        tracing::warn!("Signature verification failed");
    }
    Ok(valid)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ALICE, BOB, WEAK};
    use crate::trace::TraceRecorder;

    #[test]
    fn test_sign_verify() {
        let signature = sign(b"Hello, World!", &ALICE.private).unwrap();

        assert_eq!(signature.signature.len(), 256);
        assert!(verify(b"Hello, World!", &signature, &ALICE.public).unwrap());
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let signature = sign(b"Hello, World!", &ALICE.private).unwrap();
        assert!(!verify(b"Wrong message!", &signature, &ALICE.public).unwrap());
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let signature = sign(b"Hello, World!", &ALICE.private).unwrap();
        assert!(!verify(b"Hello, World!", &signature, &BOB.public).unwrap());
    }

    #[test]
    fn test_signatures_are_probabilistic() {
        let sig1 = sign(b"Hello, World!", &ALICE.private).unwrap();
        let sig2 = sign(b"Hello, World!", &ALICE.private).unwrap();

        assert_ne!(sig1.signature, sig2.signature);
        assert!(verify(b"Hello, World!", &sig1, &ALICE.public).unwrap());
        assert!(verify(b"Hello, World!", &sig2, &ALICE.public).unwrap());
    }

    #[test]
    fn test_malformed_signature_is_invalid_not_error() {
        let empty = SignatureEnvelope::from_bytes(Vec::new());
        assert!(!verify(b"msg", &empty, &ALICE.public).unwrap());

        let garbage = SignatureEnvelope::from_bytes(vec![0xFF; 256]);
        assert!(!verify(b"msg", &garbage, &ALICE.public).unwrap());

        let mut flipped = sign(b"msg", &ALICE.private).unwrap();
        flipped.signature[0] ^= 0x80;
        assert!(!verify(b"msg", &flipped, &ALICE.public).unwrap());
    }

    #[test]
    fn test_undersized_key_is_unsupported() {
        assert!(matches!(
            sign(b"msg", &WEAK.private),
            Err(Error::UnsupportedKeySize(1024))
        ));

        let signature = sign(b"msg", &ALICE.private).unwrap();
        assert!(matches!(
            verify(b"msg", &signature, &WEAK.public),
            Err(Error::UnsupportedKeySize(1024))
        ));
    }

    #[test]
    fn test_signature_serialization() {
        let signature = sign(b"test", &ALICE.private).unwrap();

        let json = serde_json::to_string(&signature).unwrap();
        assert!(json.contains("\"RSA-PSS\""));
        assert!(json.contains("\"SHA256\""));

        let restored: SignatureEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(signature, restored);
    }

    #[test]
    fn test_traced_sign_records_hash() {
        let mut recorder = TraceRecorder::new(64);
        let signature = sign_with(b"abc", &ALICE.private, &mut recorder).unwrap();
        let steps = recorder.steps();

        assert_eq!(
            steps[0].data,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(steps[3].data, signature.to_base64());
    }
}
