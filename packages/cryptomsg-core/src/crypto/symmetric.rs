//! # Symmetric Encryption
//!
//! AES in CBC mode with PKCS#7 padding.
//!
//! ## Encryption Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SYMMETRIC ENCRYPTION FLOW                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Step 1: Pad (PKCS#7)                                                  │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  "hello world" (11 bytes)                                    │       │
//! │  │           ↓                                                  │       │
//! │  │  "hello world" 05 05 05 05 05 (16 bytes)                     │       │
//! │  │  (N bytes of value N; a full block of 0x10 when aligned)     │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 2: Generate IV (fresh for every call)                            │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  16 random bytes from the OS CSPRNG                          │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 3: AES-CBC                                                       │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  C[0] = AES(key, P[0] ⊕ IV)                                  │       │
//! │  │  C[i] = AES(key, P[i] ⊕ C[i-1])                              │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Output: CipherEnvelope { iv, ciphertext, key_size, padding }          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Padding Failures
//!
//! CBC is unauthenticated, so a wrong key usually shows up as bad padding.
//! Every decrypt-path failure is reported as the same
//! [`Error::DecryptionFailed`] to avoid a padding oracle.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::{NoPadding, Pkcs7, RawPadding};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::encoding::{self, base64_bytes};
use super::keys::SymmetricKey;
use crate::error::{Error, Result};
use crate::trace::{Artifact, NoTrace, TraceSink};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// CBC initialization vector size in bytes
pub const IV_SIZE: usize = 16;

/// Padding scheme applied before block encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetricPadding {
    /// PKCS#7: N bytes of value N
    #[serde(rename = "PKCS7")]
    Pkcs7,
}

/// Result of symmetric encryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    /// CBC initialization vector (16 bytes)
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    /// Block-aligned ciphertext
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    /// AES key size in bits
    pub key_size: usize,
    /// Padding scheme
    pub padding: SymmetricPadding,
}

impl CipherEnvelope {
    /// Base64 of `iv || ciphertext` (single-field transport form)
    pub fn combined(&self) -> String {
        let mut bytes = Vec::with_capacity(self.iv.len() + self.ciphertext.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        encoding::encode(&bytes)
    }

    /// Split a [`combined`](Self::combined) string back into an envelope
    pub fn from_combined(text: &str, key_size: usize) -> Result<Self> {
        let bytes = encoding::decode(text)?;
        if bytes.len() < IV_SIZE + BLOCK_SIZE {
            return Err(Error::EncodingError(format!(
                "Combined ciphertext must be at least {} bytes, got {}",
                IV_SIZE + BLOCK_SIZE,
                bytes.len()
            )));
        }
        let (iv, ciphertext) = bytes.split_at(IV_SIZE);
        Ok(Self {
            iv: iv.to_vec(),
            ciphertext: ciphertext.to_vec(),
            key_size,
            padding: SymmetricPadding::Pkcs7,
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::DeserializationError(e.to_string()))
    }
}

/// Generate a random 16-byte IV
pub fn generate_iv() -> Result<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| Error::EncryptionFailed(format!("OS RNG failed: {}", e)))?;
    Ok(iv)
}

/// Apply PKCS#7 padding up to the next multiple of [`BLOCK_SIZE`]
///
/// Always adds at least one byte, so aligned input grows by a full block.
pub fn pad(plaintext: &[u8]) -> Vec<u8> {
    let aligned = plaintext.len() - plaintext.len() % BLOCK_SIZE;
    let mut padded = Vec::with_capacity(aligned + BLOCK_SIZE);
    padded.extend_from_slice(&plaintext[..aligned]);

    let mut last = [0u8; BLOCK_SIZE];
    let tail = &plaintext[aligned..];
    last[..tail.len()].copy_from_slice(tail);
    Pkcs7::raw_pad(&mut last, tail.len());

    padded.extend_from_slice(&last);
    padded
}

/// Encrypt with AES-CBC under a fresh random IV
///
/// ## Example
///
/// ```ignore
/// let key = SymmetricKey::generate(256)?;
/// let envelope = encrypt(b"hello world", &key)?;
/// assert_eq!(envelope.ciphertext.len(), 16);
/// ```
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Result<CipherEnvelope> {
    encrypt_with(plaintext, key, &mut NoTrace)
}

/// [`encrypt`], reporting intermediate artifacts to `trace`
pub fn encrypt_with<T: TraceSink>(
    plaintext: &[u8],
    key: &SymmetricKey,
    trace: &mut T,
) -> Result<CipherEnvelope> {
    let padded = pad(plaintext);
    trace.record("Apply PKCS#7 padding", || {
        Artifact::hex(&padded)
            .with("padding_added", padded.len() - plaintext.len())
            .with("new_length", padded.len())
    });

    let iv = generate_iv()?;
    trace.record("Generate random IV", || Artifact::hex(&iv));
    trace.record("AES key", || {
        Artifact::redacted_key(key.as_bytes()).with("key_size", key.size_bits())
    });

    let ciphertext = cbc_encrypt(key.as_bytes(), &iv, &padded)?;
    trace.record("Encrypt with AES-CBC", || Artifact::hex(&ciphertext));

    let envelope = CipherEnvelope {
        iv: iv.to_vec(),
        ciphertext,
        key_size: key.size_bits(),
        padding: SymmetricPadding::Pkcs7,
    };
    trace.record("Encode as base64 (IV + ciphertext)", || {
        Artifact::base64(envelope.combined())
    });

    tracing::debug!(
        "AES-{}-CBC encrypted {} bytes into {} bytes",
        envelope.key_size,
        plaintext.len(),
        envelope.ciphertext.len()
    );
    Ok(envelope)
}

/// Decrypt an AES-CBC envelope and strip its padding
///
/// ## Errors
///
/// Returns `DecryptionFailed` if:
/// - The IV is not 16 bytes or the ciphertext is not block-aligned
/// - The padding is malformed (usually: wrong key or tampered ciphertext)
/// - The envelope's declared key size differs from `key`
pub fn decrypt(envelope: &CipherEnvelope, key: &SymmetricKey) -> Result<Vec<u8>> {
    if envelope.iv.len() != IV_SIZE
        || envelope.ciphertext.is_empty()
        || envelope.ciphertext.len() % BLOCK_SIZE != 0
        || envelope.key_size != key.size_bits()
    {
        return Err(Error::DecryptionFailed);
    }

    let plaintext = cbc_decrypt(key.as_bytes(), &envelope.iv, &envelope.ciphertext)?;
    tracing::debug!(
        "AES-{}-CBC decrypted {} bytes",
        envelope.key_size,
        envelope.ciphertext.len()
    );
    Ok(plaintext)
}

fn cbc_encrypt(key: &[u8], iv: &[u8], padded: &[u8]) -> Result<Vec<u8>> {
    let invalid = |_| Error::InvalidKeyLength(key.len());
    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<NoPadding>(padded),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<NoPadding>(padded),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<NoPadding>(padded),
        len => return Err(Error::InvalidKeyLength(len)),
    };
    Ok(ciphertext)
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let invalid = |_| Error::InvalidKeyLength(key.len());
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        len => return Err(Error::InvalidKeyLength(len)),
    };
    plaintext.map_err(|_| Error::DecryptionFailed)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceRecorder;

    #[test]
    fn test_hello_world_is_one_block() {
        let key = SymmetricKey::generate(256).unwrap();
        let envelope = encrypt(b"hello world", &key).unwrap();

        assert_eq!(envelope.iv.len(), IV_SIZE);
        assert_eq!(envelope.ciphertext.len(), 16);
        assert_eq!(envelope.key_size, 256);
        assert_eq!(decrypt(&envelope, &key).unwrap(), b"hello world");
    }

    #[test]
    fn test_round_trip_all_key_sizes() {
        for bits in [128, 192, 256] {
            let key = SymmetricKey::generate(bits).unwrap();
            for len in [0usize, 1, 15, 16, 17, 100] {
                let plaintext = vec![0x5Au8; len];
                let envelope = encrypt(&plaintext, &key).unwrap();
                assert_eq!(envelope.ciphertext.len() % BLOCK_SIZE, 0);
                assert_eq!(decrypt(&envelope, &key).unwrap(), plaintext);
            }
        }
    }

    #[test]
    fn test_aligned_plaintext_gets_full_padding_block() {
        let padded = pad(&[1u8; 16]);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn test_pad_encodes_its_length() {
        let padded = pad(b"hello world");
        assert_eq!(&padded[..11], b"hello world");
        assert_eq!(&padded[11..], &[5u8; 5]);
    }

    #[test]
    fn test_encrypt_is_not_deterministic() {
        let key = SymmetricKey::generate(256).unwrap();
        let e1 = encrypt(b"same message", &key).unwrap();
        let e2 = encrypt(b"same message", &key).unwrap();

        assert_ne!(e1.iv, e2.iv);
        assert_ne!(e1.ciphertext, e2.ciphertext);
        assert_eq!(decrypt(&e1, &key).unwrap(), decrypt(&e2, &key).unwrap());
    }

    #[test]
    fn test_every_bit_flip_changes_result() {
        let key = SymmetricKey::generate(256).unwrap();
        let plaintext = b"attack at dawn, bring snacks";
        let envelope = encrypt(plaintext, &key).unwrap();

        for byte in 0..envelope.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                match decrypt(&tampered, &key) {
                    Ok(recovered) => assert_ne!(recovered, plaintext),
                    Err(e) => assert!(matches!(e, Error::DecryptionFailed)),
                }
            }
        }

        for byte in 0..IV_SIZE {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.iv[byte] ^= 1 << bit;
                if let Ok(recovered) = decrypt(&tampered, &key) {
                    assert_ne!(recovered, plaintext);
                }
            }
        }
    }

    #[test]
    fn test_wrong_key_never_returns_plaintext() {
        let key = SymmetricKey::generate(256).unwrap();
        let other = SymmetricKey::generate(256).unwrap();
        let envelope = encrypt(b"secret", &key).unwrap();

        match decrypt(&envelope, &other) {
            Ok(recovered) => assert_ne!(recovered, b"secret"),
            Err(e) => assert!(matches!(e, Error::DecryptionFailed)),
        }
    }

    #[test]
    fn test_structural_errors_are_generic() {
        let key = SymmetricKey::generate(128).unwrap();
        let envelope = encrypt(b"secret", &key).unwrap();

        let mut short_iv = envelope.clone();
        short_iv.iv.truncate(8);
        assert!(matches!(decrypt(&short_iv, &key), Err(Error::DecryptionFailed)));

        let mut unaligned = envelope.clone();
        unaligned.ciphertext.pop();
        assert!(matches!(decrypt(&unaligned, &key), Err(Error::DecryptionFailed)));

        let mut empty = envelope.clone();
        empty.ciphertext.clear();
        assert!(matches!(decrypt(&empty, &key), Err(Error::DecryptionFailed)));

        let bigger = SymmetricKey::generate(256).unwrap();
        assert!(matches!(decrypt(&envelope, &bigger), Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_combined_round_trip() {
        let key = SymmetricKey::generate(256).unwrap();
        let envelope = encrypt(b"combined form", &key).unwrap();

        let restored = CipherEnvelope::from_combined(&envelope.combined(), 256).unwrap();
        assert_eq!(restored, envelope);
    }

    #[test]
    fn test_json_uses_base64_fields() {
        let key = SymmetricKey::generate(256).unwrap();
        let envelope = encrypt(b"json", &key).unwrap();

        let json = envelope.to_json().unwrap();
        assert!(json.contains(&encoding::encode(&envelope.iv)));
        assert!(json.contains("\"PKCS7\""));
        assert_eq!(CipherEnvelope::from_json(&json).unwrap(), envelope);
    }

    #[test]
    fn test_trace_does_not_change_result_shape() {
        let key = SymmetricKey::generate(256).unwrap();
        let mut recorder = TraceRecorder::new(64);
        let envelope = encrypt_with(b"hello world", &key, &mut recorder).unwrap();

        assert_eq!(decrypt(&envelope, &key).unwrap(), b"hello world");

        let names: Vec<_> = recorder.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Apply PKCS#7 padding",
                "Generate random IV",
                "AES key",
                "Encrypt with AES-CBC",
                "Encode as base64 (IV + ciphertext)",
            ]
        );
        assert_eq!(recorder.steps()[1].data, hex::encode(&envelope.iv));
        assert_eq!(recorder.steps()[4].data, envelope.combined());
    }

    #[test]
    fn test_trace_redacts_key() {
        let key = SymmetricKey::from_bytes(&[0x11; 32]).unwrap();
        let mut recorder = TraceRecorder::new(64);
        encrypt_with(b"x", &key, &mut recorder).unwrap();

        let key_step = &recorder.steps()[2];
        assert_eq!(key_step.data, "11111111...11111111");
        assert!(!key_step.data.contains(&hex::encode(key.as_bytes())));
    }
}
