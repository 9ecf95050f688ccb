//! # Message Protocol
//!
//! Composes the primitives in [`crate::crypto`] into three per-message modes.
//!
//! ## Modes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PROTECTION MODES                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SYMMETRIC                                                              │
//! │  ─────────                                                              │
//! │  Plaintext ──► AES-CBC(K) ──► { iv, ciphertext }                        │
//! │  K is supplied by the caller or generated and returned out-of-band.    │
//! │                                                                         │
//! │  ASYMMETRIC                                                             │
//! │  ──────────                                                             │
//! │  Plaintext ──► RSA-OAEP(recipient) ──► { ciphertext, signature? }       │
//! │  Bounded by the OAEP capacity (190 bytes at 2048 bits).                │
//! │                                                                         │
//! │  HYBRID                                                                 │
//! │  ──────                                                                 │
//! │  K = fresh AES-256 key                                                  │
//! │  Plaintext ──► AES-CBC(K) ─────────────► { iv, ciphertext }             │
//! │  base64(K) ──► RSA-OAEP(recipient) ────► { encrypted_key }              │
//! │  Plaintext ──► RSA-PSS(sender)  ───────► { signature? }                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery
//!
//! Every call is a pure function of its inputs plus fresh randomness. The
//! mode on recovery comes from the [`Envelope`] variant itself, so a
//! symmetric envelope can never be fed down the hybrid path.
//!
//! Signature checks are best-effort: a bad or unverifiable signature is
//! reported in [`Recovered::signature_valid`] and never discards the
//! recovered plaintext. In hybrid mode, a failure to unwrap the key and a
//! failure to decrypt the body are both reported as
//! [`Error::DecryptionFailed`].

use serde::{Deserialize, Serialize};

use crate::crypto::asymmetric::{self, check_key_size, AsymmetricEnvelope, AsymmetricPadding};
use crate::crypto::encoding;
use crate::crypto::keys::{PrivateKey, PublicKey, SymmetricKey};
use crate::crypto::signing::{self, SignatureEnvelope};
use crate::crypto::symmetric::{self, CipherEnvelope, SymmetricPadding, IV_SIZE};
use crate::error::{Error, Result};
use crate::trace::{NoTrace, TraceSink};

/// AES key size used for hybrid messages
pub const HYBRID_KEY_BITS: usize = 256;

// ============================================================================
// MODES AND ENVELOPES
// ============================================================================

/// Per-message protection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// AES-CBC with a shared key
    Symmetric,
    /// RSA-OAEP directly over the plaintext
    Asymmetric,
    /// AES-CBC body with an RSA-OAEP wrapped key
    Hybrid,
}

impl Mode {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symmetric => "symmetric",
            Self::Asymmetric => "asymmetric",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parse a mode name (case-insensitive)
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "symmetric" => Ok(Self::Symmetric),
            "asymmetric" => Ok(Self::Asymmetric),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(Error::InvalidParameter(format!(
                "Unknown encryption mode: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symmetric body plus the key that opens it, wrapped for the recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridEnvelope {
    /// AES-CBC encrypted body
    pub symmetric: CipherEnvelope,
    /// RSA-OAEP encryption of the base64 AES key
    pub wrapped_key: AsymmetricEnvelope,
    /// Optional sender signature over the plaintext
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureEnvelope>,
}

/// Output of [`protect`], tagged with its mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Envelope {
    /// Symmetric-only message
    Symmetric {
        /// Encrypted body
        cipher: CipherEnvelope,
    },
    /// Asymmetric-only message
    Asymmetric {
        /// Encrypted body
        cipher: AsymmetricEnvelope,
        /// Optional sender signature over the plaintext
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<SignatureEnvelope>,
    },
    /// Hybrid message
    Hybrid(HybridEnvelope),
}

impl Envelope {
    /// Mode this envelope was produced under
    pub fn mode(&self) -> Mode {
        match self {
            Self::Symmetric { .. } => Mode::Symmetric,
            Self::Asymmetric { .. } => Mode::Asymmetric,
            Self::Hybrid(_) => Mode::Hybrid,
        }
    }

    /// Attached signature, if any
    pub fn signature(&self) -> Option<&SignatureEnvelope> {
        match self {
            Self::Symmetric { .. } => None,
            Self::Asymmetric { signature, .. } => signature.as_ref(),
            Self::Hybrid(hybrid) => hybrid.signature.as_ref(),
        }
    }

    /// Flatten into the persisted message shape
    pub fn seal(&self) -> SealedMessage {
        match self {
            Self::Symmetric { cipher } => SealedMessage {
                mode: Mode::Symmetric,
                ciphertext: encoding::encode(&cipher.ciphertext),
                iv: Some(encoding::encode(&cipher.iv)),
                encrypted_key: None,
                signature: None,
                key_size: cipher.key_size,
            },
            Self::Asymmetric { cipher, signature } => SealedMessage {
                mode: Mode::Asymmetric,
                ciphertext: encoding::encode(&cipher.ciphertext),
                iv: None,
                encrypted_key: None,
                signature: signature.as_ref().map(SignatureEnvelope::to_base64),
                key_size: cipher.key_size,
            },
            Self::Hybrid(hybrid) => SealedMessage {
                mode: Mode::Hybrid,
                ciphertext: encoding::encode(&hybrid.symmetric.ciphertext),
                iv: Some(encoding::encode(&hybrid.symmetric.iv)),
                encrypted_key: Some(encoding::encode(&hybrid.wrapped_key.ciphertext)),
                signature: hybrid.signature.as_ref().map(SignatureEnvelope::to_base64),
                key_size: hybrid.symmetric.key_size,
            },
        }
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

/// Flat, text-only form of an [`Envelope`] for storage or transport
///
/// `key_size` is the AES key size for symmetric and hybrid messages and the
/// RSA modulus size for asymmetric ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    /// Protection mode
    pub mode: Mode,
    /// Body ciphertext (base64)
    pub ciphertext: String,
    /// CBC IV (base64), symmetric and hybrid only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// Wrapped AES key (base64), hybrid only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
    /// Sender signature (base64)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Key size in bits
    pub key_size: usize,
}

impl SealedMessage {
    /// Rebuild the structured envelope
    pub fn open(&self) -> Result<Envelope> {
        let ciphertext = encoding::decode(&self.ciphertext)?;
        let signature = self
            .signature
            .as_deref()
            .map(encoding::decode)
            .transpose()?
            .map(SignatureEnvelope::from_bytes);

        match self.mode {
            Mode::Symmetric => Ok(Envelope::Symmetric {
                cipher: self.cipher_envelope(ciphertext)?,
            }),
            Mode::Asymmetric => Ok(Envelope::Asymmetric {
                cipher: AsymmetricEnvelope {
                    ciphertext,
                    padding: AsymmetricPadding::OaepSha256,
                    key_size: self.key_size,
                },
                signature,
            }),
            Mode::Hybrid => {
                let wrapped = self
                    .encrypted_key
                    .as_deref()
                    .ok_or_else(|| {
                        Error::DeserializationError("Hybrid message has no encrypted_key".into())
                    })
                    .and_then(encoding::decode)?;
                let wrapped_key = AsymmetricEnvelope {
                    key_size: wrapped.len() * 8,
                    ciphertext: wrapped,
                    padding: AsymmetricPadding::OaepSha256,
                };
                Ok(Envelope::Hybrid(HybridEnvelope {
                    symmetric: self.cipher_envelope(ciphertext)?,
                    wrapped_key,
                    signature,
                }))
            }
        }
    }

    fn cipher_envelope(&self, ciphertext: Vec<u8>) -> Result<CipherEnvelope> {
        let iv = self
            .iv
            .as_deref()
            .ok_or_else(|| Error::DeserializationError(format!("{} message has no iv", self.mode)))
            .and_then(encoding::decode)?;
        if iv.len() != IV_SIZE {
            return Err(Error::DeserializationError(format!(
                "IV must be {} bytes, got {}",
                IV_SIZE,
                iv.len()
            )));
        }
        Ok(CipherEnvelope {
            iv,
            ciphertext,
            key_size: self.key_size,
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

// ============================================================================
// PARAMETERS AND RESULTS
// ============================================================================

/// Key material and options for [`protect`]
#[derive(Debug, Clone, Copy)]
pub struct ProtectParams<'a> {
    /// Recipient public key (asymmetric and hybrid)
    pub recipient: Option<&'a PublicKey>,
    /// Sender private key; when present the plaintext is signed
    pub sender: Option<&'a PrivateKey>,
    /// Shared key for symmetric mode; generated when absent
    pub symmetric_key: Option<&'a SymmetricKey>,
    /// Size of a generated symmetric-mode key
    pub generated_key_bits: usize,
}

impl Default for ProtectParams<'_> {
    fn default() -> Self {
        Self {
            recipient: None,
            sender: None,
            symmetric_key: None,
            generated_key_bits: 256,
        }
    }
}

impl<'a> ProtectParams<'a> {
    /// Set the recipient public key
    pub fn recipient(mut self, key: &'a PublicKey) -> Self {
        self.recipient = Some(key);
        self
    }

    /// Set the sender signing key
    pub fn sender(mut self, key: &'a PrivateKey) -> Self {
        self.sender = Some(key);
        self
    }

    /// Set the shared symmetric key
    pub fn symmetric_key(mut self, key: &'a SymmetricKey) -> Self {
        self.symmetric_key = Some(key);
        self
    }
}

/// Key material for [`recover`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverParams<'a> {
    /// Recipient's own private key (asymmetric and hybrid)
    pub own_private: Option<&'a PrivateKey>,
    /// Sender public key used to check an attached signature
    pub counterparty_public: Option<&'a PublicKey>,
    /// Shared key for symmetric mode
    pub symmetric_key: Option<&'a SymmetricKey>,
}

impl<'a> RecoverParams<'a> {
    /// Set the recipient's private key
    pub fn own_private(mut self, key: &'a PrivateKey) -> Self {
        self.own_private = Some(key);
        self
    }

    /// Set the sender's public key
    pub fn counterparty_public(mut self, key: &'a PublicKey) -> Self {
        self.counterparty_public = Some(key);
        self
    }

    /// Set the shared symmetric key
    pub fn symmetric_key(mut self, key: &'a SymmetricKey) -> Self {
        self.symmetric_key = Some(key);
        self
    }
}

/// Output of [`protect`]
#[derive(Debug, Clone)]
pub struct Protected {
    /// The protected message
    pub envelope: Envelope,
    /// Symmetric-mode key generated on the caller's behalf; the caller must
    /// deliver it to the recipient through a separate secure channel
    pub generated_key: Option<SymmetricKey>,
}

/// Output of [`recover`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    /// Decrypted plaintext
    pub plaintext: Vec<u8>,
    /// `None` if no signature was checked, otherwise the verdict
    pub signature_valid: Option<bool>,
}

// ============================================================================
// PROTECT
// ============================================================================

/// Protect `plaintext` under `mode`
///
/// ## Errors
///
/// - `MissingKeyMaterial` if `mode` needs a recipient key and none is given
/// - `UnsupportedKeySize` for RSA keys outside 2048/3072/4096 bits
/// - `PlaintextTooLarge` for asymmetric mode beyond the OAEP bound
/// - `InvalidParameter` for an invalid `generated_key_bits`
///
/// All of the above are raised before any encryption work.
pub fn protect(plaintext: &[u8], mode: Mode, params: &ProtectParams<'_>) -> Result<Protected> {
    protect_with(plaintext, mode, params, &mut NoTrace)
}

/// [`protect`], reporting intermediate artifacts to `trace`
pub fn protect_with<T: TraceSink>(
    plaintext: &[u8],
    mode: Mode,
    params: &ProtectParams<'_>,
    trace: &mut T,
) -> Result<Protected> {
    let protected = match mode {
        Mode::Symmetric => {
            let (key, generated) = match params.symmetric_key {
                Some(key) => (key.clone(), false),
                None => (SymmetricKey::generate(params.generated_key_bits)?, true),
            };
            let cipher = symmetric::encrypt_with(plaintext, &key, trace)?;
            Protected {
                envelope: Envelope::Symmetric { cipher },
                generated_key: generated.then_some(key),
            }
        }
        Mode::Asymmetric => {
            let recipient = params
                .recipient
                .ok_or(Error::MissingKeyMaterial("recipient public key"))?;
            check_sender(params)?;
            let cipher = asymmetric::encrypt_with(plaintext, recipient, trace)?;
            let signature = params
                .sender
                .map(|sender| signing::sign_with(plaintext, sender, trace))
                .transpose()?;
            Protected {
                envelope: Envelope::Asymmetric { cipher, signature },
                generated_key: None,
            }
        }
        Mode::Hybrid => {
            let recipient = params
                .recipient
                .ok_or(Error::MissingKeyMaterial("recipient public key"))?;
            check_key_size(recipient.size_bits())?;
            check_sender(params)?;

            let key = SymmetricKey::generate(HYBRID_KEY_BITS)?;
            let symmetric = symmetric::encrypt_with(plaintext, &key, trace)?;
            let wrapped_key =
                asymmetric::encrypt_with(key.to_base64().as_bytes(), recipient, trace)?;
            let signature = params
                .sender
                .map(|sender| signing::sign_with(plaintext, sender, trace))
                .transpose()?;
            Protected {
                envelope: Envelope::Hybrid(HybridEnvelope {
                    symmetric,
                    wrapped_key,
                    signature,
                }),
                generated_key: None,
            }
        }
    };

    tracing::debug!(
        "Protected {} bytes in {} mode (signed: {})",
        plaintext.len(),
        mode,
        protected.envelope.signature().is_some()
    );
    Ok(protected)
}

/// Size check for the optional signing key
fn check_sender(params: &ProtectParams<'_>) -> Result<()> {
    match params.sender {
        Some(sender) => check_key_size(sender.size_bits()),
        None => Ok(()),
    }
}

// ============================================================================
// RECOVER
// ============================================================================

/// Recover the plaintext of `envelope`
///
/// ## Errors
///
/// - `MissingKeyMaterial` if the key the envelope's mode needs is absent
/// - `UnsupportedKeySize` if the own private key has an unsupported size
/// - `DecryptionFailed` for every decrypt-path failure
pub fn recover(envelope: &Envelope, params: &RecoverParams<'_>) -> Result<Recovered> {
    let recovered = match envelope {
        Envelope::Symmetric { cipher } => {
            let key = params
                .symmetric_key
                .ok_or(Error::MissingKeyMaterial("symmetric key"))?;
            Recovered {
                plaintext: symmetric::decrypt(cipher, key)?,
                signature_valid: None,
            }
        }
        Envelope::Asymmetric { cipher, signature } => {
            let private = params
                .own_private
                .ok_or(Error::MissingKeyMaterial("own private key"))?;
            let plaintext = asymmetric::decrypt(cipher, private)?;
            let signature_valid = check_signature(&plaintext, signature.as_ref(), params);
            Recovered {
                plaintext,
                signature_valid,
            }
        }
        Envelope::Hybrid(hybrid) => {
            let private = params
                .own_private
                .ok_or(Error::MissingKeyMaterial("own private key"))?;
            check_key_size(private.size_bits())?;

            let plaintext =
                open_hybrid(hybrid, private).map_err(|_| Error::DecryptionFailed)?;
            let signature_valid = check_signature(&plaintext, hybrid.signature.as_ref(), params);
            Recovered {
                plaintext,
                signature_valid,
            }
        }
    };

    tracing::debug!(
        "Recovered {} bytes from {} envelope",
        recovered.plaintext.len(),
        envelope.mode()
    );
    Ok(recovered)
}

/// Unwrap the AES key and decrypt the body
fn open_hybrid(hybrid: &HybridEnvelope, private: &PrivateKey) -> Result<Vec<u8>> {
    let wrapped = asymmetric::decrypt(&hybrid.wrapped_key, private)?;
    let encoded = String::from_utf8(wrapped).map_err(|_| Error::DecryptionFailed)?;
    let key = SymmetricKey::from_base64(&encoded)?;
    if key.size_bits() != hybrid.symmetric.key_size {
        return Err(Error::DecryptionFailed);
    }
    symmetric::decrypt(&hybrid.symmetric, &key)
}

/// Best-effort signature check; never fails the recovery
fn check_signature(
    plaintext: &[u8],
    signature: Option<&SignatureEnvelope>,
    params: &RecoverParams<'_>,
) -> Option<bool> {
    let (signature, public) = signature.zip(params.counterparty_public)?;
    match signing::verify(plaintext, signature, public) {
        Ok(valid) => Some(valid),
        Err(e) => {
            tracing::warn!("Signature could not be checked: {}", e);
            Some(false)
        }
    }
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
    fn test_symmetric_generated_key_round_trip() {
        let protected = protect(b"hello world", Mode::Symmetric, &ProtectParams::default()).unwrap();
        let key = protected.generated_key.expect("key should be generated");
        assert_eq!(key.size_bits(), 256);

        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default().symmetric_key(&key),
        )
        .unwrap();
        assert_eq!(recovered.plaintext, b"hello world");
        assert_eq!(recovered.signature_valid, None);
    }

    #[test]
    fn test_symmetric_caller_key_is_not_returned() {
        let key = SymmetricKey::generate(128).unwrap();
        let protected = protect(
            b"shared secret",
            Mode::Symmetric,
            &ProtectParams::default().symmetric_key(&key),
        )
        .unwrap();

        assert!(protected.generated_key.is_none());
        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default().symmetric_key(&key),
        )
        .unwrap();
        assert_eq!(recovered.plaintext, b"shared secret");
    }

    #[test]
    fn test_symmetric_recover_requires_key() {
        let protected = protect(b"x", Mode::Symmetric, &ProtectParams::default()).unwrap();
        assert!(matches!(
            recover(&protected.envelope, &RecoverParams::default()),
            Err(Error::MissingKeyMaterial(_))
        ));
    }

    #[test]
    fn test_asymmetric_signed_round_trip() {
        let params = ProtectParams::default()
            .recipient(&BOB.public)
            .sender(&ALICE.private);
        let protected = protect(b"hi bob", Mode::Asymmetric, &params).unwrap();
        assert!(protected.envelope.signature().is_some());

        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default()
                .own_private(&BOB.private)
                .counterparty_public(&ALICE.public),
        )
        .unwrap();
        assert_eq!(recovered.plaintext, b"hi bob");
        assert_eq!(recovered.signature_valid, Some(true));
    }

    #[test]
    fn test_asymmetric_unsigned_has_no_verdict() {
        let protected = protect(
            b"hi bob",
            Mode::Asymmetric,
            &ProtectParams::default().recipient(&BOB.public),
        )
        .unwrap();

        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default()
                .own_private(&BOB.private)
                .counterparty_public(&ALICE.public),
        )
        .unwrap();
        assert_eq!(recovered.signature_valid, None);
    }

    #[test]
    fn test_bad_signature_keeps_plaintext() {
        let params = ProtectParams::default()
            .recipient(&BOB.public)
            .sender(&ALICE.private);
        let protected = protect(b"hi bob", Mode::Asymmetric, &params).unwrap();

        // Checked against the wrong sender
        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default()
                .own_private(&BOB.private)
                .counterparty_public(&BOB.public),
        )
        .unwrap();
        assert_eq!(recovered.plaintext, b"hi bob");
        assert_eq!(recovered.signature_valid, Some(false));
    }

    #[test]
    fn test_asymmetric_requires_recipient() {
        let err = protect(b"x", Mode::Asymmetric, &ProtectParams::default()).unwrap_err();
        assert!(matches!(err, Error::MissingKeyMaterial(_)));

        let err = protect(b"x", Mode::Hybrid, &ProtectParams::default()).unwrap_err();
        assert!(matches!(err, Error::MissingKeyMaterial(_)));
    }

    #[test]
    fn test_asymmetric_too_large_is_rejected() {
        let plaintext = vec![b'a'; 191];
        let err = protect(
            &plaintext,
            Mode::Asymmetric,
            &ProtectParams::default().recipient(&BOB.public),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PlaintextTooLarge { max: 190, .. }));
    }

    #[test]
    fn test_undersized_keys_are_unsupported() {
        for mode in [Mode::Asymmetric, Mode::Hybrid] {
            let err = protect(b"x", mode, &ProtectParams::default().recipient(&WEAK.public))
                .unwrap_err();
            assert!(matches!(err, Error::UnsupportedKeySize(1024)));

            let params = ProtectParams::default()
                .recipient(&BOB.public)
                .sender(&WEAK.private);
            let err = protect(b"x", mode, &params).unwrap_err();
            assert!(matches!(err, Error::UnsupportedKeySize(1024)));
        }

        let protected = protect(
            b"x",
            Mode::Hybrid,
            &ProtectParams::default().recipient(&BOB.public),
        )
        .unwrap();
        let err = recover(
            &protected.envelope,
            &RecoverParams::default().own_private(&WEAK.private),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedKeySize(1024)));
    }

    #[test]
    fn test_symmetric_ignores_sender_key() {
        let key = SymmetricKey::generate(256).unwrap();
        let params = ProtectParams::default()
            .symmetric_key(&key)
            .sender(&WEAK.private);
        let protected = protect(b"unsigned", Mode::Symmetric, &params).unwrap();

        assert!(protected.envelope.signature().is_none());
        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default().symmetric_key(&key),
        )
        .unwrap();
        assert_eq!(recovered.plaintext, b"unsigned");
    }

    #[test]
    fn test_hybrid_round_trip_large_message() {
        let plaintext = vec![b'z'; 10_000];
        let params = ProtectParams::default()
            .recipient(&BOB.public)
            .sender(&ALICE.private);
        let protected = protect(&plaintext, Mode::Hybrid, &params).unwrap();
        assert_eq!(protected.envelope.mode(), Mode::Hybrid);
        assert!(protected.generated_key.is_none());

        let recovered = recover(
            &protected.envelope,
            &RecoverParams::default()
                .own_private(&BOB.private)
                .counterparty_public(&ALICE.public),
        )
        .unwrap();
        assert_eq!(recovered.plaintext, plaintext);
        assert_eq!(recovered.signature_valid, Some(true));
    }

    #[test]
    fn test_hybrid_wrong_private_key_fails_generically() {
        let protected = protect(
            b"for bob only",
            Mode::Hybrid,
            &ProtectParams::default().recipient(&BOB.public),
        )
        .unwrap();

        let err = recover(
            &protected.envelope,
            &RecoverParams::default().own_private(&ALICE.private),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed));
    }

    #[test]
    fn test_hybrid_tampered_body_fails_generically() {
        let protected = protect(
            b"for bob only",
            Mode::Hybrid,
            &ProtectParams::default().recipient(&BOB.public),
        )
        .unwrap();
        let mut envelope = protected.envelope;
        if let Envelope::Hybrid(hybrid) = &mut envelope {
            hybrid.symmetric.key_size = 128;
        }

        let err = recover(&envelope, &RecoverParams::default().own_private(&BOB.private))
            .unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed));
    }

    #[test]
    fn test_envelope_json_round_trip() {
        let protected = protect(
            b"json",
            Mode::Hybrid,
            &ProtectParams::default()
                .recipient(&BOB.public)
                .sender(&ALICE.private),
        )
        .unwrap();

        let json = protected.envelope.to_json().unwrap();
        assert!(json.contains("\"mode\":\"hybrid\""));
        let restored = Envelope::from_json(&json).unwrap();
        assert_eq!(restored, protected.envelope);
    }

    #[test]
    fn test_sealed_message_round_trip() {
        let params = ProtectParams::default()
            .recipient(&BOB.public)
            .sender(&ALICE.private);

        for mode in [Mode::Asymmetric, Mode::Hybrid] {
            let protected = protect(b"sealed", mode, &params).unwrap();
            let sealed = protected.envelope.seal();
            assert_eq!(sealed.mode, mode);
            assert!(sealed.signature.is_some());

            let json = sealed.to_json().unwrap();
            let opened = SealedMessage::from_json(&json).unwrap().open().unwrap();
            assert_eq!(opened, protected.envelope);
        }
    }

    #[test]
    fn test_sealed_message_missing_fields() {
        let sealed = SealedMessage {
            mode: Mode::Hybrid,
            ciphertext: encoding::encode(&[0u8; 16]),
            iv: Some(encoding::encode(&[0u8; 16])),
            encrypted_key: None,
            signature: None,
            key_size: 256,
        };
        assert!(matches!(
            sealed.open(),
            Err(Error::DeserializationError(_))
        ));

        let sealed = SealedMessage {
            mode: Mode::Symmetric,
            iv: None,
            ..sealed
        };
        assert!(matches!(
            sealed.open(),
            Err(Error::DeserializationError(_))
        ));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("HYBRID").unwrap(), Mode::Hybrid);
        assert_eq!(Mode::parse(" symmetric ").unwrap(), Mode::Symmetric);
        assert!(matches!(
            Mode::parse("quantum"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_traced_hybrid_covers_both_layers() {
        let mut recorder = TraceRecorder::new(64);
        protect_with(
            b"traced",
            Mode::Hybrid,
            &ProtectParams::default().recipient(&BOB.public),
            &mut recorder,
        )
        .unwrap();

        let names: Vec<&str> = recorder.steps().iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Encrypt with AES-CBC"));
        assert!(names.contains(&"Encrypt with RSA"));
        assert_eq!(recorder.steps()[0].step, 1);
    }
}
