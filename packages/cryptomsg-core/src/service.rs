//! # Crypto Service
//!
//! The text boundary: UTF-8 messages in, base64 and PEM out.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TEXT BOUNDARY                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Caller                    CryptoService                 crypto / protocol
//! │  ──────                    ─────────────                 ─────────────── │
//! │                                                                         │
//! │  "hello world" ──UTF-8──►  bytes ─────────────────────►  encrypt        │
//! │  key (base64)  ──decode─►  SymmetricKey ──────────────►                 │
//! │  key (PEM or   ──parse──►  PublicKey / PrivateKey ────►                 │
//! │   base64 PEM)                                                           │
//! │                                                                         │
//! │  {iv, ciphertext} ◄─base64─ envelope ◄─────────────────                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each encrypt/sign operation has a `*_traced` twin returning a
//! [`Traced`] result whose steps start with the original message and its
//! UTF-8 bytes.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::crypto::keys::{EncodedKeyPair, KeyPair, PrivateKey, PublicKey, SymmetricKey};
use crate::crypto::signing::{self, SignatureEnvelope};
use crate::crypto::symmetric::{self, CipherEnvelope, SymmetricPadding};
use crate::crypto::{asymmetric, encoding, AsymmetricEnvelope, AsymmetricPadding};
use crate::error::{Error, Result};
use crate::protocol::{self, Mode, ProtectParams, RecoverParams, SealedMessage};
use crate::trace::{Artifact, NoTrace, TraceRecorder, TraceSink, TraceStep, Traced};

// ============================================================================
// TEXT TYPES
// ============================================================================

/// Symmetric ciphertext in text form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricText {
    /// IV (base64)
    pub iv: String,
    /// Ciphertext (base64)
    pub ciphertext: String,
    /// AES key size in bits
    pub key_size: usize,
}

/// Verdict of a signature check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Whether the signature is valid
    pub valid: bool,
    /// Human-readable verdict
    pub message: String,
}

impl VerificationReport {
    fn new(valid: bool) -> Self {
        let message = if valid {
            "Signature valid"
        } else {
            "Signature invalid"
        };
        Self {
            valid,
            message: message.to_string(),
        }
    }
}

/// Key containers for [`CryptoService::protect`], all in text form
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectKeys<'a> {
    /// Recipient public key (PEM or base64 PEM)
    pub recipient_public: Option<&'a str>,
    /// Sender private key (PEM or base64 PEM); signs the message when set
    pub sender_private: Option<&'a str>,
    /// Shared AES key (base64) for symmetric mode
    pub symmetric_key: Option<&'a str>,
}

/// Key containers for [`CryptoService::recover`], all in text form
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverKeys<'a> {
    /// Own private key (PEM or base64 PEM)
    pub own_private: Option<&'a str>,
    /// Sender public key (PEM or base64 PEM) for signature checks
    pub counterparty_public: Option<&'a str>,
    /// Shared AES key (base64) for symmetric mode
    pub symmetric_key: Option<&'a str>,
}

/// A protected message ready to persist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedText {
    /// Flat message
    pub sealed: SealedMessage,
    /// Generated symmetric-mode key (base64), to deliver out-of-band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_key: Option<String>,
    /// Step trace, filled when `trace_enabled` is set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<TraceStep>,
}

/// A recovered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredText {
    /// Decrypted message
    pub text: String,
    /// `None` when no signature was checked
    pub signature_valid: Option<bool>,
}

// ============================================================================
// SERVICE
// ============================================================================

/// Stateless crypto engine operating on text
///
/// Holds only its immutable [`EngineConfig`], so it can be shared freely
/// between threads.
#[derive(Debug, Clone, Default)]
pub struct CryptoService {
    config: EngineConfig,
}

impl CryptoService {
    /// Create a service with a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            "Crypto service ready (AES-{}, RSA-{}, trace: {})",
            config.default_symmetric_key_bits,
            config.default_key_pair_bits,
            config.trace_enabled
        );
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Key material
    // ------------------------------------------------------------------------

    /// Generate an AES key, returned as base64
    ///
    /// `size_bits` defaults to `default_symmetric_key_bits`.
    pub fn generate_symmetric_key(&self, size_bits: Option<usize>) -> Result<String> {
        let size = size_bits.unwrap_or(self.config.default_symmetric_key_bits);
        Ok(SymmetricKey::generate(size)?.to_base64())
    }

    /// Generate an RSA key pair, returned as PEM containers
    ///
    /// `size_bits` defaults to `default_key_pair_bits`.
    pub fn generate_key_pair(&self, size_bits: Option<usize>) -> Result<EncodedKeyPair> {
        let size = size_bits.unwrap_or(self.config.default_key_pair_bits);
        KeyPair::generate(size)?.to_encoded()
    }

    // ------------------------------------------------------------------------
    // Symmetric
    // ------------------------------------------------------------------------

    /// Encrypt `text` under a base64 AES key
    pub fn encrypt_symmetric(&self, text: &str, key: &str) -> Result<SymmetricText> {
        self.encrypt_symmetric_into(text, key, &mut NoTrace)
    }

    /// [`encrypt_symmetric`](Self::encrypt_symmetric) with its step trace
    pub fn encrypt_symmetric_traced(&self, text: &str, key: &str) -> Result<Traced<SymmetricText>> {
        let mut recorder = self.recorder(text);
        let result = self.encrypt_symmetric_into(text, key, &mut recorder)?;
        Ok(Traced {
            steps: recorder.into_steps(),
            result,
        })
    }

    fn encrypt_symmetric_into<T: TraceSink>(
        &self,
        text: &str,
        key: &str,
        trace: &mut T,
    ) -> Result<SymmetricText> {
        let key = SymmetricKey::from_base64(key)?;
        let envelope = symmetric::encrypt_with(text.as_bytes(), &key, trace)?;
        Ok(SymmetricText {
            iv: encoding::encode(&envelope.iv),
            ciphertext: encoding::encode(&envelope.ciphertext),
            key_size: envelope.key_size,
        })
    }

    /// Decrypt base64 `iv` and `ciphertext` under a base64 AES key
    ///
    /// Every failure past key parsing, including undecodable input and
    /// non-UTF-8 plaintext, is `DecryptionFailed`.
    pub fn decrypt_symmetric(&self, iv: &str, ciphertext: &str, key: &str) -> Result<String> {
        let key = SymmetricKey::from_base64(key)?;
        let envelope = CipherEnvelope {
            iv: encoding::decode(iv).map_err(|_| Error::DecryptionFailed)?,
            ciphertext: encoding::decode(ciphertext).map_err(|_| Error::DecryptionFailed)?,
            key_size: key.size_bits(),
            padding: SymmetricPadding::Pkcs7,
        };
        into_text(symmetric::decrypt(&envelope, &key)?)
    }

    // ------------------------------------------------------------------------
    // Asymmetric
    // ------------------------------------------------------------------------

    /// Encrypt `text` to a public key container; returns base64 ciphertext
    pub fn encrypt_asymmetric(&self, text: &str, public_key: &str) -> Result<String> {
        self.encrypt_asymmetric_into(text, public_key, &mut NoTrace)
    }

    /// [`encrypt_asymmetric`](Self::encrypt_asymmetric) with its step trace
    pub fn encrypt_asymmetric_traced(&self, text: &str, public_key: &str) -> Result<Traced<String>> {
        let mut recorder = self.recorder(text);
        let result = self.encrypt_asymmetric_into(text, public_key, &mut recorder)?;
        Ok(Traced {
            steps: recorder.into_steps(),
            result,
        })
    }

    fn encrypt_asymmetric_into<T: TraceSink>(
        &self,
        text: &str,
        public_key: &str,
        trace: &mut T,
    ) -> Result<String> {
        let public = PublicKey::from_pem(public_key)?;
        let envelope = asymmetric::encrypt_with(text.as_bytes(), &public, trace)?;
        Ok(encoding::encode(&envelope.ciphertext))
    }

    /// Decrypt base64 RSA ciphertext with a private key container
    pub fn decrypt_asymmetric(&self, ciphertext: &str, private_key: &str) -> Result<String> {
        let private = PrivateKey::from_pem(private_key)?;
        let envelope = AsymmetricEnvelope {
            ciphertext: encoding::decode(ciphertext).map_err(|_| Error::DecryptionFailed)?,
            padding: AsymmetricPadding::OaepSha256,
            key_size: private.size_bits(),
        };
        into_text(asymmetric::decrypt(&envelope, &private)?)
    }

    // ------------------------------------------------------------------------
    // Signatures
    // ------------------------------------------------------------------------

    /// Sign `text`; returns the base64 signature
    pub fn sign(&self, text: &str, private_key: &str) -> Result<String> {
        self.sign_into(text, private_key, &mut NoTrace)
    }

    /// [`sign`](Self::sign) with its step trace
    pub fn sign_traced(&self, text: &str, private_key: &str) -> Result<Traced<String>> {
        let mut recorder = self.recorder(text);
        let result = self.sign_into(text, private_key, &mut recorder)?;
        Ok(Traced {
            steps: recorder.into_steps(),
            result,
        })
    }

    fn sign_into<T: TraceSink>(&self, text: &str, private_key: &str, trace: &mut T) -> Result<String> {
        let private = PrivateKey::from_pem(private_key)?;
        Ok(signing::sign_with(text.as_bytes(), &private, trace)?.to_base64())
    }

    /// Check a base64 signature over `text`
    ///
    /// A signature that is not even base64 is reported invalid. Only a bad
    /// public key container or an unsupported key size is an error.
    pub fn verify(&self, text: &str, signature: &str, public_key: &str) -> Result<VerificationReport> {
        let public = PublicKey::from_pem(public_key)?;
        let valid = match encoding::decode(signature) {
            Ok(bytes) => {
                signing::verify(text.as_bytes(), &SignatureEnvelope::from_bytes(bytes), &public)?
            }
            Err(_) => {
                tracing::warn!("Signature verification failed");
                false
            }
        };
        Ok(VerificationReport::new(valid))
    }

    // ------------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------------

    /// Protect `text` under `mode`
    ///
    /// When `trace_enabled` is set the step trace is attached to the result.
    pub fn protect(&self, text: &str, mode: Mode, keys: &ProtectKeys<'_>) -> Result<ProtectedText> {
        if self.config.trace_enabled {
            let mut recorder = self.recorder(text);
            let mut protected = self.protect_into(text, mode, keys, &mut recorder)?;
            protected.steps = recorder.into_steps();
            Ok(protected)
        } else {
            self.protect_into(text, mode, keys, &mut NoTrace)
        }
    }

    /// [`protect`](Self::protect), always traced
    pub fn protect_traced(
        &self,
        text: &str,
        mode: Mode,
        keys: &ProtectKeys<'_>,
    ) -> Result<Traced<ProtectedText>> {
        let mut recorder = self.recorder(text);
        let result = self.protect_into(text, mode, keys, &mut recorder)?;
        Ok(Traced {
            steps: recorder.into_steps(),
            result,
        })
    }

    fn protect_into<T: TraceSink>(
        &self,
        text: &str,
        mode: Mode,
        keys: &ProtectKeys<'_>,
        trace: &mut T,
    ) -> Result<ProtectedText> {
        let recipient = keys.recipient_public.map(PublicKey::from_pem).transpose()?;
        let sender = keys.sender_private.map(PrivateKey::from_pem).transpose()?;
        let symmetric_key = keys.symmetric_key.map(SymmetricKey::from_base64).transpose()?;

        let params = ProtectParams {
            recipient: recipient.as_ref(),
            sender: sender.as_ref(),
            symmetric_key: symmetric_key.as_ref(),
            generated_key_bits: self.config.default_symmetric_key_bits,
        };
        let protected = protocol::protect_with(text.as_bytes(), mode, &params, trace)?;

        Ok(ProtectedText {
            sealed: protected.envelope.seal(),
            generated_key: protected.generated_key.as_ref().map(SymmetricKey::to_base64),
            steps: Vec::new(),
        })
    }

    /// Recover the text of a sealed message
    ///
    /// A sealed message that does not open (bad base64, wrong IV length,
    /// missing fields) fails with `DecryptionFailed`, like any other
    /// decrypt-path failure.
    pub fn recover(&self, sealed: &SealedMessage, keys: &RecoverKeys<'_>) -> Result<RecoveredText> {
        let own_private = keys.own_private.map(PrivateKey::from_pem).transpose()?;
        let counterparty = keys
            .counterparty_public
            .map(PublicKey::from_pem)
            .transpose()?;
        let symmetric_key = keys.symmetric_key.map(SymmetricKey::from_base64).transpose()?;

        let params = RecoverParams {
            own_private: own_private.as_ref(),
            counterparty_public: counterparty.as_ref(),
            symmetric_key: symmetric_key.as_ref(),
        };
        let envelope = sealed.open().map_err(|e| {
            tracing::debug!("Sealed {} message did not open: {}", sealed.mode, e);
            Error::DecryptionFailed
        })?;
        let recovered = protocol::recover(&envelope, &params)?;

        Ok(RecoveredText {
            text: into_text(recovered.plaintext)?,
            signature_valid: recovered.signature_valid,
        })
    }

    /// Recorder pre-filled with the message and its UTF-8 bytes
    fn recorder(&self, text: &str) -> TraceRecorder {
        let mut recorder = TraceRecorder::new(self.config.trace_preview_len);
        recorder.record("Original message", || Artifact::text(text));
        recorder.record("Convert to bytes (UTF-8)", || Artifact::hex(text.as_bytes()));
        recorder
    }
}

fn into_text(plaintext: Vec<u8>) -> Result<String> {
    String::from_utf8(plaintext).map_err(|_| Error::DecryptionFailed)
}

// ============================================================================
// TESTS
// ============================================================================
