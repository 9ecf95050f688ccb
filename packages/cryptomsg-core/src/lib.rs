//! # CryptoMsg Core
//!
//! Message encryption engine offering three per-message protection modes:
//! symmetric (AES-CBC), asymmetric (RSA-OAEP) and hybrid (AES body with an
//! RSA-wrapped key), with optional RSA-PSS signatures.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CRYPTOMSG CORE MODULES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │  service        text boundary: UTF-8, base64, PEM containers      │ │
//! │  └─────────────────────────────────┬─────────────────────────────────┘ │
//! │                                    │                                    │
//! │  ┌─────────────────────────────────▼─────────────────────────────────┐ │
//! │  │  protocol       protect / recover in Symmetric | Asymmetric |     │ │
//! │  │                 Hybrid mode, optional signatures                  │ │
//! │  └──────┬──────────────────┬──────────────────┬──────────────────────┘ │
//! │         │                  │                  │                         │
//! │  ┌──────▼──────┐  ┌────────▼────────┐  ┌──────▼──────┐  ┌────────────┐ │
//! │  │  symmetric  │  │   asymmetric    │  │   signing   │  │   trace    │ │
//! │  │             │  │                 │  │             │  │            │ │
//! │  │ - AES-CBC   │  │ - RSA-OAEP      │  │ - RSA-PSS   │  │ - Steps    │ │
//! │  │ - PKCS#7    │  │ - SHA-256       │  │ - SHA-256   │  │ - Redacted │ │
//! │  └──────┬──────┘  └────────┬────────┘  └──────┬──────┘  └────────────┘ │
//! │         └──────────────────┼──────────────────┘                         │
//! │                   ┌────────▼────────┐                                   │
//! │                   │  keys/encoding  │                                   │
//! │                   │ - AES keys      │                                   │
//! │                   │ - RSA PEM       │                                   │
//! │                   │ - base64        │                                   │
//! │                   └─────────────────┘                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Engine configuration
//! - [`crypto`] - Primitives (keys, AES-CBC, RSA-OAEP, RSA-PSS, encoding)
//! - [`protocol`] - Per-message modes and envelopes
//! - [`trace`] - Step-by-step recording of operations
//! - [`service`] - Text-level API over everything above
//!
//! ## Quick Start
//!
//! ```ignore
//! use cryptomsg_core::{CryptoService, Mode, ProtectKeys, RecoverKeys};
//!
//! let service = CryptoService::default();
//! let bob = service.generate_key_pair(None)?;
//!
//! let protected = service.protect(
//!     "hello bob",
//!     Mode::Hybrid,
//!     &ProtectKeys { recipient_public: Some(&bob.public_key), ..Default::default() },
//! )?;
//!
//! let recovered = service.recover(
//!     &protected.sealed,
//!     &RecoverKeys { own_private: Some(&bob.private_key), ..Default::default() },
//! )?;
//! assert_eq!(recovered.text, "hello bob");
//! ```
//!
//! ## Security Model
//!
//! | Concern | Handling |
//! |---------|----------|
//! | Padding oracles | Every decrypt-path failure is one `DecryptionFailed` |
//! | IV reuse | A fresh random IV per symmetric encryption |
//! | Oversized RSA input | Rejected with `PlaintextTooLarge`, never truncated |
//! | Key leakage | Traces show redacted keys, logs never show keys or plaintext |
//! | Signatures | Verification fails closed to `false` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
pub mod protocol;
pub mod service;
pub mod trace;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::EngineConfig;
pub use crypto::{
    AsymmetricEnvelope, CipherEnvelope, EncodedKeyPair, KeyPair, PrivateKey, PublicKey,
    SignatureEnvelope, SymmetricKey,
};
pub use error::{Error, Result};
pub use protocol::{
    protect, recover, Envelope, HybridEnvelope, Mode, ProtectParams, Protected, RecoverParams,
    Recovered, SealedMessage,
};
pub use service::{
    CryptoService, ProtectKeys, ProtectedText, RecoverKeys, RecoveredText, SymmetricText,
    VerificationReport,
};
pub use trace::{TraceRecorder, TraceStep, Traced};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of the crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
