//! Engine configuration.
//!
//! Defaults apply field by field, so a partial JSON document such as
//! `{"trace_enabled": true}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::{validate_key_pair_size, validate_symmetric_size};
use crate::error::{Error, Result};

/// Configuration for [`CryptoService`](crate::CryptoService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// AES key size used when a caller does not name one
    pub default_symmetric_key_bits: usize,
    /// RSA modulus size used when a caller does not name one
    pub default_key_pair_bits: usize,
    /// Whether untraced service calls should also record steps
    pub trace_enabled: bool,
    /// Hex characters kept when a trace truncates ciphertext or signatures
    pub trace_preview_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_symmetric_key_bits: 256,
            default_key_pair_bits: 2048,
            trace_enabled: false,
            trace_preview_len: 64,
        }
    }
}

impl EngineConfig {
    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<()> {
        validate_symmetric_size(self.default_symmetric_key_bits)?;
        validate_key_pair_size(self.default_key_pair_bits)?;
        if self.trace_preview_len == 0 {
            tracing::warn!("Rejected config: trace_preview_len must be positive");
            return Err(Error::InvalidParameter(
                "trace_preview_len must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::DeserializationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::SerializationError(e.to_string()))
    }
}
