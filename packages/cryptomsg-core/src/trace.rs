//! # Step Traces
//!
//! An observer that records the intermediate artifacts of an operation
//! (padded plaintext, generated IV, raw ciphertext, ...) as an ordered,
//! human-readable list of steps.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TRACE ARCHITECTURE                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   encrypt(...)  ──►  encrypt_with(..., &mut NoTrace)                   │
//! │                                     │                                   │
//! │                                     │  record(name, || artifact)        │
//! │                                     ▼                                   │
//! │                      NoTrace:       closure never runs                  │
//! │                      TraceRecorder: closure runs, step appended         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Traced and untraced calls run the same code; the sink only sees values
//! that already exist. Key material never appears in full: symmetric keys
//! are shown as their first and last four bytes, PEM containers and long
//! ciphertexts are truncated to a preview.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a step's `data` should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Plain UTF-8 text
    Text,
    /// Lowercase hex
    Hex,
    /// Hex cut to a preview, ending in `...`
    HexPartial,
    /// Standard base64
    Base64,
    /// PEM cut to a preview, ending in `...`
    PemPartial,
    /// Explanation rather than data
    Info,
}

/// A value captured at one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    kind: ArtifactKind,
    data: String,
    details: BTreeMap<String, String>,
}

impl Artifact {
    fn new(kind: ArtifactKind, data: String) -> Self {
        Self {
            kind,
            data,
            details: BTreeMap::new(),
        }
    }

    /// Plain text
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ArtifactKind::Text, text.into())
    }

    /// Full hex of `bytes`, with their length
    pub fn hex(bytes: &[u8]) -> Self {
        Self::new(ArtifactKind::Hex, hex::encode(bytes)).with("length", bytes.len())
    }

    /// Hex of `bytes` cut to `max_chars`, with the full length
    pub fn hex_preview(bytes: &[u8], max_chars: usize) -> Self {
        let full = hex::encode(bytes);
        if full.len() <= max_chars {
            return Self::new(ArtifactKind::Hex, full).with("length", bytes.len());
        }
        Self::new(ArtifactKind::HexPartial, format!("{}...", &full[..max_chars]))
            .with("full_length", bytes.len())
    }

    /// Edges of a key, hex encoded: four bytes each side for keys longer
    /// than 16 bytes, two for 16-byte keys, nothing below that
    pub fn redacted_key(key: &[u8]) -> Self {
        let edge = match key.len() {
            len if len > 16 => 4,
            16 => 2,
            _ => 0,
        };
        let data = format!(
            "{}...{}",
            hex::encode(&key[..edge]),
            hex::encode(&key[key.len() - edge..])
        );
        Self::new(ArtifactKind::HexPartial, data)
    }

    /// PEM text cut to `max_chars`
    pub fn pem_preview(pem: &str, max_chars: usize) -> Self {
        let preview: String = pem.chars().take(max_chars).collect();
        Self::new(ArtifactKind::PemPartial, format!("{}...", preview))
    }

    /// Base64 text
    pub fn base64(encoded: impl Into<String>) -> Self {
        Self::new(ArtifactKind::Base64, encoded.into())
    }

    /// An explanation of what the step does
    pub fn info(description: impl Into<String>) -> Self {
        Self::new(ArtifactKind::Info, description.into())
    }

    /// Attach a named detail
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// 1-based position
    pub step: usize,
    /// What happened
    pub name: String,
    /// How to read `data`
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    /// The artifact
    pub data: String,
    /// Lengths, sizes and other annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

/// Receiver of intermediate artifacts
pub trait TraceSink {
    /// Called once per step; `build` is only evaluated if the sink keeps it
    fn record<F>(&mut self, name: &str, build: F)
    where
        F: FnOnce() -> Artifact;

    /// Preview length for truncated artifacts
    fn preview_len(&self) -> usize {
        64
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    #[inline]
    fn record<F>(&mut self, _name: &str, _build: F)
    where
        F: FnOnce() -> Artifact,
    {
    }
}

/// Sink that keeps every step in order
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    steps: Vec<TraceStep>,
    preview_len: usize,
}

impl TraceRecorder {
    /// Create an empty recorder
    pub fn new(preview_len: usize) -> Self {
        Self {
            steps: Vec::new(),
            preview_len,
        }
    }

    /// Recorded steps, in order
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Take the recorded steps
    pub fn into_steps(self) -> Vec<TraceStep> {
        self.steps
    }
}

impl TraceSink for TraceRecorder {
    fn record<F>(&mut self, name: &str, build: F)
    where
        F: FnOnce() -> Artifact,
    {
        let artifact = build();
        self.steps.push(TraceStep {
            step: self.steps.len() + 1,
            name: name.to_string(),
            kind: artifact.kind,
            data: artifact.data,
            details: artifact.details,
        });
    }

    fn preview_len(&self) -> usize {
        self.preview_len
    }
}

/// A result together with the steps that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traced<T> {
    /// Ordered steps
    pub steps: Vec<TraceStep>,
    /// Final result
    pub result: T,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_numbered_in_order() {
        let mut recorder = TraceRecorder::new(64);
        recorder.record("first", || Artifact::text("a"));
        recorder.record("second", || Artifact::info("b"));

        let steps = recorder.into_steps();
        assert_eq!(steps[0].step, 1);
        assert_eq!(steps[1].step, 2);
        assert_eq!(steps[1].name, "second");
    }

    #[test]
    fn test_no_trace_skips_builder() {
        let mut sink = NoTrace;
        sink.record("never", || panic!("builder must not run"));
    }

    #[test]
    fn test_redacted_key_shows_only_edges() {
        let key: Vec<u8> = (0u8..32).collect();
        let artifact = Artifact::redacted_key(&key);
        assert_eq!(artifact.data, "00010203...1c1d1e1f");
        assert_eq!(artifact.kind, ArtifactKind::HexPartial);
    }

    #[test]
    fn test_redacted_aes128_key_shows_quarter() {
        let key: Vec<u8> = (0u8..16).collect();
        assert_eq!(Artifact::redacted_key(&key).data, "0001...0e0f");

        assert_eq!(Artifact::redacted_key(&[0xAA; 8]).data, "...");
    }

    #[test]
    fn test_hex_preview_truncates() {
        let artifact = Artifact::hex_preview(&[0xAB; 100], 8);
        assert_eq!(artifact.data, "abababab...");
        assert_eq!(artifact.details["full_length"], "100");

        let short = Artifact::hex_preview(&[0xAB; 2], 8);
        assert_eq!(short.data, "abab");
        assert_eq!(short.kind, ArtifactKind::Hex);
    }

    #[test]
    fn test_pem_preview() {
        let artifact = Artifact::pem_preview("-----BEGIN PUBLIC KEY-----\nMIIB", 10);
        assert_eq!(artifact.data, "-----BEGIN...");
    }

    #[test]
    fn test_step_serialization() {
        let mut recorder = TraceRecorder::new(64);
        recorder.record("Convert to bytes (UTF-8)", || Artifact::hex(b"hi"));

        let json = serde_json::to_value(&recorder.steps()[0]).unwrap();
        assert_eq!(json["type"], "hex");
        assert_eq!(json["data"], "6869");
        assert_eq!(json["details"]["length"], "2");
    }
}
