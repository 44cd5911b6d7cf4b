//! Speech engine ports: synthesizer and forced aligner.
//!
//! # Design Rules
//!
//! - Wire shapes are plain serde structs; adapters own transport details.
//! - Word payloads are always [`WordTimestamp`]; callers sanitize them with
//!   [`sanitize_word_stream`](crate::domain::sanitize_word_stream).
//! - Neither port retries internally. Retry policy lives in the services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::WordTimestamp;

// ── DTOs ─────────────────────────────────────────────────────────────────────

/// Input to a synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub text: String,
    pub speaker: String,
    pub speed: f32,
    pub language: String,
}

/// Output of a synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Encoded audio (WAV).
    pub audio: Vec<u8>,
    /// Rough word timings, when the engine provides them.
    pub words: Option<Vec<WordTimestamp>>,
    pub duration_seconds: f64,
}

/// A voice offered by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Input to a forced-alignment call.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRequest {
    pub audio: Vec<u8>,
    /// Transcript the audio was synthesized from.
    pub transcript: String,
    pub language: String,
    pub model: String,
}

/// One recognizer segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedSegment {
    #[serde(default)]
    pub words: Vec<WordTimestamp>,
}

/// Output of a forced-alignment call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResponse {
    #[serde(default)]
    pub segments: Vec<AlignedSegment>,
}

impl AlignmentResponse {
    /// All segment words, in order, as one flat stream.
    #[must_use]
    pub fn flatten(self) -> Vec<WordTimestamp> {
        self.segments.into_iter().flat_map(|s| s.words).collect()
    }
}

// ── Error ────────────────────────────────────────────────────────────────────

/// Errors returned by speech engine ports.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No voice could be resolved for synthesis.
    #[error("No usable voice: {0}. Pick a voice listed by the synthesizer or set `default_speaker`")]
    SpeakerUnavailable(String),

    /// The forced aligner could not be reached or failed.
    #[error("Forced alignment unavailable: {0}")]
    AlignmentUnavailable(String),

    /// The engine rejected or failed the request.
    #[error("Speech engine request failed: {0}")]
    Request(String),

    /// The engine answered with something we could not use.
    #[error("Invalid speech engine response: {0}")]
    InvalidResponse(String),

    /// The call did not finish in time.
    #[error("Speech engine call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

// ── Port traits ──────────────────────────────────────────────────────────────

/// Text-to-speech engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult, SpeechError>;

    /// List voices. Callers time-box this.
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;
}

/// Forced aligner: audio + transcript → precise word timings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForcedAligner: Send + Sync {
    async fn align(&self, request: &AlignmentRequest) -> Result<AlignmentResponse, SpeechError>;
}
