//! Chunk and word timing types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// A single word with its timing, in seconds.
///
/// Times are absolute (relative to the full track) while a word stream is
/// being aligned, and relative to the owning chunk once boundaries have been
/// recalculated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTimestamp {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    /// Length of the word in seconds (never negative).
    #[must_use]
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Validate a word stream received from an external engine.
///
/// Drops words with empty text or non-finite times, clamps negative starts to
/// zero and pulls `end` up to `start` when an engine reports them inverted.
/// Order is preserved.
pub fn sanitize_word_stream(words: Vec<WordTimestamp>) -> Vec<WordTimestamp> {
    let before = words.len();
    let cleaned: Vec<WordTimestamp> = words
        .into_iter()
        .filter(|w| !w.word.trim().is_empty() && w.start.is_finite() && w.end.is_finite())
        .map(|w| {
            let start = w.start.max(0.0);
            WordTimestamp {
                word: w.word.trim().to_string(),
                start,
                end: w.end.max(start),
            }
        })
        .collect();

    if cleaned.len() != before {
        tracing::debug!(
            dropped = before - cleaned.len(),
            kept = cleaned.len(),
            "Dropped malformed words from engine stream"
        );
    }
    cleaned
}

/// A learner-facing span of text with its own play window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    #[serde(default)]
    pub id: String,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    #[serde(default, alias = "start_time")]
    pub start_time: f64,

    #[serde(default, alias = "end_time")]
    pub end_time: f64,

    /// Words with chunk-relative timing.
    #[serde(default)]
    pub words: Vec<WordTimestamp>,

    /// Base64-encoded WAV clip for this chunk.
    #[serde(default, alias = "audio_data", skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
}

impl Chunk {
    /// Create a chunk with a fresh id and no timing yet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            translation: None,
            speaker: None,
            start_time: 0.0,
            end_time: 0.0,
            words: Vec::new(),
            audio_data: None,
        }
    }

    /// Play window length in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Whether word-level highlighting can be shown for this chunk.
    ///
    /// Requires words whose joined text reproduces `text` (whitespace
    /// normalised). Anything else falls back to bare-text display.
    #[must_use]
    pub fn highlighting_enabled(&self) -> bool {
        if self.words.is_empty() {
            return false;
        }
        let joined = self
            .words
            .iter()
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let expected = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
        joined == expected
    }

    /// Decode the stored clip, if any.
    pub fn audio_bytes(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        self.audio_data.as_ref().map(|data| BASE64.decode(data))
    }

    /// Store an encoded clip.
    pub fn set_audio_bytes(&mut self, bytes: &[u8]) {
        self.audio_data = Some(BASE64.encode(bytes));
    }
}
