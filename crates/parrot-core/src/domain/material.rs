//! Materials: titled sequences of chunks with their voice configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chunk::Chunk;

/// Voice parameters a material's audio was generated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub speaker: String,
    pub speed: f32,
    #[serde(alias = "generated_at")]
    pub generated_at: DateTime<Utc>,
}

/// A study material.
///
/// `original_text` is the ground truth for the concatenation of chunk texts;
/// drift between the two is tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default)]
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, alias = "original_text")]
    pub original_text: String,

    #[serde(default)]
    pub chunks: Vec<Chunk>,

    /// Total duration in seconds.
    #[serde(default)]
    pub duration: f64,

    #[serde(default, alias = "voice_config", skip_serializing_if = "Option::is_none")]
    pub voice_config: Option<VoiceConfig>,

    #[serde(default, alias = "tts_generated")]
    pub tts_generated: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,

    /// Language code of the material text (e.g. `"en"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default = "Utc::now", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Material {
    /// Create an empty material with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            original_text: String::new(),
            chunks: Vec::new(),
            duration: 0.0,
            voice_config: None,
            tts_generated: false,
            tags: Vec::new(),
            difficulty: None,
            language: None,
            created_at: Utc::now(),
        }
    }

    /// Fill in ids for the material and any chunk that arrived without one.
    pub fn ensure_ids(&mut self) {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        for chunk in &mut self.chunks {
            if chunk.id.trim().is_empty() {
                chunk.id = uuid::Uuid::new_v4().to_string();
            }
        }
    }

    /// Chunk texts joined with single spaces, as sent to synthesis.
    #[must_use]
    pub fn joined_chunk_text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Look up a chunk by id.
    #[must_use]
    pub fn chunk(&self, chunk_id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id == chunk_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_ids_fills_missing() {
        let mut material = Material::new("t");
        material.id.clear();
        material.chunks.push(Chunk {
            id: String::new(),
            ..Chunk::new("a")
        });

        material.ensure_ids();
        assert!(!material.id.is_empty());
        assert!(!material.chunks[0].id.is_empty());
    }

    #[test]
    fn test_joined_chunk_text_skips_blank_chunks() {
        let mut material = Material::new("t");
        material.chunks = vec![Chunk::new(" I went to "), Chunk::new(""), Chunk::new("the store")];
        assert_eq!(material.joined_chunk_text(), "I went to the store");
    }

    #[test]
    fn test_minimal_json_deserializes_with_defaults() {
        let material: Material = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(material.title, "x");
        assert!(material.chunks.is_empty());
        assert!(!material.tts_generated);
    }
}
