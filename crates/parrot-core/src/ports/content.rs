//! Content source port.
//!
//! The content source is a black box that returns ordered chunk texts plus the
//! canonical full text. Chunk order is trusted as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Chunk, Material};

/// What to ask the content source for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub topic: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// One chunk as produced by the content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
}

/// Generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "original_text")]
    pub original_text: String,
    pub chunks: Vec<ContentChunk>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl GeneratedContent {
    /// Turn the content into a fresh, not-yet-synthesized material.
    pub fn into_material(self, language: Option<String>) -> Material {
        let mut material = Material::new(self.title);
        material.description = self.description;
        material.original_text = self.original_text;
        material.tags = self.tags;
        material.difficulty = self.difficulty;
        material.language = language;
        material.chunks = self
            .chunks
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .map(|c| Chunk {
                translation: c.translation,
                speaker: c.speaker,
                ..Chunk::new(c.text.trim())
            })
            .collect();
        material
    }
}

/// Errors from a content source.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content source failed: {0}")]
    Source(String),

    #[error("Content source returned no chunks")]
    Empty,
}

/// Producer of study content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn generate(&self, request: &ContentRequest) -> Result<GeneratedContent, ContentError>;
}
