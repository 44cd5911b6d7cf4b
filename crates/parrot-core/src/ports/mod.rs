//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx`, `reqwest` or `rodio` types in any signature
//! - Repository-style ports are minimal and CRUD-focused
//! - Engine ports carry concrete, validated DTOs rather than loose JSON

pub mod audio_decoder;
pub mod content;
pub mod kv_store;
pub mod settings_repository;
pub mod speech;

use thiserror::Error;

pub use audio_decoder::{AudioDecodeError, AudioDecoder};
pub use content::{ContentChunk, ContentError, ContentRequest, ContentSource, GeneratedContent};
#[cfg(test)]
pub use content::MockContentSource;
#[cfg(any(test, feature = "test-utils"))]
pub use kv_store::MemoryKvStore;
pub use kv_store::{Collection, KvStore};
pub use settings_repository::SettingsRepository;
pub use speech::{
    AlignedSegment, AlignmentRequest, AlignmentResponse, ForcedAligner, SpeechError,
    SpeechSynthesizer, SynthesisRequest, SynthesisResult, VoiceInfo,
};
#[cfg(test)]
pub use speech::{MockForcedAligner, MockSpeechSynthesizer};

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Top-level error returned by core services.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Speech engine failed.
    #[error(transparent)]
    Speech(#[from] SpeechError),

    /// Content source failed.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Audio bytes could not be decoded.
    #[error(transparent)]
    Decode(#[from] AudioDecodeError),

    /// Slicing the full track into clips failed.
    #[error(transparent)]
    Slice(#[from] crate::audio::SliceError),

    /// Cache store failed.
    #[error(transparent)]
    Cache(#[from] crate::cache::CacheError),

    /// Material compression or decompression failed.
    #[error(transparent)]
    Codec(#[from] crate::codec::CodecError),

    /// Import file was rejected.
    #[error(transparent)]
    Import(#[from] crate::transfer::ImportError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),
}
