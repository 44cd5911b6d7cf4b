//! Core of parrot: turning one synthesized audio track and an unreliable word
//! stream into timed, per-chunk audio clips.
//!
//! - [`alignment`]: fuzzy word → chunk assignment and chunk boundaries
//! - [`audio`]: PCM buffers, WAV encoding and per-chunk slicing
//! - [`cache`]: content-addressed persistent cache with hysteresis eviction
//! - [`codec`]: versioned, compressed material serialization
//! - [`transfer`]: JSON export and import
//! - [`services`]: generation pipeline, material and settings services
//!
//! Infrastructure (`SQLite`, HTTP engines, audio output) lives in the adapter
//! crates behind the traits in [`ports`].

#![deny(unused_crate_dependencies)]

pub mod alignment;
pub mod audio;
pub mod cache;
pub mod codec;
pub mod domain;
pub mod paths;
pub mod ports;
pub mod services;
pub mod settings;
pub mod transfer;
pub mod utils;

// Re-export commonly used types for convenience
pub use alignment::{AlignmentOutcome, AlignmentStats, BoundaryReport, align_words, recalculate_boundaries};
pub use audio::{PcmBuffer, SliceError, WavDecoder, encode_wav, extract_segment, slice_material_audio};
pub use cache::{
    AudioPayload, CacheEntry, CacheError, CacheLimits, CacheNamespace, CacheStats, CacheStore,
    HotCache, SynthesisMode, audio_cache_key, text_cache_key,
};
pub use codec::{CODEC_VERSION, CodecError, CompressedMaterial, compress, decompress};
pub use domain::{Chunk, Material, VoiceConfig, WordTimestamp};
pub use paths::{PathError, data_root, database_path};
pub use ports::{
    AudioDecodeError, AudioDecoder, Collection, ContentError, ContentRequest, ContentSource,
    CoreError, ForcedAligner, GeneratedContent, KvStore, RepositoryError, SettingsRepository,
    SpeechError, SpeechSynthesizer,
};
pub use services::{GenerationOptions, GenerationService, MaterialService, SettingsService};
pub use settings::{GapSound, NoiseKind, Settings, SettingsError, SettingsUpdate, validate_settings};
pub use transfer::{ExportBundle, ImportError, parse_import};
