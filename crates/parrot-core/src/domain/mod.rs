//! Domain types for study materials.
//!
//! These are pure data types with serde support. The JSON shape (camelCase,
//! with snake_case aliases accepted on input) is the export/import format.

pub mod chunk;
pub mod material;

pub use chunk::{Chunk, WordTimestamp, sanitize_word_stream};
pub use material::{Material, VoiceConfig};
