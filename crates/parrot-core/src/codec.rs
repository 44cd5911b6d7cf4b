//! Versioned, compressed material serialization.
//!
//! A material is wrapped in a `{version, material}` envelope, serialized to
//! JSON, deflated with zlib at a fixed level and base64-encoded. Decoding is
//! lenient: unknown versions and unversioned legacy payloads are decoded on a
//! best-effort basis through the serde aliases and defaults on [`Material`].

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Material;

/// Envelope version written by [`compress`].
pub const CODEC_VERSION: u32 = 1;

/// zlib level. Fixed so identical input always yields identical output.
const COMPRESSION_LEVEL: u32 = 6;

/// Compressed material with its size accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedMaterial {
    /// Base64 of the zlib stream.
    pub data: String,
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressedMaterial {
    /// Compressed size over original size.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.compressed_size as f64 / self.original_size as f64
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Compression stream failed: {0}")]
    Zlib(#[from] std::io::Error),

    #[error("Invalid material JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    material: &'a Material,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyEnvelope {
    Versioned {
        version: serde_json::Value,
        material: Box<Material>,
    },
    Legacy(Box<Material>),
}

/// Replace non-finite word times with zero; JSON has no encoding for them.
fn normalized(material: &Material) -> Material {
    let mut m = material.clone();
    let fix = |v: f64| if v.is_finite() { v } else { 0.0 };
    for chunk in &mut m.chunks {
        chunk.start_time = fix(chunk.start_time);
        chunk.end_time = fix(chunk.end_time);
        for w in &mut chunk.words {
            w.start = fix(w.start);
            w.end = fix(w.end);
        }
    }
    m.duration = fix(m.duration);
    m
}

/// Serialize and compress a material.
pub fn compress(material: &Material) -> Result<CompressedMaterial, CodecError> {
    let material = normalized(material);
    let json = serde_json::to_vec(&EnvelopeRef {
        version: CODEC_VERSION,
        material: &material,
    })?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    tracing::debug!(
        material_id = %material.id,
        original_size = json.len(),
        compressed_size = compressed.len(),
        "Compressed material"
    );

    Ok(CompressedMaterial {
        data: BASE64.encode(&compressed),
        original_size: json.len(),
        compressed_size: compressed.len(),
    })
}

/// Decompress and deserialize a material produced by [`compress`].
///
/// Version mismatches only warn.
pub fn decompress(data: &str) -> Result<Material, CodecError> {
    let compressed = BASE64.decode(data.trim())?;
    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

    match serde_json::from_slice::<AnyEnvelope>(&json) {
        Ok(AnyEnvelope::Versioned { version, material }) => {
            if version.as_u64() != Some(u64::from(CODEC_VERSION)) {
                tracing::warn!(
                    %version,
                    expected = CODEC_VERSION,
                    "Material envelope version mismatch, decoding best-effort"
                );
            }
            Ok(*material)
        }
        Ok(AnyEnvelope::Legacy(material)) => {
            tracing::warn!("Material payload has no envelope, decoding as legacy format");
            Ok(*material)
        }
        Err(envelope_err) => {
            // The strict legacy parse names the offending field.
            match serde_json::from_slice::<Material>(&json) {
                Ok(material) => Ok(material),
                Err(e) => {
                    tracing::debug!(error = %envelope_err, "Envelope parse failed");
                    Err(e.into())
                }
            }
        }
    }
}
