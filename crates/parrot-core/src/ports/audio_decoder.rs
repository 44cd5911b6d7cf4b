//! Audio decoding port.
//!
//! Turning encoded audio into samples is an audio-runtime capability. The
//! core only depends on this trait; [`WavDecoder`](crate::audio::WavDecoder)
//! is the default implementation.

use thiserror::Error;

use crate::audio::PcmBuffer;

/// Audio bytes could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to decode audio: {0}")]
pub struct AudioDecodeError(pub String);

/// Decoder from encoded bytes to interleaved PCM.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioDecodeError>;
}
