//! PCM16 WAV encoding and the default WAV decoder.

use std::io::Cursor;

use thiserror::Error;

use super::pcm::PcmBuffer;
use crate::ports::{AudioDecodeError, AudioDecoder};

/// Size of the canonical RIFF/WAVE/PCM header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// WAV encoding failed.
#[derive(Debug, Error)]
pub enum WavEncodeError {
    #[error("Unsupported channel count {0}: only mono and stereo clips are written")]
    UnsupportedChannels(u16),

    #[error("WAV writer failed: {0}")]
    Writer(#[from] hound::Error),
}

/// Scale a float sample to PCM16.
///
/// Clamped to `[-1, 1]`, then negative values scale by `0x8000` and positive
/// by `0x7fff` so both ends reach full scale without wrapping.
#[must_use]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

/// Encode a mono or stereo buffer as a 16-bit PCM WAV file.
pub fn encode_wav(buffer: &PcmBuffer) -> Result<Vec<u8>, WavEncodeError> {
    if !(1..=2).contains(&buffer.channels) {
        return Err(WavEncodeError::UnsupportedChannels(buffer.channels));
    }

    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + buffer.samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        // Only whole frames are written.
        let whole = buffer.frames() * usize::from(buffer.channels);
        for &sample in &buffer.samples[..whole] {
            writer.write_sample(sample_to_i16(sample))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// [`AudioDecoder`] for WAV input (8/16/24/32-bit integer and float).
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer, AudioDecodeError> {
        let reader =
            hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioDecodeError(e.to_string()))?;
        let spec = reader.spec();

        let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let scale = 2f32.powi(i32::from(spec.bits_per_sample) - 1);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect()
            }
        };

        let samples = samples.map_err(|e| AudioDecodeError(e.to_string()))?;
        Ok(PcmBuffer::new(spec.sample_rate, spec.channels, samples))
    }
}
