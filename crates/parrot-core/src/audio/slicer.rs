//! Per-chunk audio extraction from one full track.

use super::pcm::PcmBuffer;
use super::wav::{WavEncodeError, encode_wav};
use crate::domain::Chunk;
use crate::ports::{AudioDecodeError, AudioDecoder};

/// Errors from [`slice_material_audio`].
#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    #[error(transparent)]
    Decode(#[from] AudioDecodeError),

    #[error(transparent)]
    Encode(#[from] WavEncodeError),
}

/// Extract `[start_sec, end_sec)` from `full`.
///
/// The frame range is `[floor(start·sr), min(ceil(end·sr), total))`, clamped
/// to the buffer. Out-of-range or inverted windows give a short or empty clip;
/// this never panics.
#[must_use]
pub fn extract_segment(full: &PcmBuffer, start_sec: f64, end_sec: f64) -> PcmBuffer {
    let total = full.frames();
    let rate = f64::from(full.sample_rate);

    let to_frame = |t: f64, round: fn(f64) -> f64| -> usize {
        if t.is_nan() || t <= 0.0 {
            return 0;
        }
        let f = round(t * rate);
        if f >= total as f64 { total } else { f as usize }
    };

    let start = to_frame(start_sec, f64::floor);
    let end = to_frame(end_sec, f64::ceil).max(start);

    let channels = usize::from(full.channels.max(1));
    PcmBuffer::new(
        full.sample_rate,
        full.channels,
        full.samples[start * channels..end * channels].to_vec(),
    )
}

/// Cut the full track into per-chunk WAV clips stored on each chunk.
///
/// The full track is decoded once; a decode failure is returned rather than
/// producing clips from garbage samples. `on_clip` receives the index of each
/// finished chunk, and the task yields to the runtime between chunks.
pub async fn slice_material_audio(
    full_audio: &[u8],
    decoder: &dyn AudioDecoder,
    chunks: &mut [Chunk],
    on_clip: &(dyn Fn(usize) + Send + Sync),
) -> Result<PcmBuffer, SliceError> {
    let full = decoder.decode(full_audio)?;
    tracing::debug!(
        frames = full.frames(),
        sample_rate = full.sample_rate,
        chunks = chunks.len(),
        "Slicing full track into chunk clips"
    );

    for (index, chunk) in chunks.iter_mut().enumerate() {
        let clip = extract_segment(&full, chunk.start_time, chunk.end_time);
        let bytes = encode_wav(&clip)?;
        chunk.set_audio_bytes(&bytes);
        on_clip(index);
        tokio::task::yield_now().await;
    }

    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WavDecoder;

    fn ramp(frames: usize, rate: u32) -> PcmBuffer {
        PcmBuffer::mono(
            rate,
            (0..frames).map(|i| i as f32 / frames as f32).collect(),
        )
    }

    #[test]
    fn test_full_window_reproduces_buffer() {
        let buf = ramp(16_001, 16_000);
        let clip = extract_segment(&buf, 0.0, buf.duration());
        assert_eq!(clip, buf);
    }

    #[test]
    fn test_window_past_end_is_clamped() {
        let buf = ramp(1_000, 1_000);
        let clip = extract_segment(&buf, 0.75, 5.0);
        assert_eq!(clip.frames(), 250);
        assert!((clip.samples[0] - buf.samples[750]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_window_fully_outside_is_empty() {
        let buf = ramp(1_000, 1_000);
        assert!(extract_segment(&buf, 3.0, 4.0).is_empty());
        assert!(extract_segment(&buf, 0.5, 0.2).is_empty());
        assert!(extract_segment(&buf, f64::NAN, f64::INFINITY).frames() == 1_000);
    }

    #[test]
    fn test_frame_rounding_floor_and_ceil() {
        let buf = ramp(100, 10);
        // 0.15s → floor 1.5 = 1, 0.31s → ceil 3.1 = 4
        let clip = extract_segment(&buf, 0.15, 0.31);
        assert_eq!(clip.frames(), 3);
    }

    #[test]
    fn test_stereo_extracts_whole_frames() {
        let buf = PcmBuffer::new(2, 2, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        let clip = extract_segment(&buf, 0.5, 1.5);
        assert_eq!(clip.samples, vec![2.0, -2.0, 3.0, -3.0]);
    }

    #[tokio::test]
    async fn test_slice_material_audio_writes_clips() {
        let full = PcmBuffer::mono(1_000, vec![0.1; 2_000]);
        let bytes = encode_wav(&full).unwrap();

        let mut chunks = vec![Chunk::new("a"), Chunk::new("b")];
        chunks[0].end_time = 1.0;
        chunks[1].start_time = 1.0;
        chunks[1].end_time = 2.5;

        let seen = std::sync::Mutex::new(Vec::new());
        slice_material_audio(&bytes, &WavDecoder, &mut chunks, &|i| seen.lock().unwrap().push(i))
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);

        let first = WavDecoder.decode(&chunks[0].audio_bytes().unwrap().unwrap()).unwrap();
        let second = WavDecoder.decode(&chunks[1].audio_bytes().unwrap().unwrap()).unwrap();
        assert_eq!(first.frames(), 1_000);
        assert_eq!(second.frames(), 1_000);
    }

    #[tokio::test]
    async fn test_slice_material_audio_propagates_decode_error() {
        let mut chunks = vec![Chunk::new("a")];
        let err = slice_material_audio(b"RIFFjunk", &WavDecoder, &mut chunks, &|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SliceError::Decode(_)));
        assert!(chunks[0].audio_data.is_none());
    }
}
