//! Background noise buffers.
//!
//! Noise is rendered once into a short buffer that the sink loops for as long
//! as it runs. Intensity `i` is in `[0, 1]`:
//!
//! - white: uniform in `[-i/2, i/2]`
//! - gaussian: standard normal (Box–Muller) scaled by `i`, clamped to `[-1, 1]`
//! - custom: decoded user audio scaled by `i`, white noise if it fails to decode

use std::f32::consts::TAU;

use parrot_core::ports::AudioDecoder;
use parrot_core::{NoiseKind, PcmBuffer};
use rand::Rng;

/// Sample rate generated noise is rendered at.
pub const NOISE_SAMPLE_RATE: u32 = 24_000;

/// Length of the generated loop.
pub const NOISE_LOOP_SECONDS: u32 = 2;

/// Uniform white noise.
pub fn white_noise<R: Rng + ?Sized>(rng: &mut R, frames: usize, intensity: f32) -> Vec<f32> {
    let half = intensity.clamp(0.0, 1.0) / 2.0;
    (0..frames).map(|_| rng.random_range(-half..=half)).collect()
}

/// Gaussian noise via the Box–Muller transform.
pub fn gaussian_noise<R: Rng + ?Sized>(rng: &mut R, frames: usize, intensity: f32) -> Vec<f32> {
    let intensity = intensity.clamp(0.0, 1.0);
    (0..frames)
        .map(|_| {
            // u1 in (0, 1] keeps ln finite
            let u1: f32 = 1.0 - rng.random::<f32>();
            let u2: f32 = rng.random();
            let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
            (z * intensity).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Build the looped noise buffer for `kind`, or `None` when noise is off.
pub fn noise_buffer<R: Rng + ?Sized>(
    rng: &mut R,
    kind: NoiseKind,
    intensity: f32,
    custom_audio: Option<&[u8]>,
    decoder: &dyn AudioDecoder,
) -> Option<PcmBuffer> {
    let frames = (NOISE_SAMPLE_RATE * NOISE_LOOP_SECONDS) as usize;
    let white = |rng: &mut R| PcmBuffer::mono(NOISE_SAMPLE_RATE, white_noise(rng, frames, intensity));

    match kind {
        NoiseKind::Off => None,
        NoiseKind::White => Some(white(rng)),
        NoiseKind::Gaussian => Some(PcmBuffer::mono(
            NOISE_SAMPLE_RATE,
            gaussian_noise(rng, frames, intensity),
        )),
        NoiseKind::Custom => {
            let decoded = match custom_audio {
                Some(bytes) => decoder.decode(bytes).map_err(|e| e.to_string()),
                None => Err("no custom noise audio provided".to_string()),
            };
            match decoded {
                Ok(mut buffer) if !buffer.is_empty() => {
                    let gain = intensity.clamp(0.0, 1.0);
                    for s in &mut buffer.samples {
                        *s *= gain;
                    }
                    Some(buffer)
                }
                Ok(_) => {
                    tracing::warn!("Custom noise audio is empty, using white noise");
                    Some(white(rng))
                }
                Err(reason) => {
                    tracing::warn!(%reason, "Custom noise unusable, using white noise");
                    Some(white(rng))
                }
            }
        }
    }
}
