//! Gap cue: a short decaying sine beep played between chunks.

use std::f32::consts::TAU;

use parrot_core::PcmBuffer;

/// Cue pitch.
pub const CUE_FREQUENCY_HZ: f32 = 800.0;

/// Cue length in seconds.
pub const CUE_SECONDS: f32 = 0.1;

/// Sample rate the cue is rendered at.
pub const CUE_SAMPLE_RATE: u32 = 24_000;

const CUE_START_GAIN: f32 = 0.3;
const CUE_END_GAIN: f32 = 0.01;

/// Render the gap cue as mono PCM.
///
/// Gain decays exponentially from `CUE_START_GAIN` to `CUE_END_GAIN` over
/// the cue length.
pub fn gap_cue(sample_rate: u32) -> PcmBuffer {
    let rate = sample_rate.max(1) as f32;
    let frames = (CUE_SECONDS * rate).round() as usize;
    let decay = (CUE_START_GAIN / CUE_END_GAIN).ln() / CUE_SECONDS;

    let samples = (0..frames)
        .map(|n| {
            let t = n as f32 / rate;
            let gain = CUE_START_GAIN * (-decay * t).exp();
            gain * (TAU * CUE_FREQUENCY_HZ * t).sin()
        })
        .collect();

    PcmBuffer::mono(sample_rate, samples)
}
