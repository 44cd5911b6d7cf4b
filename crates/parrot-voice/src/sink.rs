//! Output device port.
//!
//! The playback engine only talks to an [`AudioSink`]. [`RodioSink`]
//! (in `audio_thread`) drives the real device; tests use an in-memory sink.
//!
//! [`RodioSink`]: crate::audio_thread::RodioSink

use std::sync::Arc;

use parrot_core::PcmBuffer;

use crate::error::VoiceError;

/// A device that can play one clip at a time plus a looping noise bed.
///
/// All methods are synchronous and return quickly; completion is observed by
/// polling [`is_playing`](AudioSink::is_playing).
pub trait AudioSink: Send + Sync {
    /// Replace whatever is playing with `clip`, played at `rate`.
    ///
    /// Implementations resume a suspended device before starting.
    fn play(&self, clip: Arc<PcmBuffer>, rate: f32) -> Result<(), VoiceError>;

    /// Whether the current clip is still sounding.
    fn is_playing(&self) -> bool;

    /// Silence the current clip.
    fn stop(&self);

    /// Play a short cue without affecting `is_playing`.
    fn play_cue(&self, cue: PcmBuffer) -> Result<(), VoiceError>;

    /// Start looping `noise` at `gain`, replacing any running noise.
    fn start_noise(&self, noise: PcmBuffer, gain: f32) -> Result<(), VoiceError>;

    fn stop_noise(&self);
}
