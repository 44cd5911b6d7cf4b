//! Audio side of parrot: chunk playback, the output device actor, gap cues,
//! background noise and HTTP speech engine adapters.

pub mod audio_thread;
pub mod backend;
pub mod cue;
pub mod error;
pub mod noise;
pub mod playback;
pub mod sink;

pub use audio_thread::RodioSink;
pub use backend::{HttpAligner, HttpBackendConfig, HttpSynthesizer};
pub use error::VoiceError;
pub use playback::{
    PlaybackConfig, PlaybackDoneCallback, PlaybackEngine, PlaybackEvent, PlaybackOutcome,
    PlaybackState,
};
pub use sink::AudioSink;
