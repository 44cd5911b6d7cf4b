//! Playback error types.

use parrot_core::ports::{AudioDecodeError, SpeechError};

/// Errors that can occur while playing materials.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Failed to open the audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The audio thread exited and no longer answers commands.
    #[error("Audio thread is no longer running")]
    AudioThreadDied,

    /// Chunk audio could not be decoded.
    #[error(transparent)]
    Decode(#[from] AudioDecodeError),

    /// On-demand synthesis failed.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] SpeechError),

    /// The chunk has no audio and no synthesizer is configured.
    #[error("Chunk {0} has no audio and no synthesizer is configured")]
    NoAudio(String),

    /// Stored chunk audio is not valid base64.
    #[error("Chunk {chunk_id} audio is not valid base64: {reason}")]
    InvalidAudioData { chunk_id: String, reason: String },

    /// Playback was stopped.
    #[error("Playback cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_convert() {
        let err: VoiceError = SpeechError::SpeakerUnavailable("zoe".into()).into();
        assert!(matches!(err, VoiceError::Synthesis(SpeechError::SpeakerUnavailable(_))));

        let err: VoiceError = AudioDecodeError("not a wav".into()).into();
        assert_eq!(err.to_string(), "Failed to decode audio: not a wav");
    }
}
