//! Chunk playback engine.
//!
//! Plays material chunks one at a time through an [`AudioSink`], reports
//! progress on an event channel and pauses between chunks.
//!
//! ```text
//! Idle ─► Loading ─► Playing ─► Gap ─► Complete
//!   ▲                                     │
//!   └──────────── stop / finish ──────────┘
//! ```
//!
//! Chunks with pre-rendered audio are decoded through the hot cache and play
//! immediately. Chunks without audio are synthesized on demand (persistent
//! cache first). [`PlaybackEngine::stop`] cancels whichever of those steps is
//! running, including the pause between chunks.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use parrot_core::cache::{AudioPayload, CacheStore, SynthesisMode, audio_cache_key};
use parrot_core::ports::{AudioDecoder, SpeechSynthesizer, SynthesisRequest};
use parrot_core::services::resolve_speaker;
use parrot_core::settings::DEFAULT_LANGUAGE;
use parrot_core::{Chunk, GapSound, Material, NoiseKind, PcmBuffer, Settings};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cue::{CUE_SAMPLE_RATE, gap_cue};
use crate::error::VoiceError;
use crate::noise::noise_buffer;
use crate::sink::AudioSink;

/// Callback invoked when a chunk finishes naturally (after its gap).
pub type PlaybackDoneCallback = Box<dyn FnOnce() + Send + 'static>;

/// How often playback position is reported.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

// ── State & events ─────────────────────────────────────────────────

/// Current state of the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing is playing.
    Idle,
    /// Decoding or synthesizing the chunk's audio.
    Loading,
    /// Chunk audio is sounding.
    Playing,
    /// Pause after a chunk.
    Gap,
    /// The last chunk finished, including its gap.
    Complete,
}

/// Events emitted by the [`PlaybackEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    StateChanged(PlaybackState),

    /// Position within the chunk, in seconds of chunk audio.
    Progress { chunk_id: String, position: f64 },

    /// The chunk's audio reached its natural end.
    ChunkFinished { chunk_id: String },

    Error { chunk_id: String, message: String },
}

/// How a play call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Stopped,
}

// ── Configuration ──────────────────────────────────────────────────

/// Playback configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Pause after each chunk, in seconds. `0` disables the pause.
    pub gap_seconds: f64,
    pub gap_sound: GapSound,
    /// Playback rate multiplier.
    pub playback_rate: f32,

    /// Voice for on-demand synthesis when the chunk names none.
    pub speaker: Option<String>,
    /// Synthesis speed for on-demand synthesis.
    pub speed: f32,
    pub language: String,

    pub noise_kind: NoiseKind,
    pub noise_intensity: f32,
    /// Output volume of the noise bed.
    pub noise_gain: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::from(&Settings::with_defaults())
    }
}

impl From<&Settings> for PlaybackConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            gap_seconds: settings.effective_gap_seconds(),
            gap_sound: settings.gap_sound.unwrap_or_default(),
            playback_rate: settings.effective_playback_rate(),
            speaker: settings.default_speaker.clone(),
            speed: settings.effective_speed(),
            language: settings.effective_language().to_string(),
            noise_kind: settings.noise_kind.unwrap_or_default(),
            noise_intensity: settings.effective_noise_intensity(),
            noise_gain: 1.0,
        }
    }
}

/// Position reported after `elapsed` wall time: `elapsed × rate`, never past
/// the end of the clip.
pub fn progress_position(elapsed: Duration, rate: f32, clip_duration: f64) -> f64 {
    (elapsed.as_secs_f64() * f64::from(rate)).clamp(0.0, clip_duration.max(0.0))
}

// ── Engine ─────────────────────────────────────────────────────────

/// Sequential chunk player.
pub struct PlaybackEngine {
    sink: Arc<dyn AudioSink>,
    decoder: Arc<dyn AudioDecoder>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    cache: Arc<CacheStore>,
    config: PlaybackConfig,

    state: Mutex<PlaybackState>,
    /// Token of the current play call; replaced on each call.
    session: Mutex<CancellationToken>,
    event_tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create an engine.
    ///
    /// Returns the engine and a receiver for [`PlaybackEvent`]s.
    pub fn new(
        sink: Arc<dyn AudioSink>,
        decoder: Arc<dyn AudioDecoder>,
        cache: Arc<CacheStore>,
        config: PlaybackConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = Self {
            sink,
            decoder,
            synthesizer: None,
            cache,
            config,
            state: Mutex::new(PlaybackState::Idle),
            session: Mutex::new(CancellationToken::new()),
            event_tx,
        };
        (engine, event_rx)
    }

    /// Enable on-demand synthesis for chunks without audio.
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Play a single chunk, then its gap, then call `on_complete`.
    ///
    /// `on_complete` only fires on natural completion, never after `stop`.
    pub async fn play_chunk(
        &self,
        chunk: &Chunk,
        on_complete: Option<PlaybackDoneCallback>,
    ) -> Result<PlaybackOutcome, VoiceError> {
        let token = self.begin_session();
        self.run_chunk(chunk, &token, on_complete).await
    }

    /// Play every chunk of `material` in order and return to `Idle`.
    pub async fn play_material(&self, material: &Material) -> Result<PlaybackOutcome, VoiceError> {
        let token = self.begin_session();
        tracing::info!(material_id = %material.id, chunks = material.chunks.len(), "Playing material");

        for chunk in &material.chunks {
            if self.run_chunk(chunk, &token, None).await? == PlaybackOutcome::Stopped {
                tracing::info!(material_id = %material.id, chunk_id = %chunk.id, "Playback stopped");
                return Ok(PlaybackOutcome::Stopped);
            }
        }

        self.advance(&token, PlaybackState::Idle);
        Ok(PlaybackOutcome::Completed)
    }

    /// Stop playback, gap waits and on-demand synthesis. No-op when idle.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == PlaybackState::Idle {
                tracing::debug!("Stop requested while idle");
                return;
            }
            self.session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cancel();
            self.transition(&mut state, PlaybackState::Idle);
        }
        self.sink.stop();
        tracing::debug!("Playback stopped");
    }

    /// Start the background noise bed from the configured kind.
    ///
    /// `custom_audio` is the encoded user file for [`NoiseKind::Custom`].
    /// Returns `false` when noise is off.
    pub fn start_noise(&self, custom_audio: Option<&[u8]>) -> Result<bool, VoiceError> {
        let Some(noise) = noise_buffer(
            &mut rand::rng(),
            self.config.noise_kind,
            self.config.noise_intensity,
            custom_audio,
            self.decoder.as_ref(),
        ) else {
            return Ok(false);
        };
        self.sink.start_noise(noise, self.config.noise_gain)?;
        tracing::debug!(kind = ?self.config.noise_kind, intensity = self.config.noise_intensity, "Noise bed started");
        Ok(true)
    }

    pub fn stop_noise(&self) {
        self.sink.stop_noise();
    }

    // ── Chunk lifecycle ────────────────────────────────────────────

    async fn run_chunk(
        &self,
        chunk: &Chunk,
        token: &CancellationToken,
        on_complete: Option<PlaybackDoneCallback>,
    ) -> Result<PlaybackOutcome, VoiceError> {
        if !self.advance(token, PlaybackState::Loading) {
            return Ok(PlaybackOutcome::Stopped);
        }

        let clip = match self.load_clip(chunk, token).await {
            Ok(clip) => clip,
            Err(VoiceError::Cancelled) => return Ok(PlaybackOutcome::Stopped),
            Err(e) => return Err(self.fail(chunk, token, e)),
        };

        let rate = self.config.playback_rate;
        if let Err(e) = self.sink.play(Arc::clone(&clip), rate) {
            return Err(self.fail(chunk, token, e));
        }
        if !self.advance(token, PlaybackState::Playing) {
            self.sink.stop();
            return Ok(PlaybackOutcome::Stopped);
        }

        let duration = clip.duration();
        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(started + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
        loop {
            tokio::select! {
                () = token.cancelled() => return Ok(PlaybackOutcome::Stopped),
                _ = ticker.tick() => {}
            }
            let position = progress_position(started.elapsed(), rate, duration);
            self.emit(PlaybackEvent::Progress {
                chunk_id: chunk.id.clone(),
                position,
            });
            if !self.sink.is_playing() {
                break;
            }
        }
        self.emit(PlaybackEvent::ChunkFinished {
            chunk_id: chunk.id.clone(),
        });

        let gap = self.config.gap_seconds;
        if gap > 0.0 {
            if !self.advance(token, PlaybackState::Gap) {
                return Ok(PlaybackOutcome::Stopped);
            }
            if self.config.gap_sound == GapSound::Beep {
                if let Err(e) = self.sink.play_cue(gap_cue(CUE_SAMPLE_RATE)) {
                    tracing::warn!(error = %e, "Gap cue failed");
                }
            }
            tokio::select! {
                () = token.cancelled() => return Ok(PlaybackOutcome::Stopped),
                () = tokio::time::sleep(Duration::from_secs_f64(gap)) => {}
            }
        }

        if !self.advance(token, PlaybackState::Complete) {
            return Ok(PlaybackOutcome::Stopped);
        }
        if let Some(on_complete) = on_complete {
            on_complete();
        }
        Ok(PlaybackOutcome::Completed)
    }

    /// Decoded audio for `chunk`: pre-rendered clip or on-demand synthesis.
    async fn load_clip(
        &self,
        chunk: &Chunk,
        token: &CancellationToken,
    ) -> Result<Arc<PcmBuffer>, VoiceError> {
        if let Some(cached) = self.cache.decoded(&chunk.id) {
            return Ok(cached);
        }

        match chunk.audio_bytes() {
            Some(Ok(bytes)) => {
                let clip = Arc::new(self.decoder.decode(&bytes)?);
                self.cache.remember_decoded(chunk.id.clone(), Arc::clone(&clip));
                Ok(clip)
            }
            Some(Err(e)) => Err(VoiceError::InvalidAudioData {
                chunk_id: chunk.id.clone(),
                reason: e.to_string(),
            }),
            None => self.synthesize_clip(chunk, token).await,
        }
    }

    async fn synthesize_clip(
        &self,
        chunk: &Chunk,
        token: &CancellationToken,
    ) -> Result<Arc<PcmBuffer>, VoiceError> {
        let Some(synthesizer) = self.synthesizer.as_deref() else {
            return Err(VoiceError::NoAudio(chunk.id.clone()));
        };

        let requested = chunk.speaker.as_deref().or(self.config.speaker.as_deref());
        let speaker = tokio::select! {
            () = token.cancelled() => return Err(VoiceError::Cancelled),
            speaker = resolve_speaker(synthesizer, requested) => speaker?,
        };

        let key = audio_cache_key(&chunk.text, &speaker, SynthesisMode::Chunk, self.config.speed);
        if let Some(cached) = self.cache.decoded(&key) {
            return Ok(cached);
        }

        let stored = match self.cache.get_audio(&key).await {
            Ok(payload) => payload.and_then(|p| p.audio_bytes()),
            Err(e) => {
                tracing::warn!(error = %e, "Audio cache read failed");
                None
            }
        };

        let bytes = if let Some(bytes) = stored {
            tracing::debug!(chunk_id = %chunk.id, "On-demand audio from cache");
            bytes
        } else {
            let request = SynthesisRequest {
                text: chunk.text.clone(),
                speaker: speaker.clone(),
                speed: self.config.speed,
                language: if self.config.language.is_empty() {
                    DEFAULT_LANGUAGE.to_string()
                } else {
                    self.config.language.clone()
                },
            };
            let result = tokio::select! {
                () = token.cancelled() => return Err(VoiceError::Cancelled),
                result = synthesizer.synthesize(&request) => result?,
            };
            tracing::debug!(chunk_id = %chunk.id, %speaker, "Synthesized chunk on demand");

            let payload = AudioPayload::from_bytes(
                &result.audio,
                result.words.unwrap_or_default(),
                result.duration_seconds,
            );
            if let Err(e) = self.cache.put_chunk_audio(&key, &chunk.id, &payload).await {
                tracing::warn!(error = %e, "Skipping audio cache write");
            }
            result.audio
        };

        let clip = Arc::new(self.decoder.decode(&bytes)?);
        self.cache.remember_decoded(key, Arc::clone(&clip));
        Ok(clip)
    }

    // ── Internal helpers ───────────────────────────────────────────

    /// Cancel the running session, if any, and start a new one.
    fn begin_session(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = std::mem::replace(
            &mut *self.session.lock().unwrap_or_else(PoisonError::into_inner),
            token.clone(),
        );
        previous.cancel();
        token
    }

    /// Move to `next` unless this session was stopped.
    fn advance(&self, token: &CancellationToken, next: PlaybackState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return false;
        }
        self.transition(&mut state, next);
        true
    }

    fn transition(&self, state: &mut PlaybackState, next: PlaybackState) {
        if *state != next {
            tracing::debug!(old = ?*state, new = ?next, "Playback state transition");
            *state = next;
            self.emit(PlaybackEvent::StateChanged(next));
        }
    }

    fn fail(&self, chunk: &Chunk, token: &CancellationToken, error: VoiceError) -> VoiceError {
        tracing::warn!(chunk_id = %chunk.id, error = %error, "Chunk playback failed");
        self.emit(PlaybackEvent::Error {
            chunk_id: chunk.id.clone(),
            message: error.to_string(),
        });
        self.advance(token, PlaybackState::Idle);
        error
    }

    /// Best-effort: a dropped receiver is logged and ignored.
    fn emit(&self, event: PlaybackEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Playback event receiver dropped");
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
