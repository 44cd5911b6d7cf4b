//! Generation pipeline: content → speech → alignment → boundaries → clips.
//!
//! The pipeline synthesizes each material as one continuous track, obtains a
//! word stream (forced aligner first, synthesizer words as fallback), assigns
//! it to chunks, derives non-overlapping chunk windows and finally slices the
//! track into per-chunk WAV clips. Cache failures never abort a run.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::alignment::{AlignmentStats, align_words, estimate_timestamps, recalculate_boundaries};
use crate::audio::slice_material_audio;
use crate::cache::{AudioPayload, CacheStore, SynthesisMode, audio_cache_key, text_cache_key};
use crate::domain::{Material, VoiceConfig, WordTimestamp, sanitize_word_stream};
use crate::ports::{
    AlignmentRequest, AudioDecoder, ContentError, ContentRequest, ContentSource, CoreError,
    ForcedAligner, GeneratedContent, SpeechError, SpeechSynthesizer, SynthesisRequest,
};
use crate::settings::Settings;
use crate::utils::{ALIGNER_ATTEMPTS, ALIGNER_BACKOFF_STEP, retry_linear};

/// Upper bound on voice discovery.
pub const VOICE_LIST_TIMEOUT: Duration = Duration::from_secs(3);

// ── Options & progress ─────────────────────────────────────────────────────

/// Parameters for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Preferred voice. Resolved against the synthesizer's voice list.
    pub speaker: Option<String>,
    pub speed: f32,
    pub language: String,
    pub aligner_model: String,
}

impl From<&Settings> for GenerationOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            speaker: settings.default_speaker.clone(),
            speed: settings.effective_speed(),
            language: settings.effective_language().to_string(),
            aligner_model: settings.effective_aligner_model().to_string(),
        }
    }
}

/// Pipeline stage reported through progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Content,
    Synthesis,
    Alignment,
    Slicing,
    Done,
}

/// Incremental progress of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationProgress {
    pub stage: GenerationStage,
    pub completed: usize,
    pub total: usize,
}

impl GenerationProgress {
    const fn at(stage: GenerationStage, completed: usize, total: usize) -> Self {
        Self {
            stage,
            completed,
            total,
        }
    }
}

/// Where the word stream of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordSource {
    Aligner,
    Synthesizer,
    /// No words: chunks keep proportional estimates and show bare text.
    None,
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub speaker: String,
    pub word_source: WordSource,
    pub stats: AlignmentStats,
    /// Chunk indices that received no words.
    pub unaligned: Vec<usize>,
    /// Whether the full track came from the audio cache.
    pub audio_cache_hit: bool,
}

// ── Speaker resolution ─────────────────────────────────────────────────────

/// Pick the voice to synthesize with.
///
/// Voice listing is time-boxed. When it fails or times out the requested
/// voice is used as-is; without one the speaker is unavailable. A requested
/// voice the synthesizer does not offer is replaced by the first listed one.
pub async fn resolve_speaker(
    synthesizer: &dyn SpeechSynthesizer,
    requested: Option<&str>,
) -> Result<String, SpeechError> {
    let requested = requested.map(str::trim).filter(|s| !s.is_empty());

    let voices = match tokio::time::timeout(VOICE_LIST_TIMEOUT, synthesizer.list_voices()).await {
        Ok(Ok(voices)) => voices,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Voice listing failed");
            return requested.map(str::to_string).ok_or_else(|| {
                SpeechError::SpeakerUnavailable(format!("voice listing failed ({e})"))
            });
        }
        Err(_) => {
            tracing::warn!(timeout = ?VOICE_LIST_TIMEOUT, "Voice listing timed out");
            return requested.map(str::to_string).ok_or_else(|| {
                SpeechError::SpeakerUnavailable("voice listing timed out".to_string())
            });
        }
    };

    let Some(first) = voices.first() else {
        return Err(SpeechError::SpeakerUnavailable(
            "synthesizer offers no voices".to_string(),
        ));
    };

    match requested {
        Some(wanted) if voices.iter().any(|v| v.id == wanted) => Ok(wanted.to_string()),
        Some(wanted) => {
            tracing::warn!(requested = wanted, fallback = %first.id, "Requested voice not offered");
            Ok(first.id.clone())
        }
        None => Ok(first.id.clone()),
    }
}

// ── Service ────────────────────────────────────────────────────────────────

/// Orchestrates a full generation run.
pub struct GenerationService {
    content: Arc<dyn ContentSource>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    aligner: Option<Arc<dyn ForcedAligner>>,
    decoder: Arc<dyn AudioDecoder>,
    cache: Arc<CacheStore>,
}

impl GenerationService {
    pub fn new(
        content: Arc<dyn ContentSource>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        decoder: Arc<dyn AudioDecoder>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            content,
            synthesizer,
            aligner: None,
            decoder,
            cache,
        }
    }

    /// Use a forced aligner for precise word timings.
    #[must_use]
    pub fn with_aligner(mut self, aligner: Arc<dyn ForcedAligner>) -> Self {
        self.aligner = Some(aligner);
        self
    }

    /// Produce content for `request` and synthesize it into a new material.
    pub async fn generate(
        &self,
        request: &ContentRequest,
        options: &GenerationOptions,
        on_progress: &(dyn Fn(GenerationProgress) + Send + Sync),
    ) -> Result<(Material, GenerationReport), CoreError> {
        on_progress(GenerationProgress::at(GenerationStage::Content, 0, 1));
        let language = request
            .language
            .clone()
            .unwrap_or_else(|| options.language.clone());
        let content = self.fetch_content(request, &language).await?;
        on_progress(GenerationProgress::at(GenerationStage::Content, 1, 1));

        let mut material = content.into_material(Some(language));
        if material.chunks.is_empty() {
            return Err(ContentError::Empty.into());
        }

        let report = self
            .synthesize_material(&mut material, options, on_progress)
            .await?;
        Ok((material, report))
    }

    /// Content for a request, served from the text cache when possible.
    async fn fetch_content(
        &self,
        request: &ContentRequest,
        language: &str,
    ) -> Result<GeneratedContent, CoreError> {
        let fingerprint = format!(
            "{}\u{1f}{}",
            request.topic,
            request.difficulty.as_deref().unwrap_or_default()
        );
        let key = text_cache_key(&fingerprint, language);

        match self.cache.get_text(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<GeneratedContent>(&raw) {
                Ok(content) => {
                    tracing::debug!(topic = %request.topic, "Content served from cache");
                    return Ok(content);
                }
                Err(e) => tracing::warn!(error = %e, "Cached content unreadable, regenerating"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Text cache unavailable, skipping"),
        }

        let content = self.content.generate(request).await?;
        match serde_json::to_string(&content) {
            Ok(raw) => {
                if let Err(e) = self.cache.put_text(&key, &raw).await {
                    tracing::warn!(error = %e, "Text cache unavailable, skipping");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Content not cacheable"),
        }
        Ok(content)
    }

    /// (Re)synthesize an existing material in place.
    ///
    /// Overwrites chunk timing, words and clips. Fails when no voice can be
    /// resolved or the track cannot be decoded; aligner and cache trouble only
    /// degrade the result.
    pub async fn synthesize_material(
        &self,
        material: &mut Material,
        options: &GenerationOptions,
        on_progress: &(dyn Fn(GenerationProgress) + Send + Sync),
    ) -> Result<GenerationReport, CoreError> {
        let total = material.chunks.len();
        on_progress(GenerationProgress::at(GenerationStage::Synthesis, 0, 1));

        let speaker = resolve_speaker(self.synthesizer.as_ref(), options.speaker.as_deref()).await?;
        let text = material.joined_chunk_text();
        let key = audio_cache_key(&text, &speaker, SynthesisMode::Full, options.speed);

        let (audio, synth_words, mut duration, audio_cache_hit) =
            self.full_track(&key, &text, &speaker, options).await?;
        on_progress(GenerationProgress::at(GenerationStage::Synthesis, 1, 1));

        if duration <= 0.0 {
            duration = self.decoder.decode(&audio)?.duration();
        }
        estimate_timestamps(&mut material.chunks, duration);

        on_progress(GenerationProgress::at(GenerationStage::Alignment, 0, 1));
        let (words, word_source) = self.word_stream(&audio, &text, options, synth_words).await;

        let (stats, unaligned) = if words.is_empty() {
            for chunk in &mut material.chunks {
                chunk.words.clear();
            }
            (AlignmentStats::default(), (0..total).collect())
        } else {
            let texts: Vec<&str> = material.chunks.iter().map(|c| c.text.as_str()).collect();
            let outcome = align_words(&texts, &words);
            let report = recalculate_boundaries(&mut material.chunks, outcome.assignments);
            (outcome.stats, report.unaligned)
        };
        on_progress(GenerationProgress::at(GenerationStage::Alignment, 1, 1));

        let progress = |i: usize| {
            on_progress(GenerationProgress::at(GenerationStage::Slicing, i + 1, total));
        };
        let full = slice_material_audio(
            &audio,
            self.decoder.as_ref(),
            &mut material.chunks,
            &progress,
        )
        .await?;
        for chunk in &material.chunks {
            self.cache.forget_decoded(&chunk.id);
        }

        material.duration = full.duration();
        material.tts_generated = true;
        material.voice_config = Some(VoiceConfig {
            speaker: speaker.clone(),
            speed: options.speed,
            generated_at: chrono::Utc::now(),
        });

        tracing::info!(
            material_id = %material.id,
            chunks = total,
            speaker = %speaker,
            word_source = ?word_source,
            matched = stats.matched,
            fillers = stats.fillers,
            synthesized = stats.synthesized,
            unaligned = unaligned.len(),
            cache_hit = audio_cache_hit,
            "Material synthesized"
        );
        on_progress(GenerationProgress::at(GenerationStage::Done, total, total));

        Ok(GenerationReport {
            speaker,
            word_source,
            stats,
            unaligned,
            audio_cache_hit,
        })
    }

    /// Full-track audio, synthesizer words and duration, cached by content.
    async fn full_track(
        &self,
        key: &str,
        text: &str,
        speaker: &str,
        options: &GenerationOptions,
    ) -> Result<(Vec<u8>, Vec<WordTimestamp>, f64, bool), CoreError> {
        match self.cache.get_audio(key).await {
            Ok(Some(payload)) => {
                if let Some(audio) = payload.audio_bytes() {
                    tracing::debug!(cache_key = %key, "Full track served from cache");
                    return Ok((audio, payload.words, payload.duration_seconds, true));
                }
                tracing::warn!(cache_key = %key, "Cached audio corrupt, resynthesizing");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Audio cache unavailable, skipping"),
        }

        let result = self
            .synthesizer
            .synthesize(&SynthesisRequest {
                text: text.to_string(),
                speaker: speaker.to_string(),
                speed: options.speed,
                language: options.language.clone(),
            })
            .await?;
        let words = sanitize_word_stream(result.words.unwrap_or_default());

        let payload = AudioPayload::from_bytes(&result.audio, words.clone(), result.duration_seconds);
        if let Err(e) = self.cache.put_audio(key, &payload).await {
            tracing::warn!(error = %e, "Audio cache unavailable, skipping");
        }

        Ok((result.audio, words, result.duration_seconds, false))
    }

    /// Word stream for the track: aligner with retries, else synthesizer
    /// words, else none.
    async fn word_stream(
        &self,
        audio: &[u8],
        text: &str,
        options: &GenerationOptions,
        synth_words: Vec<WordTimestamp>,
    ) -> (Vec<WordTimestamp>, WordSource) {
        if let Some(aligner) = &self.aligner {
            let request = AlignmentRequest {
                audio: audio.to_vec(),
                transcript: text.to_string(),
                language: options.language.clone(),
                model: options.aligner_model.clone(),
            };
            let aligner = aligner.as_ref();
            let request = &request;
            let result = retry_linear(ALIGNER_ATTEMPTS, ALIGNER_BACKOFF_STEP, move |attempt| {
                tracing::debug!(attempt, "Requesting forced alignment");
                aligner.align(request)
            })
            .await;

            match result {
                Ok(response) => {
                    let words = sanitize_word_stream(response.flatten());
                    if !words.is_empty() {
                        return (words, WordSource::Aligner);
                    }
                    tracing::warn!("Aligner returned no words, falling back");
                }
                Err(e) => {
                    let e = SpeechError::AlignmentUnavailable(e.to_string());
                    tracing::warn!(error = %e, "Falling back to synthesizer words");
                }
            }
        }

        if synth_words.is_empty() {
            (Vec::new(), WordSource::None)
        } else {
            (synth_words, WordSource::Synthesizer)
        }
    }
}
