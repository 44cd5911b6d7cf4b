//! Speech synthesizer over HTTP.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parrot_core::WordTimestamp;
use parrot_core::ports::{
    SpeechError, SpeechSynthesizer, SynthesisRequest, SynthesisResult, VoiceInfo,
};
use serde::Deserialize;

use super::{HttpBackendConfig, check_status, transport_error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio: String,
    #[serde(default)]
    words: Option<Vec<WordTimestamp>>,
    #[serde(default, alias = "duration_seconds", alias = "duration")]
    duration_seconds: f64,
}

/// `GET /voices` answers either a bare list or `{"voices": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VoicesResponse {
    List(Vec<VoiceInfo>),
    Wrapped { voices: Vec<VoiceInfo> },
}

impl VoicesResponse {
    fn into_voices(self) -> Vec<VoiceInfo> {
        match self {
            Self::List(voices) | Self::Wrapped { voices } => voices,
        }
    }
}

/// [`SpeechSynthesizer`] backed by an HTTP engine.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpSynthesizer {
    pub fn new(config: HttpBackendConfig) -> Result<Self, SpeechError> {
        Ok(Self {
            client: config.client()?,
            config,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult, SpeechError> {
        let url = self.config.endpoint("synthesize")?;
        tracing::debug!(%url, speaker = %request.speaker, chars = request.text.len(), "Synthesis request");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.config.timeout))?;
        let body: SynthesizeResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;

        let audio = BASE64
            .decode(body.audio.as_bytes())
            .map_err(|e| SpeechError::InvalidResponse(format!("audio is not base64: {e}")))?;
        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse("empty audio".to_string()));
        }

        Ok(SynthesisResult {
            audio,
            words: body.words,
            duration_seconds: body.duration_seconds,
        })
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let url = self.config.endpoint("voices")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.config.timeout))?;
        let voices: VoicesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;
        Ok(voices.into_voices())
    }
}
