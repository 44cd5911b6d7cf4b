//! Forced aligner over HTTP.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parrot_core::ports::{AlignmentRequest, AlignmentResponse, ForcedAligner, SpeechError};
use serde::Serialize;

use super::{HttpBackendConfig, check_status};

#[derive(Debug, Serialize)]
struct AlignBody<'a> {
    audio: String,
    transcript: &'a str,
    language: &'a str,
    model: &'a str,
}

/// [`ForcedAligner`] backed by an HTTP engine.
///
/// Any transport or status failure is reported as
/// [`SpeechError::AlignmentUnavailable`]; callers fall back to other word
/// sources.
pub struct HttpAligner {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpAligner {
    pub fn new(config: HttpBackendConfig) -> Result<Self, SpeechError> {
        Ok(Self {
            client: config.client()?,
            config,
        })
    }
}

#[async_trait]
impl ForcedAligner for HttpAligner {
    async fn align(&self, request: &AlignmentRequest) -> Result<AlignmentResponse, SpeechError> {
        let url = self.config.endpoint("align")?;
        let body = AlignBody {
            audio: BASE64.encode(&request.audio),
            transcript: &request.transcript,
            language: &request.language,
            model: &request.model,
        };
        tracing::debug!(%url, bytes = request.audio.len(), model = %request.model, "Alignment request");

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::AlignmentUnavailable(e.to_string()))?;
        let response = check_status(response)
            .await
            .map_err(|e| SpeechError::AlignmentUnavailable(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))
    }
}
