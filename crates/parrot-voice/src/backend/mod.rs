//! HTTP speech engine adapters.
//!
//! Both engines speak JSON over HTTP; audio travels as base64 WAV.
//!
//! | Call | Route |
//! |---|---|
//! | synthesize | `POST /synthesize` |
//! | list voices | `GET /voices` |
//! | align | `POST /align` |

mod http_aligner;
mod http_synth;

use std::time::Duration;

use parrot_core::ports::SpeechError;
use url::Url;

pub use http_aligner::HttpAligner;
pub use http_synth::HttpSynthesizer;

/// Default request timeout for synthesis calls.
pub const DEFAULT_SYNTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Default request timeout for alignment calls.
pub const DEFAULT_ALIGN_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    /// Parse `base_url`; a missing trailing slash is added so routes join
    /// under it instead of replacing its last segment.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SpeechError> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| SpeechError::Request(format!("invalid engine URL '{base_url}': {e}")))?;
        Ok(Self { base_url, timeout })
    }

    fn endpoint(&self, route: &str) -> Result<Url, SpeechError> {
        self.base_url
            .join(route)
            .map_err(|e| SpeechError::Request(format!("invalid route '{route}': {e}")))
    }

    fn client(&self) -> Result<reqwest::Client, SpeechError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SpeechError::Request(format!("failed to create HTTP client: {e}")))
    }
}

/// Map a transport error, keeping timeouts distinct.
fn transport_error(error: &reqwest::Error, timeout: Duration) -> SpeechError {
    if error.is_timeout() {
        SpeechError::Timeout(timeout)
    } else {
        SpeechError::Request(error.to_string())
    }
}

/// Turn a non-success status into an error carrying the response body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let route = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(SpeechError::Request(format!(
        "{route} returned {status}: {}",
        body.trim()
    )))
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP responder for adapter tests.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn header_end(data: &[u8]) -> Option<usize> {
        data.windows(4).position(|w| w == b"\r\n\r\n")
    }

    /// Answer one request with `status` and a JSON `body`.
    ///
    /// The handle resolves to the raw request text.
    pub async fn serve_once(status: u16, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);
                if let Some(end) = header_end(&data) {
                    let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                    if data.len() >= end + 4 + len {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&data).into_owned()
        });

        (base, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let config = HttpBackendConfig::new("http://localhost:5002/tts", DEFAULT_SYNTH_TIMEOUT).unwrap();
        assert_eq!(
            config.endpoint("synthesize").unwrap().as_str(),
            "http://localhost:5002/tts/synthesize"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            HttpBackendConfig::new("not a url", DEFAULT_SYNTH_TIMEOUT),
            Err(SpeechError::Request(_))
        ));
    }
}
