//! HTTP speech recognizer.
//!
//! Posts raw audio to `{endpoint}/v1/transcribe` and expects
//! `{"transcript": "..."}` back. The locale travels in `Content-Language`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use elocute_core::error::RecognitionError;
use elocute_core::text::is_no_speech;
use elocute_core::traits::{AudioInput, SpeechRecognizer};

use crate::error::ProviderError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Speech-to-text over a simple JSON HTTP API.
pub struct HttpRecognizer {
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    transcript: String,
}

impl HttpRecognizer {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ProviderError> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }

    async fn request(&self, audio: &AudioInput) -> Result<String, ProviderError> {
        let mut req = self
            .client
            .post(format!("{}/v1/transcribe", self.endpoint))
            .header("content-type", audio.mime_type.as_str())
            .header("content-language", audio.locale.as_str());

        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.body(audio.bytes.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            });
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {e}")))?;
        Ok(parsed.transcript)
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, audio), fields(bytes = audio.bytes.len(), locale = %audio.locale))]
    async fn transcribe(&self, audio: &AudioInput) -> Result<String, RecognitionError> {
        let transcript = self.request(audio).await?;
        if is_no_speech(&transcript) {
            return Err(RecognitionError::NoSpeech);
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn audio() -> AudioInput {
        AudioInput {
            bytes: b"RIFF....WAVE".to_vec(),
            mime_type: "audio/wav".into(),
            locale: "en-US".into(),
        }
    }

    #[tokio::test]
    async fn successful_transcription() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("content-language", "en-US"))
            .and(body_bytes(b"RIFF....WAVE".to_vec()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"transcript": "the cat sat", "confidence": 0.93})),
            )
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&server.uri(), Some("test-key".into()), None).unwrap();
        assert_eq!(recognizer.transcribe(&audio()).await.unwrap(), "the cat sat");
    }

    #[tokio::test]
    async fn sentinel_transcript_is_no_speech() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"transcript": "No speech detected"})),
            )
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&server.uri(), None, None).unwrap();
        assert!(matches!(
            recognizer.transcribe(&audio()).await,
            Err(RecognitionError::NoSpeech)
        ));
    }

    #[tokio::test]
    async fn unauthorized_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&server.uri(), Some("bad".into()), None).unwrap();
        let err = recognizer.transcribe(&audio()).await.unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().contains("invalid key"));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&server.uri(), None, None).unwrap();
        let err = recognizer.transcribe(&audio()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn malformed_body_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&server.uri(), None, None).unwrap();
        let err = recognizer.transcribe(&audio()).await.unwrap_err();
        assert!(err.to_string().contains("invalid response"));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"transcript": "late"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&server.uri(), None, Some(1)).unwrap();
        let err = recognizer.transcribe(&audio()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Timeout(1)));
    }
}
