//! Audio transcription via the OpenAI Whisper API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{MlError, MlResult};

/// Whisper rejects uploads above 25MB.
const MAX_AUDIO_BYTES: u64 = 25 * 1024 * 1024;

const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Transcribes an audio file to text.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> MlResult<String>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI Whisper client.
pub struct WhisperClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl WhisperClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: Client::new(),
        }
    }

    /// Override the API base URL (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TranscriptionClient for WhisperClient {
    async fn transcribe(&self, audio_path: &Path) -> MlResult<String> {
        let metadata = tokio::fs::metadata(audio_path).await?;
        if metadata.len() > MAX_AUDIO_BYTES {
            return Err(MlError::AudioTooLarge {
                size_bytes: metadata.len(),
                limit_bytes: MAX_AUDIO_BYTES,
            });
        }

        info!(
            audio = %audio_path.display(),
            size_kb = metadata.len() / 1024,
            "Transcribing audio"
        );

        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = Form::new()
            .part(
                "file",
                Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("audio/mpeg")
                    .map_err(|e| MlError::malformed(e.to_string()))?,
            )
            .text("model", TRANSCRIPTION_MODEL);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                warn!("Whisper rate limit hit");
                return Err(MlError::RateLimited(body));
            }
            return Err(MlError::api(status.as_u16(), body));
        }

        let parsed: TranscriptionResponse = response.json().await?;
        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(MlError::EmptyTranscript);
        }

        info!(chars = text.len(), "Transcription complete");
        Ok(text)
    }
}
