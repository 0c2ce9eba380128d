//! Text-to-speech client (Google Cloud `text:synthesize` API)

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;

use super::{check_status, ClientError};
use crate::config::SpeechConfig;

const SERVICE: &str = "speech synthesis";

/// Encoded audio returned by a [`SpeechClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub mime_type: &'static str,
}

#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Synthesize `text` spoken in `language` (a BCP-47 tag such as `en-US`)
    async fn synthesize(&self, text: &str, language: &str) -> Result<SynthesizedAudio, ClientError>;
}

pub struct GoogleSpeechClient {
    http: reqwest::Client,
    config: SpeechConfig,
}

impl GoogleSpeechClient {
    pub fn new(http: reqwest::Client, config: SpeechConfig) -> Self {
        Self { http, config }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[async_trait]
impl SpeechClient for GoogleSpeechClient {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, ClientError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ClientError::NotConfigured { service: SERVICE })?;

        let url = format!(
            "{}/v1/text:synthesize",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&json!({
                "input": { "text": text },
                "voice": { "languageCode": language },
                "audioConfig": { "audioEncoding": "MP3" }
            }))
            .send()
            .await
            .map_err(|e| ClientError::request(SERVICE, e))?;

        let parsed: SynthesizeResponse = check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::request(SERVICE, e))?;

        let encoded = parsed
            .audio_content
            .ok_or_else(|| ClientError::invalid_response(SERVICE, "missing audioContent"))?;
        let audio = STANDARD
            .decode(encoded)
            .map_err(|e| ClientError::invalid_response(SERVICE, e.to_string()))?;

        Ok(SynthesizedAudio {
            audio,
            mime_type: "audio/mpeg",
        })
    }
}
