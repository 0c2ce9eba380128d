//! Chat completion client (OpenAI-compatible API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, ClientError};
use crate::config::ChatConfig;

const SERVICE: &str = "chat completion";

/// Sends a prompt to a language model and returns its free-text reply
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ClientError>;
}

pub struct OpenAiChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl OpenAiChatClient {
    pub fn new(http: reqwest::Client, config: ChatConfig) -> Self {
        Self { http, config }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ClientError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ClientError::NotConfigured { service: SERVICE })?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::request(SERVICE, e))?;

        let parsed: ChatResponse = check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::request(SERVICE, e))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ClientError::invalid_response(SERVICE, "no completion content"))?;

        debug!(model = %self.config.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}
