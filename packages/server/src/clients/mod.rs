//! Outbound service clients
//!
//! Each external collaborator sits behind a trait so handlers can run
//! against in-process stand-ins:
//!
//! - [`ChatClient`] - chat completion (speaking feedback)
//! - [`SpeechClient`] - text-to-speech
//! - [`ObjectStorage`] - public file storage for recordings

use std::time::Duration;

use thiserror::Error;

mod chat;
mod speech;
mod storage;

pub use chat::{ChatClient, OpenAiChatClient};
pub use speech::{GoogleSpeechClient, SpeechClient, SynthesizedAudio};
pub use storage::{ObjectStorage, SupabaseStorage};

/// Failures talking to an external service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },

    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unexpected response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },
}

impl ClientError {
    pub(crate) fn request(service: &'static str, source: reqwest::Error) -> Self {
        Self::Request { service, source }
    }

    pub(crate) fn invalid_response(service: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            reason: reason.into(),
        }
    }
}

/// Build the shared outbound HTTP client
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("studyforge-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Turn a non-success response into [`ClientError::Status`]
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}
