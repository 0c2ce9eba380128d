//! AI feedback, text-to-speech and recording upload endpoints
//!
//! - `POST /api/speech-feedback` - Coaching feedback on a spoken transcript
//! - `POST /api/tts` - Synthesize speech, returned as base64
//! - `POST /api/upload-audio` - Store a base64 recording, returns its public URL

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderValue,
    response::Json,
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, HttpError};

/// Longest text accepted for synthesis
const MAX_TTS_CHARS: usize = 5000;

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_AUDIO_TYPE: &str = "audio/webm";

const COACH_INSTRUCTIONS: &str = "You are a friendly English speaking coach. \
     Reply in plain text with short paragraphs covering fluency, grammar and \
     vocabulary, then finish with one concrete suggestion for the next attempt.";

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub data: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    pub success: bool,
    pub audio_content: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, HttpError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(HttpError::invalid_input(format!("Missing required field: {}", field)))
    } else {
        Ok(trimmed)
    }
}

/// Build the user prompt sent for speaking feedback
pub fn feedback_prompt(topic: &str, transcript: &str) -> String {
    format!(
        "Speaking topic: {}\n\nTranscript of the learner's answer:\n\"\"\"\n{}\n\"\"\"",
        topic, transcript
    )
}

/// Reduce a client-supplied filename to a safe object name.
///
/// Keeps the basename, replaces anything outside `[A-Za-z0-9._-]` with `_`
/// and prefixes a millisecond timestamp so repeated uploads do not collide.
pub fn storage_object_name(filename: &str, now_millis: i64) -> Option<String> {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("{}-{}", now_millis, cleaned))
    }
}

async fn speech_feedback(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, HttpError> {
    let Json(request) = payload?;
    let topic = required("topic", &request.topic)?;
    let transcript = required("transcript", &request.transcript)?;

    let feedback = state
        .chat
        .complete(COACH_INSTRUCTIONS, &feedback_prompt(topic, transcript))
        .await?;

    Ok(Json(FeedbackResponse {
        success: true,
        feedback,
    }))
}

async fn text_to_speech(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Json<TtsResponse>, HttpError> {
    let Json(request) = payload?;
    let text = required("text", &request.text)?;
    if text.chars().count() > MAX_TTS_CHARS {
        return Err(HttpError::invalid_input(format!(
            "text must be at most {} characters",
            MAX_TTS_CHARS
        )));
    }
    let language = request
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE);

    let audio = state.speech.synthesize(text, language).await?;

    Ok(Json(TtsResponse {
        success: true,
        audio_content: STANDARD.encode(&audio.audio),
        mime_type: audio.mime_type.to_string(),
    }))
}

async fn upload_audio(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, HttpError> {
    let Json(request) = payload?;
    let filename = required("filename", &request.filename)?;
    let data = required("data", &request.data)?;

    let object_name = storage_object_name(filename, Utc::now().timestamp_millis())
        .ok_or_else(|| HttpError::invalid_input("filename has no usable characters"))?;

    // Accept data URLs ("data:audio/webm;base64,....") as well as bare base64
    let encoded = data.split_once(',').map(|(_, b64)| b64).unwrap_or(data);
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| HttpError::invalid_input(format!("data is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(HttpError::invalid_input("data is empty"));
    }

    let content_type = request
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_AUDIO_TYPE);
    if HeaderValue::from_str(content_type).is_err() {
        return Err(HttpError::invalid_input("contentType is not a valid header value"));
    }
    let size = bytes.len();
    let url = state
        .storage
        .upload(&object_name, bytes, content_type)
        .await?;

    info!(object = %object_name, size, "stored recording");
    Ok(Json(UploadResponse { success: true, url }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/speech-feedback", post(speech_feedback))
        .route("/api/tts", post(text_to_speech))
        .route("/api/upload-audio", post(upload_audio))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_object_name_strips_directories() {
        assert_eq!(
            storage_object_name("../../etc/passwd", 7).as_deref(),
            Some("7-passwd")
        );
        assert_eq!(
            storage_object_name("C:\\clips\\take 1.webm", 7).as_deref(),
            Some("7-take_1.webm")
        );
    }

    #[test]
    fn test_storage_object_name_rejects_empty_names() {
        assert!(storage_object_name("dir/", 7).is_none());
        assert!(storage_object_name("...", 7).is_none());
    }

    #[test]
    fn test_feedback_prompt_includes_inputs() {
        let prompt = feedback_prompt("Airports", "I go to the gate");
        assert!(prompt.contains("Airports"));
        assert!(prompt.contains("I go to the gate"));
    }
}
