//! Practice session records and the per-topic summaries derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// One recorded speaking-practice attempt, scoped to a subject/lesson pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub subject: String,
    pub lesson: String,
    pub topic: String,
    pub transcript: Option<String>,
    pub feedback: Option<String>,
    pub duration_seconds: i64,
    pub word_count: i64,
    pub overall_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for recording a session
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub lesson: String,
    #[serde(default)]
    pub topic: String,
    pub transcript: Option<String>,
    pub feedback: Option<String>,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub word_count: i64,
    pub overall_score: Option<f64>,
}

impl NewSession {
    /// Validate the payload and turn it into a record stamped with `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<SessionRecord, ValidationError> {
        let subject = required("subject", &self.subject)?;
        let lesson = required("lesson", &self.lesson)?;
        let topic = required("topic", &self.topic)?;

        if self.duration_seconds < 0 {
            return Err(ValidationError::invalid_value(
                "durationSeconds",
                "must not be negative",
            ));
        }
        if self.word_count < 0 {
            return Err(ValidationError::invalid_value(
                "wordCount",
                "must not be negative",
            ));
        }
        if let Some(score) = self.overall_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(ValidationError::invalid_value(
                    "overallScore",
                    "must be between 0 and 100",
                ));
            }
        }

        Ok(SessionRecord {
            id: Uuid::new_v4().to_string(),
            subject,
            lesson,
            topic,
            transcript: self.transcript,
            feedback: self.feedback,
            duration_seconds: self.duration_seconds,
            word_count: self.word_count,
            overall_score: self.overall_score,
            created_at: now,
        })
    }
}

/// Aggregated view of every session recorded for one topic.
///
/// Averages use a two-term blend, see
/// [`summarize_sessions`](crate::services::summarize_sessions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub topic: String,
    pub last_practiced: DateTime<Utc>,
    pub session_count: u32,
    pub avg_duration: f64,
    pub avg_word_count: f64,
    pub avg_score: f64,
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}
