//! Practice session recording and history.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::db::ActivityStore;
use crate::models::session::required;
use crate::models::{clamp_limit, NewSession, SessionRecord, TopicSummary};
use crate::services::error::ServiceResult;
use crate::services::session_aggregator::summarize_sessions;

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn ActivityStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Validate and persist one practice session
    pub async fn record_session(&self, session: NewSession) -> ServiceResult<SessionRecord> {
        let record = session.into_record(Utc::now())?;
        let saved = self.store.insert_session(record).await?;

        info!(
            id = %saved.id,
            subject = %saved.subject,
            lesson = %saved.lesson,
            topic = %saved.topic,
            "recorded practice session"
        );
        Ok(saved)
    }

    /// Per-topic summaries over the full history of a subject/lesson pair.
    ///
    /// Computed fresh on every call.
    pub async fn previous_sessions(
        &self,
        subject: &str,
        lesson: &str,
    ) -> ServiceResult<Vec<TopicSummary>> {
        let subject = required("subject", subject)?;
        let lesson = required("lesson", lesson)?;

        let sessions = self
            .store
            .sessions_for_lesson(&subject, &lesson, None)
            .await?;
        let summaries = summarize_sessions(&sessions);

        debug!(
            sessions = sessions.len(),
            topics = summaries.len(),
            "summarized session history"
        );
        Ok(summaries)
    }

    /// Raw session history for a subject/lesson pair, newest first
    pub async fn recent_sessions(
        &self,
        subject: &str,
        lesson: &str,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<SessionRecord>> {
        let subject = required("subject", subject)?;
        let lesson = required("lesson", lesson)?;

        Ok(self
            .store
            .sessions_for_lesson(&subject, &lesson, Some(clamp_limit(limit)))
            .await?)
    }
}
