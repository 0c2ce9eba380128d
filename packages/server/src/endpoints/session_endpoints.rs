//! Speaking practice session endpoints
//!
//! - `POST /api/save-session` - Record a practice session
//! - `GET /api/get-previous-sessions?subject=&lesson=` - Per-topic summaries
//! - `GET /api/sessions?subject=&lesson=&limit=` - Raw history, newest first

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use studyforge_core::{NewSession, SessionRecord, TopicSummary};

use crate::{AppState, HttpError};

#[derive(Debug, Deserialize)]
pub struct LessonQuery {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub lesson: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: SessionRecord,
}

#[derive(Debug, Serialize)]
pub struct PreviousSessionsResponse {
    pub success: bool,
    pub topics: Vec<TopicSummary>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub success: bool,
    pub sessions: Vec<SessionRecord>,
}

async fn save_session(
    State(state): State<AppState>,
    payload: Result<Json<NewSession>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), HttpError> {
    let Json(session) = payload?;
    let session = state.session_service.record_session(session).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            session,
        }),
    ))
}

async fn previous_sessions(
    State(state): State<AppState>,
    query: Result<Query<LessonQuery>, QueryRejection>,
) -> Result<Json<PreviousSessionsResponse>, HttpError> {
    let Query(query) = query?;
    let topics = state
        .session_service
        .previous_sessions(&query.subject, &query.lesson)
        .await?;

    Ok(Json(PreviousSessionsResponse {
        success: true,
        topics,
    }))
}

async fn list_sessions(
    State(state): State<AppState>,
    query: Result<Query<LessonQuery>, QueryRejection>,
) -> Result<Json<SessionListResponse>, HttpError> {
    let Query(query) = query?;
    let sessions = state
        .session_service
        .recent_sessions(&query.subject, &query.lesson, query.limit)
        .await?;

    Ok(Json(SessionListResponse {
        success: true,
        sessions,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/save-session", post(save_session))
        .route("/api/get-previous-sessions", get(previous_sessions))
        .route("/api/sessions", get(list_sessions))
        .with_state(state)
}
