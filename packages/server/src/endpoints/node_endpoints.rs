//! Study hierarchy endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/nodes` - Create a node under a parent path
//! - `GET /api/nodes?path=["Math","Algebra"]` - Node at a path plus its children
//! - `POST /api/nodes/notes` - Overwrite a node's notes
//! - `POST /api/mastery` - Record topic mastery

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
use studyforge_core::{parse_path_param, Node, ValidationError};

use crate::{AppState, HttpError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_path: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct NodePathQuery {
    /// JSON array of names; absent means the root
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveNotesRequest {
    #[serde(default)]
    pub path: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MasteryRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub lesson: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct NodeResponse {
    pub success: bool,
    pub node: Node,
}

#[derive(Debug, Serialize)]
pub struct NodeWithChildrenResponse {
    pub success: bool,
    pub node: Option<Node>,
    pub children: Vec<Node>,
}

#[derive(Debug, Serialize)]
pub struct MasteryResponse {
    pub success: bool,
    pub topic: Node,
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a node
///
/// ```bash
/// curl -X POST http://localhost:3001/api/nodes \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Algebra", "parentPath": ["Math"]}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    payload: Result<Json<CreateNodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NodeResponse>), HttpError> {
    let Json(request) = payload?;
    let parent_path = request.parent_path.unwrap_or_default();

    let node = state
        .node_service
        .create_node(&request.name, &parent_path)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(NodeResponse {
            success: true,
            node,
        }),
    ))
}

/// Fetch the node at a path with its direct children
///
/// ```bash
/// curl 'http://localhost:3001/api/nodes?path=%5B%22Math%22%5D'
/// ```
async fn get_node(
    State(state): State<AppState>,
    query: Result<Query<NodePathQuery>, QueryRejection>,
) -> Result<Json<NodeWithChildrenResponse>, HttpError> {
    let Query(query) = query?;
    let path = parse_path_param(query.path.as_deref())
        .map_err(|e| HttpError::invalid_input(e.to_string()))?;

    let result = state.node_service.get_node_with_children(&path).await?;

    Ok(Json(NodeWithChildrenResponse {
        success: true,
        node: result.node,
        children: result.children,
    }))
}

async fn save_notes(
    State(state): State<AppState>,
    payload: Result<Json<SaveNotesRequest>, JsonRejection>,
) -> Result<Json<NodeResponse>, HttpError> {
    let Json(request) = payload?;
    let notes = request
        .notes
        .ok_or_else(|| HttpError::invalid_input(ValidationError::missing("notes").to_string()))?;

    let node = state.node_service.save_notes(&request.path, &notes).await?;

    Ok(Json(NodeResponse {
        success: true,
        node,
    }))
}

async fn record_mastery(
    State(state): State<AppState>,
    payload: Result<Json<MasteryRequest>, JsonRejection>,
) -> Result<Json<MasteryResponse>, HttpError> {
    let Json(request) = payload?;

    let topic = state
        .node_service
        .record_mastery(&request.subject, &request.lesson, &request.topic)
        .await?;

    Ok(Json(MasteryResponse {
        success: true,
        topic,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/nodes", post(create_node).get(get_node))
        .route("/api/nodes/notes", post(save_notes))
        .route("/api/mastery", post(record_mastery))
        .with_state(state)
}
