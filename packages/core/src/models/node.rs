//! Node Data Structures
//!
//! This module defines the `Node` struct for the subject → lesson → topic →
//! notes hierarchy, plus helpers for working with materialized paths.
//!
//! # Materialized paths
//!
//! Every node stores the ordered names from the root down to itself. A root
//! node's path holds only its own name. Paths are computed when the node is
//! inserted, from the parent's stored path plus the new name.
//!
//! # Examples
//!
//! ```rust
//! use studyforge_core::models::Node;
//!
//! let subject = Node::new("Math", None);
//! let lesson = Node::new("Algebra", Some(&subject));
//!
//! assert_eq!(lesson.path, vec!["Math".to_string(), "Algebra".to_string()]);
//! assert_eq!(lesson.parent_id.as_deref(), Some(subject.id.as_str()));
//! assert_eq!(lesson.depth, 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for request payloads and model construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A named entry in the study hierarchy.
///
/// # Fields
///
/// - `id`: UUID v4 identifier
/// - `name`: Display name, unique among siblings
/// - `parent_id`: Parent node id, `None` for subjects at the root
/// - `path`: Names from root to this node, inclusive
/// - `depth`: `path.len() - 1`
/// - `notes`: Free-form notes text
/// - `mastery_count`: Times the topic was marked as mastered
/// - `last_mastered_at`: Timestamp of the latest mastery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub path: Vec<String>,
    pub depth: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub mastery_count: i64,
    #[serde(default)]
    pub last_mastered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Build a new node under `parent` (or at the root), deriving its path.
    ///
    /// The name is trimmed; callers validate that it is non-empty.
    pub fn new(name: impl AsRef<str>, parent: Option<&Node>) -> Self {
        let name = name.as_ref().trim().to_string();
        let mut path = parent.map(|p| p.path.clone()).unwrap_or_default();
        path.push(name.clone());
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            parent_id: parent.map(|p| p.id.clone()),
            depth: path.len() as i64 - 1,
            path,
            notes: None,
            mastery_count: 0,
            last_mastered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A node together with its direct children.
///
/// `node` is `None` both for the root itself and for paths that resolve to
/// nothing; in the latter case `children` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeWithChildren {
    pub node: Option<Node>,
    pub children: Vec<Node>,
}

/// Serialize a path into the canonical text stored in the `path` column.
pub fn encode_path(path: &[String]) -> String {
    serde_json::Value::from(path.to_vec()).to_string()
}

/// Decode a stored `path` column.
pub fn decode_path(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Normalize path segments: trim each one and reject blanks.
pub fn normalize_path(segments: &[String]) -> Result<Vec<String>, ValidationError> {
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let trimmed = segment.trim();
            if trimmed.is_empty() {
                Err(ValidationError::InvalidPath(format!(
                    "segment {} is empty",
                    index
                )))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

/// Parse a path supplied as a query parameter.
///
/// The parameter is a JSON array of strings (`["Math","Algebra"]`). A missing
/// or blank parameter means the root.
pub fn parse_path_param(raw: Option<&str>) -> Result<Vec<String>, ValidationError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    let segments: Vec<String> = serde_json::from_str(raw).map_err(|e| {
        ValidationError::InvalidPath(format!("expected a JSON array of names: {}", e))
    })?;

    normalize_path(&segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_root_node_has_single_segment_path() {
        let node = Node::new("  Math ", None);
        assert_eq!(node.name, "Math");
        assert_eq!(node.path, vec!["Math"]);
        assert_eq!(node.depth, 0);
        assert!(node.is_root());
    }

    #[test]
    fn test_child_path_extends_parent_path() {
        let subject = Node::new("Math", None);
        let lesson = Node::new("Algebra", Some(&subject));
        let topic = Node::new("Quadratics", Some(&lesson));

        assert_eq!(topic.path, vec!["Math", "Algebra", "Quadratics"]);
        assert_eq!(topic.depth, 2);
        assert_eq!(topic.parent_id.as_deref(), Some(lesson.id.as_str()));
    }

    #[test]
    fn test_encode_path_round_trips() {
        let path = vec!["Math".to_string(), "Quote \"x\"".to_string()];
        let encoded = encode_path(&path);
        assert_eq!(decode_path(&encoded).unwrap(), path);
    }

    #[test]
    fn test_parse_path_param_missing_means_root() {
        assert!(parse_path_param(None).unwrap().is_empty());
        assert!(parse_path_param(Some("  ")).unwrap().is_empty());
        assert!(parse_path_param(Some("[]")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_path_param_rejects_malformed_input() {
        assert!(matches!(
            parse_path_param(Some("Math/Algebra")),
            Err(ValidationError::InvalidPath(_))
        ));
        assert!(matches!(
            parse_path_param(Some(r#"["Math", "  "]"#)),
            Err(ValidationError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_parse_path_param_trims_segments() {
        let path = parse_path_param(Some(r#"[" Math ", "Algebra"]"#)).unwrap();
        assert_eq!(path, vec!["Math", "Algebra"]);
    }
}
