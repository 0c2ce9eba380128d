//! Node Service
//!
//! Business rules for the study hierarchy (subjects → lessons → topics →
//! notes). Nodes are addressed by materialized path; this service resolves
//! paths, enforces sibling-name uniqueness and parent existence, and keeps
//! notes and mastery counters up to date.
//!
//! Every operation is a short chain of dependent store calls with no
//! wrapping transaction. Concurrent writers to the same node race at the
//! database; the last write wins.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::db::NodeStore;
use crate::models::session::required;
use crate::models::{normalize_path, Node, NodeWithChildren, ValidationError};
use crate::services::error::{ServiceError, ServiceResult};

/// Core service for hierarchy operations
#[derive(Clone)]
pub struct NodeService {
    store: Arc<dyn NodeStore>,
}

impl NodeService {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Create a node named `name` under the node at `parent_path`.
    ///
    /// An empty `parent_path` creates a root node.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the name is blank or a path segment is blank
    /// - `NotFound` when `parent_path` does not resolve
    /// - `Conflict` when a sibling already has this name
    pub async fn create_node(&self, name: &str, parent_path: &[String]) -> ServiceResult<Node> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::missing("name").into());
        }
        let parent_path = normalize_path(parent_path)?;

        let parent = if parent_path.is_empty() {
            None
        } else {
            Some(
                self.store
                    .get_node_by_path(&parent_path)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Parent", parent_path.join(" / ")))?,
            )
        };

        let parent_id = parent.as_ref().map(|p| p.id.as_str());
        if self.store.find_child(parent_id, name).await?.is_some() {
            return Err(ServiceError::conflict("Node", sibling_key(&parent_path, name)));
        }

        let node = Node::new(name, parent.as_ref());
        let created = self.store.create_node(node).await.map_err(|e| {
            if e.is_unique_violation() {
                ServiceError::conflict("Node", sibling_key(&parent_path, name))
            } else {
                ServiceError::from(e)
            }
        })?;

        info!(id = %created.id, path = ?created.path, "created node");
        Ok(created)
    }

    /// Fetch the node at `path` and its direct children.
    ///
    /// An empty path lists the root nodes. A path that does not resolve
    /// yields no node and no children rather than an error.
    pub async fn get_node_with_children(&self, path: &[String]) -> ServiceResult<NodeWithChildren> {
        let path = normalize_path(path)?;

        if path.is_empty() {
            let children = self.store.get_children(None).await?;
            return Ok(NodeWithChildren {
                node: None,
                children,
            });
        }

        match self.store.get_node_by_path(&path).await? {
            Some(node) => {
                let children = self.store.get_children(Some(&node.id)).await?;
                Ok(NodeWithChildren {
                    node: Some(node),
                    children,
                })
            }
            None => {
                debug!(path = ?path, "path did not resolve");
                Ok(NodeWithChildren {
                    node: None,
                    children: Vec::new(),
                })
            }
        }
    }

    /// Overwrite the notes of the node at `path`.
    ///
    /// The root may not hold notes, so an empty path is rejected.
    pub async fn save_notes(&self, path: &[String], notes: &str) -> ServiceResult<Node> {
        let path = normalize_path(path)?;
        if path.is_empty() {
            return Err(
                ValidationError::InvalidPath("notes cannot be saved on the root".into()).into(),
            );
        }

        let key = path.join(" / ");
        let node = self
            .store
            .get_node_by_path(&path)
            .await?
            .ok_or_else(|| ServiceError::not_found("Node", key.clone()))?;

        let updated = self
            .store
            .update_notes(&node.id, notes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Node", key))?;

        debug!(id = %updated.id, bytes = notes.len(), "saved notes");
        Ok(updated)
    }

    /// Record that `topic` was mastered.
    ///
    /// Resolves the subject, then the lesson, then the topic under it. The
    /// topic node is created on first mastery; subject and lesson must exist.
    pub async fn record_mastery(
        &self,
        subject: &str,
        lesson: &str,
        topic: &str,
    ) -> ServiceResult<Node> {
        let subject = required("subject", subject)?;
        let lesson = required("lesson", lesson)?;
        let topic = required("topic", topic)?;

        let subject_path = vec![subject];
        self.store
            .get_node_by_path(&subject_path)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subject", subject_path.join(" / ")))?;

        let mut lesson_path = subject_path;
        lesson_path.push(lesson);
        let lesson_node = self
            .store
            .get_node_by_path(&lesson_path)
            .await?
            .ok_or_else(|| ServiceError::not_found("Lesson", lesson_path.join(" / ")))?;

        let topic_node = match self.store.find_child(Some(&lesson_node.id), &topic).await? {
            Some(existing) => existing,
            None => self.create_topic(&lesson_node, &topic).await?,
        };

        let updated = self
            .store
            .increment_mastery(&topic_node.id, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::not_found("Topic", topic_node.path.join(" / ")))?;

        info!(
            id = %updated.id,
            mastery_count = updated.mastery_count,
            "recorded topic mastery"
        );
        Ok(updated)
    }

    /// Create a topic under `lesson`, tolerating a concurrent creator
    async fn create_topic(&self, lesson: &Node, topic: &str) -> ServiceResult<Node> {
        match self.store.create_node(Node::new(topic, Some(lesson))).await {
            Ok(node) => Ok(node),
            Err(e) if e.is_unique_violation() => self
                .store
                .find_child(Some(&lesson.id), topic)
                .await?
                .ok_or_else(|| ServiceError::not_found("Topic", topic.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

fn sibling_key(parent_path: &[String], name: &str) -> String {
    parent_path
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join(" / ")
}
