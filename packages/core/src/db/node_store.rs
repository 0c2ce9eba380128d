//! Store Traits - Database Abstraction Layer
//!
//! This module defines the traits that sit between the services (business
//! logic) and the database implementation:
//!
//! - [`NodeStore`] - the study hierarchy (materialized-path tree)
//! - [`ActivityStore`] - practice sessions, profiles, weight log, workouts
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async
//! 2. **Ownership Semantics**: Inserts take ownership of the model
//! 3. **Typed Errors**: Methods return [`DatabaseError`] so services can tell
//!    a UNIQUE violation apart from other failures
//! 4. **No transactions**: Every call is a single statement; services chain
//!    them without a wrapping transaction
//!
//! # Examples
//!
//! ```rust,no_run
//! use studyforge_core::db::{DatabaseService, NodeStore, TursoStore};
//! use studyforge_core::models::Node;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let created = store.create_node(Node::new("Math", None)).await?;
//!     assert_eq!(created.path, vec!["Math"]);
//!     Ok(())
//! }
//! ```

use crate::db::DatabaseError;
use crate::models::{Node, Profile, ProfileUpdate, SessionRecord, WeightEntry, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence for the study hierarchy
///
/// Implementations must be `Send + Sync` so they can be shared across
/// request handlers.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Insert a node exactly as given (path already computed) and return the stored row
    async fn create_node(&self, node: Node) -> Result<Node, DatabaseError>;

    async fn get_node(&self, id: &str) -> Result<Option<Node>, DatabaseError>;

    /// Resolve a node by exact materialized path. An empty path never resolves.
    async fn get_node_by_path(&self, path: &[String]) -> Result<Option<Node>, DatabaseError>;

    /// Direct children, ordered alphabetically. `None` lists root nodes.
    async fn get_children(&self, parent_id: Option<&str>) -> Result<Vec<Node>, DatabaseError>;

    /// Sibling named `name` under `parent_id` (or at the root)
    async fn find_child(
        &self,
        parent_id: Option<&str>,
        name: &str,
    ) -> Result<Option<Node>, DatabaseError>;

    /// Overwrite notes; `None` when the node does not exist
    async fn update_notes(&self, id: &str, notes: &str) -> Result<Option<Node>, DatabaseError>;

    /// Bump the mastery counter; `None` when the node does not exist
    async fn increment_mastery(
        &self,
        id: &str,
        mastered_at: DateTime<Utc>,
    ) -> Result<Option<Node>, DatabaseError>;
}

/// Persistence for practice sessions and the fitness tracker
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert_session(&self, session: SessionRecord) -> Result<SessionRecord, DatabaseError>;

    /// Sessions for one subject/lesson pair, newest first
    async fn sessions_for_lesson(
        &self,
        subject: &str,
        lesson: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SessionRecord>, DatabaseError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, DatabaseError>;

    /// Insert or merge a profile and return the stored result
    async fn upsert_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Profile, DatabaseError>;

    async fn insert_weight_entry(&self, entry: WeightEntry) -> Result<(), DatabaseError>;

    async fn weight_entries(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<WeightEntry>, DatabaseError>;

    async fn insert_workout(&self, workout: Workout) -> Result<Workout, DatabaseError>;

    async fn workouts(&self, user_id: &str, limit: u32) -> Result<Vec<Workout>, DatabaseError>;
}
