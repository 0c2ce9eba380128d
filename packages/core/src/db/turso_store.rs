//! TursoStore - Store Implementation for the libsql Backend
//!
//! This module implements [`NodeStore`] and [`ActivityStore`] on top of
//! [`DatabaseService`].
//!
//! # Design Principles
//!
//! 1. **Pure Delegation**: SQL lives in `DatabaseService::db_*` methods
//! 2. **Row Conversion**: Handles libsql::Row → model conversion
//! 3. **Read-after-write**: Inserts and updates return the stored row
//!
//! # Examples
//!
//! ```rust,no_run
//! # use studyforge_core::db::{TursoStore, DatabaseService};
//! # use std::sync::Arc;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(DatabaseService::new(PathBuf::from("./test.db")).await?);
//! let store = TursoStore::new(db);
//! # Ok(())
//! # }
//! ```

use crate::db::node_store::{ActivityStore, NodeStore};
use crate::db::{
    DatabaseError, DatabaseService, DbCreateNodeParams, DbCreateSessionParams,
    DbCreateWorkoutParams, DbUpsertProfileParams,
};
use crate::models::{
    decode_path, encode_path, Node, Profile, ProfileUpdate, SessionRecord, WeightEntry, Workout,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::{Row, Rows};
use std::sync::Arc;

/// Format a timestamp the way every timestamp column stores it.
///
/// Fixed-width RFC 3339 with microseconds, so text ordering matches time ordering.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// TursoStore implements the store traits for the libsql backend
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Rows written by this store use RFC3339: "YYYY-MM-DDTHH:MM:SS.ffffffZ"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        ))
    }

    fn parse_optional_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
        s.as_deref().map(Self::parse_timestamp).transpose()
    }

    /// Convert libsql::Row to Node
    ///
    /// Expected columns (in order): id, name, parent_id, path, depth, notes,
    /// mastery_count, last_mastered_at, created_at, updated_at
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let parent_id: Option<String> = row.get(2).context("Failed to get parent_id")?;
        let path_json: String = row.get(3).context("Failed to get path")?;
        let depth: i64 = row.get(4).context("Failed to get depth")?;
        let notes: Option<String> = row.get(5).context("Failed to get notes")?;
        let mastery_count: i64 = row.get(6).context("Failed to get mastery_count")?;
        let last_mastered_at: Option<String> =
            row.get(7).context("Failed to get last_mastered_at")?;
        let created_at: String = row.get(8).context("Failed to get created_at")?;
        let updated_at: String = row.get(9).context("Failed to get updated_at")?;

        Ok(Node {
            id,
            name,
            parent_id,
            path: decode_path(&path_json).context("Failed to parse path JSON")?,
            depth,
            notes,
            mastery_count,
            last_mastered_at: Self::parse_optional_timestamp(last_mastered_at)
                .context("Failed to parse last_mastered_at")?,
            created_at: Self::parse_timestamp(&created_at).context("Failed to parse created_at")?,
            updated_at: Self::parse_timestamp(&updated_at).context("Failed to parse updated_at")?,
        })
    }

    fn row_to_session(row: &Row) -> Result<SessionRecord> {
        let created_at: String = row.get(9).context("Failed to get created_at")?;

        Ok(SessionRecord {
            id: row.get(0).context("Failed to get id")?,
            subject: row.get(1).context("Failed to get subject")?,
            lesson: row.get(2).context("Failed to get lesson")?,
            topic: row.get(3).context("Failed to get topic")?,
            transcript: row.get(4).context("Failed to get transcript")?,
            feedback: row.get(5).context("Failed to get feedback")?,
            duration_seconds: row.get(6).context("Failed to get duration_seconds")?,
            word_count: row.get(7).context("Failed to get word_count")?,
            overall_score: row.get(8).context("Failed to get overall_score")?,
            created_at: Self::parse_timestamp(&created_at).context("Failed to parse created_at")?,
        })
    }

    fn row_to_profile(row: &Row) -> Result<Profile> {
        let updated_at: String = row.get(5).context("Failed to get updated_at")?;

        Ok(Profile {
            user_id: row.get(0).context("Failed to get user_id")?,
            display_name: row.get(1).context("Failed to get display_name")?,
            height_cm: row.get(2).context("Failed to get height_cm")?,
            weight_kg: row.get(3).context("Failed to get weight_kg")?,
            goal: row.get(4).context("Failed to get goal")?,
            updated_at: Self::parse_timestamp(&updated_at).context("Failed to parse updated_at")?,
        })
    }

    fn row_to_weight_entry(row: &Row) -> Result<WeightEntry> {
        let logged_at: String = row.get(3).context("Failed to get logged_at")?;

        Ok(WeightEntry {
            id: row.get(0).context("Failed to get id")?,
            user_id: row.get(1).context("Failed to get user_id")?,
            weight_kg: row.get(2).context("Failed to get weight_kg")?,
            logged_at: Self::parse_timestamp(&logged_at).context("Failed to parse logged_at")?,
        })
    }

    fn row_to_workout(row: &Row) -> Result<Workout> {
        let performed_at: String = row.get(7).context("Failed to get performed_at")?;

        Ok(Workout {
            id: row.get(0).context("Failed to get id")?,
            user_id: row.get(1).context("Failed to get user_id")?,
            exercise: row.get(2).context("Failed to get exercise")?,
            sets: row.get(3).context("Failed to get sets")?,
            reps: row.get(4).context("Failed to get reps")?,
            weight_kg: row.get(5).context("Failed to get weight_kg")?,
            duration_minutes: row.get(6).context("Failed to get duration_minutes")?,
            performed_at: Self::parse_timestamp(&performed_at)
                .context("Failed to parse performed_at")?,
        })
    }

    /// Drain `rows`, converting each one
    async fn collect<T>(
        mut rows: Rows,
        convert: fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>, DatabaseError> {
        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to fetch row: {}", e)))?
        {
            items.push(convert(&row).map_err(|e| DatabaseError::row_decode(format!("{:#}", e)))?);
        }
        Ok(items)
    }

    /// Convert the first row, if any
    async fn first<T>(
        rows: Rows,
        convert: fn(&Row) -> Result<T>,
    ) -> Result<Option<T>, DatabaseError> {
        Ok(Self::collect(rows, convert).await?.into_iter().next())
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn create_node(&self, node: Node) -> Result<Node, DatabaseError> {
        let path = encode_path(&node.path);
        let created_at = format_timestamp(&node.created_at);

        let params = DbCreateNodeParams {
            id: &node.id,
            name: &node.name,
            parent_id: node.parent_id.as_deref(),
            path: &path,
            depth: node.depth,
            notes: node.notes.as_deref(),
            created_at: &created_at,
        };

        self.db.db_create_node(params).await?;

        self.get_node(&node.id)
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Node not found after creation"))
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>, DatabaseError> {
        let rows = self.db.db_get_node(id).await?;
        Self::first(rows, Self::row_to_node).await
    }

    async fn get_node_by_path(&self, path: &[String]) -> Result<Option<Node>, DatabaseError> {
        if path.is_empty() {
            return Ok(None);
        }

        let rows = self.db.db_get_node_by_path(&encode_path(path)).await?;
        Self::first(rows, Self::row_to_node).await
    }

    async fn get_children(&self, parent_id: Option<&str>) -> Result<Vec<Node>, DatabaseError> {
        let rows = self.db.db_get_children(parent_id).await?;
        Self::collect(rows, Self::row_to_node).await
    }

    async fn find_child(
        &self,
        parent_id: Option<&str>,
        name: &str,
    ) -> Result<Option<Node>, DatabaseError> {
        let rows = self.db.db_find_child(parent_id, name).await?;
        Self::first(rows, Self::row_to_node).await
    }

    async fn update_notes(&self, id: &str, notes: &str) -> Result<Option<Node>, DatabaseError> {
        let updated_at = format_timestamp(&Utc::now());
        let affected = self.db.db_update_notes(id, notes, &updated_at).await?;

        if affected == 0 {
            return Ok(None);
        }
        self.get_node(id).await
    }

    async fn increment_mastery(
        &self,
        id: &str,
        mastered_at: DateTime<Utc>,
    ) -> Result<Option<Node>, DatabaseError> {
        let affected = self
            .db
            .db_increment_mastery(id, &format_timestamp(&mastered_at))
            .await?;

        if affected == 0 {
            return Ok(None);
        }
        self.get_node(id).await
    }
}

#[async_trait]
impl ActivityStore for TursoStore {
    async fn insert_session(&self, session: SessionRecord) -> Result<SessionRecord, DatabaseError> {
        let created_at = format_timestamp(&session.created_at);

        self.db
            .db_create_session(DbCreateSessionParams {
                id: &session.id,
                subject: &session.subject,
                lesson: &session.lesson,
                topic: &session.topic,
                transcript: session.transcript.as_deref(),
                feedback: session.feedback.as_deref(),
                duration_seconds: session.duration_seconds,
                word_count: session.word_count,
                overall_score: session.overall_score,
                created_at: &created_at,
            })
            .await?;

        let rows = self.db.db_get_session(&session.id).await?;
        Self::first(rows, Self::row_to_session)
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Session not found after insert"))
    }

    async fn sessions_for_lesson(
        &self,
        subject: &str,
        lesson: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let rows = self.db.db_get_sessions(subject, lesson, limit).await?;
        Self::collect(rows, Self::row_to_session).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, DatabaseError> {
        let rows = self.db.db_get_profile(user_id).await?;
        Self::first(rows, Self::row_to_profile).await
    }

    async fn upsert_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Profile, DatabaseError> {
        let updated_at = format_timestamp(&updated_at);

        self.db
            .db_upsert_profile(DbUpsertProfileParams {
                user_id,
                display_name: update.display_name.as_deref(),
                height_cm: update.height_cm,
                weight_kg: update.weight_kg,
                goal: update.goal.as_deref(),
                updated_at: &updated_at,
            })
            .await?;

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Profile not found after upsert"))
    }

    async fn insert_weight_entry(&self, entry: WeightEntry) -> Result<(), DatabaseError> {
        self.db
            .db_create_weight_log(
                &entry.id,
                &entry.user_id,
                entry.weight_kg,
                &format_timestamp(&entry.logged_at),
            )
            .await
    }

    async fn weight_entries(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<WeightEntry>, DatabaseError> {
        let rows = self.db.db_get_weight_logs(user_id, limit).await?;
        Self::collect(rows, Self::row_to_weight_entry).await
    }

    async fn insert_workout(&self, workout: Workout) -> Result<Workout, DatabaseError> {
        let performed_at = format_timestamp(&workout.performed_at);

        self.db
            .db_create_workout(DbCreateWorkoutParams {
                id: &workout.id,
                user_id: &workout.user_id,
                exercise: &workout.exercise,
                sets: workout.sets,
                reps: workout.reps,
                weight_kg: workout.weight_kg,
                duration_minutes: workout.duration_minutes,
                performed_at: &performed_at,
            })
            .await?;

        let rows = self.db.db_get_workout(&workout.id).await?;
        Self::first(rows, Self::row_to_workout)
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Workout not found after insert"))
    }

    async fn workouts(&self, user_id: &str, limit: u32) -> Result<Vec<Workout>, DatabaseError> {
        let rows = self.db.db_get_workouts(user_id, limit).await?;
        Self::collect(rows, Self::row_to_workout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_accepts_both_formats() {
        let rfc = TursoStore::parse_timestamp("2025-03-01T10:15:30.250000Z").unwrap();
        let sqlite = TursoStore::parse_timestamp("2025-03-01 10:15:30").unwrap();
        assert_eq!(rfc.timestamp(), sqlite.timestamp());
        assert!(TursoStore::parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_format_timestamp_orders_lexically() {
        let earlier = DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2025-03-01T10:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }
}
