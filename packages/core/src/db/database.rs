//! Database Connection Management
//!
//! This module provides the database connection and schema initialization
//! for StudyForge using libsql.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: Enabled for referential integrity
//! - **Idempotent schema**: `CREATE TABLE IF NOT EXISTS` only
//!
//! # Database Connection Patterns
//!
//! **Always use `connect_with_timeout()` in async functions.** The 5-second
//! busy timeout lets concurrent writers wait instead of failing immediately
//! with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use studyforge_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/studyforge.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The `db_*` methods hold the SQL. They return raw `libsql::Rows` for reads;
//! row conversion lives in [`TursoStore`](crate::db::TursoStore).

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

const NODE_COLUMNS: &str = "id, name, parent_id, path, depth, notes, mastery_count, \
     last_mastered_at, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, subject, lesson, topic, transcript, feedback, \
     duration_seconds, word_count, overall_score, created_at";

const WORKOUT_COLUMNS: &str =
    "id, user_id, exercise, sets, reps, weight_kg, duration_minutes, performed_at";

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Parameters for node insertion
pub struct DbCreateNodeParams<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub parent_id: Option<&'a str>,
    pub path: &'a str,
    pub depth: i64,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
}

/// Parameters for session insertion
pub struct DbCreateSessionParams<'a> {
    pub id: &'a str,
    pub subject: &'a str,
    pub lesson: &'a str,
    pub topic: &'a str,
    pub transcript: Option<&'a str>,
    pub feedback: Option<&'a str>,
    pub duration_seconds: i64,
    pub word_count: i64,
    pub overall_score: Option<f64>,
    pub created_at: &'a str,
}

/// Parameters for profile upsert
pub struct DbUpsertProfileParams<'a> {
    pub user_id: &'a str,
    pub display_name: Option<&'a str>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<&'a str>,
    pub updated_at: &'a str,
}

/// Parameters for workout insertion
pub struct DbCreateWorkoutParams<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub exercise: &'a str,
    pub sets: i64,
    pub reps: i64,
    pub weight_kg: Option<f64>,
    pub duration_minutes: Option<i64>,
    pub performed_at: &'a str,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;
        tracing::info!(path = %service.db_path.display(), "database ready");

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Run a DDL statement, labelling failures with `what`
    async fn execute_ddl(
        &self,
        conn: &libsql::Connection,
        what: &str,
        sql: &str,
    ) -> Result<(), DatabaseError> {
        conn.execute(sql, ()).await.map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create {}: {}", what, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// # Schema
    ///
    /// - `nodes`: study hierarchy with materialized `path` (unique)
    /// - `sessions`: speaking practice history
    /// - `profiles`, `weight_logs`, `workouts`: fitness tracker
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        self.execute_ddl(
            &conn,
            "nodes table",
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT,
                path TEXT NOT NULL,
                depth INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                mastery_count INTEGER NOT NULL DEFAULT 0,
                last_mastered_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES nodes(id) ON DELETE CASCADE
            )",
        )
        .await?;

        // Sibling names are unique, so the full path is unique too
        self.execute_ddl(
            &conn,
            "index 'idx_nodes_path'",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_path ON nodes(path)",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "index 'idx_nodes_parent_name'",
            "CREATE INDEX IF NOT EXISTS idx_nodes_parent_name ON nodes(parent_id, name)",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "sessions table",
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                subject TEXT NOT NULL,
                lesson TEXT NOT NULL,
                topic TEXT NOT NULL,
                transcript TEXT,
                feedback TEXT,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                word_count INTEGER NOT NULL DEFAULT 0,
                overall_score REAL,
                created_at TEXT NOT NULL
            )",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "index 'idx_sessions_scope'",
            "CREATE INDEX IF NOT EXISTS idx_sessions_scope
                ON sessions(subject, lesson, created_at DESC)",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "profiles table",
            "CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                display_name TEXT,
                height_cm REAL,
                weight_kg REAL,
                goal TEXT,
                updated_at TEXT NOT NULL
            )",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "weight_logs table",
            "CREATE TABLE IF NOT EXISTS weight_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                logged_at TEXT NOT NULL
            )",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "index 'idx_weight_logs_user'",
            "CREATE INDEX IF NOT EXISTS idx_weight_logs_user
                ON weight_logs(user_id, logged_at DESC)",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "workouts table",
            "CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                exercise TEXT NOT NULL,
                sets INTEGER NOT NULL,
                reps INTEGER NOT NULL,
                weight_kg REAL,
                duration_minutes INTEGER,
                performed_at TEXT NOT NULL
            )",
        )
        .await?;

        self.execute_ddl(
            &conn,
            "index 'idx_workouts_user'",
            "CREATE INDEX IF NOT EXISTS idx_workouts_user ON workouts(user_id, performed_at DESC)",
        )
        .await?;

        // Flush the fresh schema so other connections see it immediately
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Open a connection without configuring it.
    ///
    /// Prefer [`connect_with_timeout`](Self::connect_with_timeout) in async code.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to open connection: {}", e))
        })
    }

    /// Open a connection with a 5 second busy timeout and foreign keys enabled
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    async fn query_rows(
        &self,
        label: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare {} query: {}", label, e))
        })?;

        stmt.query(params).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute {} query: {}", label, e))
        })
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Insert a node row. UNIQUE violations on `path` surface as
    /// [`DatabaseError::UniqueViolation`].
    pub async fn db_create_node(
        &self,
        params: DbCreateNodeParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO nodes (id, name, parent_id, path, depth, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.name,
                params.parent_id,
                params.path,
                params.depth,
                params.notes,
                params.created_at,
                params.created_at,
            ),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to insert node", e))?;

        Ok(())
    }

    pub async fn db_get_node(&self, id: &str) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_node",
            &format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS),
            [id],
        )
        .await
    }

    /// Look up a node by its encoded materialized path
    pub async fn db_get_node_by_path(&self, path: &str) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_node_by_path",
            &format!("SELECT {} FROM nodes WHERE path = ?", NODE_COLUMNS),
            [path],
        )
        .await
    }

    /// Direct children of `parent_id` (roots when `None`), alphabetical by name
    pub async fn db_get_children(
        &self,
        parent_id: Option<&str>,
    ) -> Result<libsql::Rows, DatabaseError> {
        match parent_id {
            Some(parent_id) => {
                self.query_rows(
                    "get_children",
                    &format!(
                        "SELECT {} FROM nodes WHERE parent_id = ?
                         ORDER BY name COLLATE NOCASE ASC, name ASC",
                        NODE_COLUMNS
                    ),
                    [parent_id],
                )
                .await
            }
            None => {
                self.query_rows(
                    "get_root_nodes",
                    &format!(
                        "SELECT {} FROM nodes WHERE parent_id IS NULL
                         ORDER BY name COLLATE NOCASE ASC, name ASC",
                        NODE_COLUMNS
                    ),
                    (),
                )
                .await
            }
        }
    }

    /// Sibling with exactly `name` under `parent_id` (or among roots)
    pub async fn db_find_child(
        &self,
        parent_id: Option<&str>,
        name: &str,
    ) -> Result<libsql::Rows, DatabaseError> {
        match parent_id {
            Some(parent_id) => {
                self.query_rows(
                    "find_child",
                    &format!(
                        "SELECT {} FROM nodes WHERE parent_id = ? AND name = ? LIMIT 1",
                        NODE_COLUMNS
                    ),
                    (parent_id, name),
                )
                .await
            }
            None => {
                self.query_rows(
                    "find_root",
                    &format!(
                        "SELECT {} FROM nodes WHERE parent_id IS NULL AND name = ? LIMIT 1",
                        NODE_COLUMNS
                    ),
                    [name],
                )
                .await
            }
        }
    }

    /// Overwrite a node's notes. Returns rows affected.
    pub async fn db_update_notes(
        &self,
        id: &str,
        notes: &str,
        updated_at: &str,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE nodes SET notes = ?, updated_at = ? WHERE id = ?",
            (notes, updated_at, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update notes: {}", e)))
    }

    /// Increment a node's mastery counter. Returns rows affected.
    pub async fn db_increment_mastery(
        &self,
        id: &str,
        mastered_at: &str,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE nodes
             SET mastery_count = mastery_count + 1, last_mastered_at = ?, updated_at = ?
             WHERE id = ?",
            (mastered_at, mastered_at, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update mastery: {}", e)))
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub async fn db_create_session(
        &self,
        params: DbCreateSessionParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO sessions (id, subject, lesson, topic, transcript, feedback,
                                   duration_seconds, word_count, overall_score, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.subject,
                params.lesson,
                params.topic,
                params.transcript,
                params.feedback,
                params.duration_seconds,
                params.word_count,
                params.overall_score,
                params.created_at,
            ),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to insert session", e))?;

        Ok(())
    }

    pub async fn db_get_session(&self, id: &str) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_session",
            &format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS),
            [id],
        )
        .await
    }

    /// Sessions for a subject/lesson pair, newest first.
    ///
    /// Ties on `created_at` fall back to insertion order (newest first).
    pub async fn db_get_sessions(
        &self,
        subject: &str,
        lesson: &str,
        limit: Option<u32>,
    ) -> Result<libsql::Rows, DatabaseError> {
        let limit_clause = limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();

        self.query_rows(
            "get_sessions",
            &format!(
                "SELECT {} FROM sessions WHERE subject = ? AND lesson = ?
                 ORDER BY created_at DESC, rowid DESC{}",
                SESSION_COLUMNS, limit_clause
            ),
            (subject, lesson),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Profiles and fitness
    // ------------------------------------------------------------------

    pub async fn db_get_profile(&self, user_id: &str) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_profile",
            "SELECT user_id, display_name, height_cm, weight_kg, goal, updated_at
             FROM profiles WHERE user_id = ?",
            [user_id],
        )
        .await
    }

    /// Insert or merge a profile; NULL parameters keep the stored value
    pub async fn db_upsert_profile(
        &self,
        params: DbUpsertProfileParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO profiles (user_id, display_name, height_cm, weight_kg, goal, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, profiles.display_name),
                height_cm = COALESCE(excluded.height_cm, profiles.height_cm),
                weight_kg = COALESCE(excluded.weight_kg, profiles.weight_kg),
                goal = COALESCE(excluded.goal, profiles.goal),
                updated_at = excluded.updated_at",
            (
                params.user_id,
                params.display_name,
                params.height_cm,
                params.weight_kg,
                params.goal,
                params.updated_at,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to upsert profile: {}", e)))?;

        Ok(())
    }

    pub async fn db_create_weight_log(
        &self,
        id: &str,
        user_id: &str,
        weight_kg: f64,
        logged_at: &str,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO weight_logs (id, user_id, weight_kg, logged_at) VALUES (?, ?, ?, ?)",
            (id, user_id, weight_kg, logged_at),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to insert weight log", e))?;

        Ok(())
    }

    pub async fn db_get_weight_logs(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_weight_logs",
            &format!(
                "SELECT id, user_id, weight_kg, logged_at FROM weight_logs
                 WHERE user_id = ? ORDER BY logged_at DESC, rowid DESC LIMIT {}",
                limit
            ),
            [user_id],
        )
        .await
    }

    pub async fn db_create_workout(
        &self,
        params: DbCreateWorkoutParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO workouts (id, user_id, exercise, sets, reps, weight_kg,
                                   duration_minutes, performed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.user_id,
                params.exercise,
                params.sets,
                params.reps,
                params.weight_kg,
                params.duration_minutes,
                params.performed_at,
            ),
        )
        .await
        .map_err(|e| DatabaseError::from_write("Failed to insert workout", e))?;

        Ok(())
    }

    pub async fn db_get_workout(&self, id: &str) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_workout",
            &format!("SELECT {} FROM workouts WHERE id = ?", WORKOUT_COLUMNS),
            [id],
        )
        .await
    }

    pub async fn db_get_workouts(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<libsql::Rows, DatabaseError> {
        self.query_rows(
            "get_workouts",
            &format!(
                "SELECT {} FROM workouts WHERE user_id = ?
                 ORDER BY performed_at DESC, rowid DESC LIMIT {}",
                WORKOUT_COLUMNS, limit
            ),
            [user_id],
        )
        .await
    }
}
