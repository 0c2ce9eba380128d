//! StudyForge Core Business Logic Layer
//!
//! This crate provides data management and business rules for StudyForge:
//! a speaking-practice tool, a study notes hierarchy and a fitness tracker.
//!
//! # Architecture
//!
//! - **Materialized paths**: every node stores the names from root to itself
//! - **libsql**: embedded SQLite-compatible database
//! - **Store traits**: services depend on [`db::NodeStore`] and
//!   [`db::ActivityStore`], not on SQL
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, SessionRecord, Profile, ...)
//! - [`services`] - Business services (NodeService, SessionService, FitnessService)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{ActivityStore, DatabaseError, DatabaseService, NodeStore, TursoStore};
pub use models::*;
pub use services::*;
