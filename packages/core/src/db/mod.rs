//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management ([`DatabaseService`])
//! - Store traits consumed by the services ([`NodeStore`], [`ActivityStore`])
//! - The libsql-backed implementation of those traits ([`TursoStore`])

mod database;
mod error;
mod node_store;
mod turso_store;

pub use database::{
    DatabaseService, DbCreateNodeParams, DbCreateSessionParams, DbCreateWorkoutParams,
    DbUpsertProfileParams,
};
pub use error::DatabaseError;
pub use node_store::{ActivityStore, NodeStore};
pub use turso_store::{format_timestamp, TursoStore};
