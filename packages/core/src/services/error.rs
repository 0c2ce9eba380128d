//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations. Each variant
//! maps onto one class of the HTTP error taxonomy: invalid input, not found,
//! conflict, or a downstream failure.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request payload failed validation
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),

    /// A referenced entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A sibling with the same name already exists
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    /// Create a not-found error for `entity` identified by `key`
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Create a conflict error for `entity` identified by `key`
    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
