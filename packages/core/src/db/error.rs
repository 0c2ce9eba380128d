//! Database Error Types
//!
//! This module defines error types for database operations, providing
//! clear error handling for connection, initialization, and query failures.

use std::path::PathBuf;
use thiserror::Error;

const SQLITE_CONSTRAINT: i32 = 19;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/// Database operation errors
///
/// Covers connection, schema initialization and statement failures.
/// Domain failures (missing parent, sibling conflict) are reported by the
/// service layer, not here.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A UNIQUE constraint rejected the statement
    #[error("Unique constraint violated: {context}")]
    UniqueViolation { context: String },

    /// A stored row could not be converted into a model
    #[error("Failed to decode row: {0}")]
    RowDecode(String),
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row decoding error
    pub fn row_decode(msg: impl Into<String>) -> Self {
        Self::RowDecode(msg.into())
    }

    /// Classify a failed write, separating UNIQUE violations from other failures
    pub fn from_write(context: &str, err: libsql::Error) -> Self {
        let unique = match &err {
            libsql::Error::SqliteFailure(code, message) => match *code {
                SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => true,
                // Some builds only report the primary result code
                SQLITE_CONSTRAINT => message.starts_with("UNIQUE constraint failed"),
                _ => false,
            },
            _ => false,
        };

        if unique {
            Self::UniqueViolation {
                context: format!("{}: {}", context, err),
            }
        } else {
            Self::sql_execution(format!("{}: {}", context, err))
        }
    }

    /// Whether this error came from a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: i32, message: &str) -> libsql::Error {
        libsql::Error::SqliteFailure(code, message.to_string())
    }

    #[test]
    fn test_unique_codes_are_unique_violations() {
        let err = DatabaseError::from_write(
            "Failed to insert node",
            failure(SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed: nodes.path"),
        );
        assert!(err.is_unique_violation());

        let err = DatabaseError::from_write(
            "Failed to insert session",
            failure(SQLITE_CONSTRAINT_PRIMARYKEY, "UNIQUE constraint failed: sessions.id"),
        );
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_other_constraints_are_not_unique_violations() {
        let err = DatabaseError::from_write(
            "Failed to insert node",
            failure(787, "FOREIGN KEY constraint failed"),
        );
        assert!(!err.is_unique_violation());

        let err = DatabaseError::from_write(
            "Failed to insert node",
            failure(SQLITE_CONSTRAINT, "NOT NULL constraint failed: nodes.name"),
        );
        assert!(!err.is_unique_violation());
    }
}
