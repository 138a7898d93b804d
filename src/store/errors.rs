//! # Row Store Errors

use thiserror::Error;

use super::table::Table;

/// Result type for row store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Row store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // Constraint errors
    #[error("unique constraint on {} violated by '{key}'", .table.relation_name())]
    UniqueViolation { table: Table, key: String },

    #[error("row {id} not found in {}", .table.relation_name())]
    MissingRow { table: Table, id: i64 },

    #[error("row {id} in {} is referenced by {}", .table.relation_name(), .referenced_by.relation_name())]
    Referenced {
        table: Table,
        id: i64,
        referenced_by: Table,
    },

    // Availability errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error("snapshot corrupted: {0}")]
    Corrupted(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupted(e.to_string())
    }
}
