//! # Catalog Errors
//!
//! One error type for every registry, binder, validator and record-store
//! operation. Each variant maps to a machine-readable [`ErrorKind`] that is
//! carried verbatim on the wire.
//!
//! Only [`ErrorKind::StorageUnavailable`] is retryable; everything else is
//! terminal for the request that produced it.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::DataType;
use crate::store::StoreError;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UniquenessConflict,
    ReferentialIntegrity,
    Validation,
    NotFound,
    StorageUnavailable,
    InvalidCode,
    ImmutableField,
}

impl ErrorKind {
    /// Returns the wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UniquenessConflict => "uniqueness_conflict",
            ErrorKind::ReferentialIntegrity => "referential_integrity",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::InvalidCode => "invalid_code",
            ErrorKind::ImmutableField => "immutable_field",
        }
    }

    /// Whether the caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StorageUnavailable)
    }

    /// HTTP status code for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::InvalidCode => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::UniquenessConflict
            | ErrorKind::ReferentialIntegrity
            | ErrorKind::ImmutableField => 409,
            ErrorKind::StorageUnavailable => 503,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field-level validation failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingRequired,
    TypeMismatch,
    UnknownField,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingRequired => "missing_required",
            IssueKind::TypeMismatch => "type_mismatch",
            IssueKind::UnknownField => "unknown_field",
        }
    }
}

/// A single field-level validation failure.
///
/// Issues are never merged: a record with three bad fields yields three issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Attribute code, or `name` for the record name
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<DataType>,
    pub message: String,
}

impl ValidationIssue {
    pub fn missing_required(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            kind: IssueKind::MissingRequired,
            message: format!("'{}' is required", field),
            field,
            expected: None,
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: DataType, reason: impl fmt::Display) -> Self {
        let field = field.into();
        Self {
            kind: IssueKind::TypeMismatch,
            message: format!("'{}' expected {}: {}", field, expected, reason),
            field,
            expected: Some(expected),
        }
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            kind: IssueKind::UnknownField,
            message: format!("'{}' is not part of this channel type's schema", field),
            field,
            expected: None,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

/// Catalog errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("{entity} already exists: {key}")]
    UniquenessConflict { entity: &'static str, key: String },

    #[error("{entity} {id} is still referenced by {dependents}")]
    ReferentialIntegrity {
        entity: &'static str,
        id: i64,
        dependents: &'static str,
    },

    #[error("validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("invalid code '{code}': {reason}")]
    InvalidCode { code: String, reason: &'static str },

    #[error("{entity} field '{field}' cannot change: {reason}")]
    ImmutableField {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        Self::UniquenessConflict {
            entity,
            key: key.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::UniquenessConflict { .. } => ErrorKind::UniquenessConflict,
            CatalogError::ReferentialIntegrity { .. } => ErrorKind::ReferentialIntegrity,
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            CatalogError::InvalidCode { .. } => ErrorKind::InvalidCode,
            CatalogError::ImmutableField { .. } => ErrorKind::ImmutableField,
        }
    }

    /// Field-level issues, empty unless this is a validation error
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            CatalogError::Validation(issues) => issues,
            _ => &[],
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { table, key } => CatalogError::UniquenessConflict {
                entity: table.entity_name(),
                key,
            },
            StoreError::MissingRow { table, id } => CatalogError::not_found(table.entity_name(), id),
            StoreError::Referenced {
                table,
                id,
                referenced_by,
            } => CatalogError::ReferentialIntegrity {
                entity: table.entity_name(),
                id,
                dependents: referenced_by.relation_name(),
            },
            other => CatalogError::StorageUnavailable(other.to_string()),
        }
    }
}
