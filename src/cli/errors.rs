//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit status.

use std::fmt;
use std::io;

use crate::errors::CatalogError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Row store could not be opened
    StoreUnavailable,
    /// The catalog refused the operation
    Rejected,
    /// A record failed validation
    InvalidRecord,
    /// Server failed to start
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "REGISTRY_CLI_CONFIG_ERROR",
            Self::IoError => "REGISTRY_CLI_IO_ERROR",
            Self::StoreUnavailable => "REGISTRY_CLI_STORE_UNAVAILABLE",
            Self::Rejected => "REGISTRY_CLI_REJECTED",
            Self::InvalidRecord => "REGISTRY_CLI_INVALID_RECORD",
            Self::BootFailed => "REGISTRY_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_record(issue_count: usize) -> Self {
        Self::new(
            CliErrorCode::InvalidRecord,
            format!("record failed validation with {} issue(s)", issue_count),
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::StoreUnavailable, e.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::StorageUnavailable(msg) => Self::new(CliErrorCode::StoreUnavailable, msg),
            CatalogError::Validation(issues) => Self::invalid_record(issues.len()),
            other => Self::new(CliErrorCode::Rejected, other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_errors_map_to_codes() {
        let err = CliError::from(CatalogError::not_found("channel type", "slack"));
        assert_eq!(err.code(), &CliErrorCode::Rejected);
        assert!(err.message().contains("slack"));

        let err = CliError::from(CatalogError::StorageUnavailable("disk gone".into()));
        assert_eq!(err.code_str(), "REGISTRY_CLI_STORE_UNAVAILABLE");
    }
}
