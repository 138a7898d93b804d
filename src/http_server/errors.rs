//! # HTTP Errors
//!
//! Catalog errors rendered as JSON:
//!
//! ```text
//! {"kind": "validation", "message": "...", "issues": [{"kind": "missing_required", "field": "url", ...}]}
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::{CatalogError, ValidationIssue};

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

impl From<&CatalogError> for ErrorResponse {
    fn from(err: &CatalogError) -> Self {
        Self {
            kind: err.kind().as_str(),
            message: err.to_string(),
            issues: err.issues().to_vec(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError(CatalogError::not_found("channel", 3)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(CatalogError::conflict("attribute", "url")).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(CatalogError::StorageUnavailable("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_body_carries_issues_only_for_validation() {
        let body = ErrorResponse::from(&CatalogError::Validation(vec![
            ValidationIssue::missing_required("url"),
        ]));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["issues"][0]["field"], "url");

        let body = ErrorResponse::from(&CatalogError::not_found("channel", 3));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("issues").is_none());
    }
}
