//! Identifier rules for attribute and channel type codes.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{CatalogError, CatalogResult};

/// Maximum code length
pub const MAX_CODE_LEN: usize = 64;

/// Record fields that live outside the attribute map
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "name",
    "channel_type_id",
    "attributes",
    "is_active",
    "created_at",
    "updated_at",
];

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_]+$").expect("valid regex"))
}

/// Checks the identifier pattern shared by attribute and channel type codes.
pub fn validate_code(code: &str) -> CatalogResult<()> {
    if code.is_empty() {
        return Err(CatalogError::InvalidCode {
            code: code.to_string(),
            reason: "code must not be empty",
        });
    }
    if code.len() > MAX_CODE_LEN {
        return Err(CatalogError::InvalidCode {
            code: code.to_string(),
            reason: "code is longer than 64 characters",
        });
    }
    if !code_pattern().is_match(code) {
        return Err(CatalogError::InvalidCode {
            code: code.to_string(),
            reason: "only lowercase letters, digits and underscores are allowed",
        });
    }
    Ok(())
}

/// Attribute codes additionally must not shadow a record field.
pub fn validate_attribute_code(code: &str) -> CatalogResult<()> {
    validate_code(code)?;
    if RESERVED_FIELDS.contains(&code) {
        return Err(CatalogError::InvalidCode {
            code: code.to_string(),
            reason: "code collides with a reserved record field",
        });
    }
    Ok(())
}
