//! # Record Validator
//!
//! Checks a channel record against the resolved schema of its type and
//! returns the normalized, typed attribute map. Every failing field yields
//! its own issue. No side effects.
//!
//! Rules, in order:
//!
//! 1. `name` must not be blank
//! 2. the schema comes from [`SchemaResolver`]
//! 3. required fields must be present and non-blank
//! 4. present schema fields are type-checked against their data type
//! 5. keys outside the schema are rejected on create, carried on update
//! 6. all issues are reported together

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::{CatalogError, CatalogResult, ValidationIssue};
use crate::model::{is_blank, AttributeValue, DataType};

use super::resolver::{ResolvedSchema, SchemaResolver};

/// Whether the record is new or already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Output of a successful validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub channel_type_id: i64,
    pub name: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Validates records against resolved schemas
#[derive(Clone)]
pub struct RecordValidator {
    resolver: SchemaResolver,
}

impl RecordValidator {
    pub fn new(resolver: SchemaResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// Validates a record for `channel_type_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` with one issue per failing field
    /// - `NotFound` if the channel type does not exist
    pub fn validate(
        &self,
        channel_type_id: i64,
        name: &str,
        values: &Map<String, Value>,
        mode: ValidationMode,
    ) -> CatalogResult<ValidatedRecord> {
        let schema = self.resolver.resolve(channel_type_id)?;
        check(&schema, name, values, mode)
    }
}

/// Applies the validation rules to an already resolved schema.
pub fn check(
    schema: &ResolvedSchema,
    name: &str,
    values: &Map<String, Value>,
    mode: ValidationMode,
) -> CatalogResult<ValidatedRecord> {
    let mut issues = Vec::new();
    let mut attributes = BTreeMap::new();

    if name.trim().is_empty() {
        issues.push(ValidationIssue::missing_required("name"));
    }

    for field in &schema.fields {
        let code = field.attribute.code.as_str();
        let data_type = field.attribute.data_type;

        let raw = match values.get(code) {
            Some(raw) if !is_blank(raw) => raw,
            Some(Value::String(s)) if data_type == DataType::Text && !field.is_required => {
                // Optional text keeps an explicit empty string
                attributes.insert(code.to_string(), AttributeValue::Text(s.clone()));
                continue;
            }
            _ => {
                if field.is_required {
                    issues.push(ValidationIssue::missing_required(code));
                }
                continue;
            }
        };

        match AttributeValue::parse(data_type, raw) {
            Ok(value) => {
                attributes.insert(code.to_string(), value);
            }
            Err(reason) => issues.push(ValidationIssue::type_mismatch(code, data_type, reason)),
        }
    }

    for (key, raw) in values {
        if schema.contains(key) {
            continue;
        }
        match mode {
            ValidationMode::Create => issues.push(ValidationIssue::unknown_field(key.as_str())),
            ValidationMode::Update => {
                if let Some(value) = AttributeValue::infer(raw) {
                    attributes.insert(key.clone(), value);
                }
            }
        }
    }

    if !issues.is_empty() {
        return Err(CatalogError::Validation(issues));
    }

    Ok(ValidatedRecord {
        channel_type_id: schema.channel_type.id,
        name: name.trim().to_string(),
        attributes,
    })
}
