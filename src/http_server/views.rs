//! Wire views
//!
//! camelCase JSON shapes of catalog entities and records. Attribute values
//! are rendered as plain JSON keyed by attribute code.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ValidationIssue;
use crate::model::{Attribute, ChannelRecord, ChannelType, DataType, RecordSource, TypeAttributeBinding};
use crate::records::plain_attributes;
use crate::schema::{FieldView, ResolvedSchema};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeView {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub data_type: DataType,
    pub display_order: i32,
}

impl From<&Attribute> for AttributeView {
    fn from(attribute: &Attribute) -> Self {
        Self {
            id: attribute.id,
            code: attribute.code.clone(),
            name: attribute.name.clone(),
            data_type: attribute.data_type,
            display_order: attribute.display_order,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTypeView {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
}

impl From<&ChannelType> for ChannelTypeView {
    fn from(channel_type: &ChannelType) -> Self {
        Self {
            id: channel_type.id,
            code: channel_type.code.clone(),
            name: channel_type.name.clone(),
            description: channel_type.description.clone(),
            icon: channel_type.icon.clone(),
            color: channel_type.color.clone(),
            display_order: channel_type.display_order,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingView {
    pub id: i64,
    pub channel_type_id: i64,
    pub attribute_id: i64,
    pub is_required: bool,
    pub display_order: i32,
}

impl From<&TypeAttributeBinding> for BindingView {
    fn from(binding: &TypeAttributeBinding) -> Self {
        Self {
            id: binding.id,
            channel_type_id: binding.channel_type_id,
            attribute_id: binding.attribute_id,
            is_required: binding.is_required,
            display_order: binding.display_order,
        }
    }
}

/// Resolved schema of one type, as a form renderer consumes it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaView {
    pub channel_type_id: i64,
    pub channel_type_code: String,
    pub fields: Vec<FieldView>,
}

impl From<&ResolvedSchema> for SchemaView {
    fn from(schema: &ResolvedSchema) -> Self {
        Self {
            channel_type_id: schema.channel_type.id,
            channel_type_code: schema.channel_type.code.clone(),
            fields: schema.views(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelView {
    pub id: i64,
    pub channel_type_id: Option<i64>,
    pub name: String,
    pub attributes: Map<String, Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `legacy` marks best-effort data reconstructed from fixed columns
    pub source: RecordSource,
}

impl From<&ChannelRecord> for ChannelView {
    fn from(record: &ChannelRecord) -> Self {
        Self {
            id: record.id,
            channel_type_id: record.channel_type_id,
            name: record.name.clone(),
            attributes: plain_attributes(&record.attributes),
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
            source: record.source,
        }
    }
}

/// Outcome of a dry-run validation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationView {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// Normalized values; empty when invalid
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
