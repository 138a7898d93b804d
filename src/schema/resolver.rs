//! # Schema Resolver
//!
//! Turns a type's bindings into the ordered list of fields that currently
//! apply to it. Both the record validator and the form-facing schema API go
//! through [`SchemaResolver::resolve`]; nothing else derives a schema.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::errors::CatalogResult;
use crate::model::{Attribute, ChannelType, DataType, TypeAttributeBinding};

/// Raw catalog state for one channel type, read consistently
#[derive(Debug, Clone)]
pub struct TypeSchema {
    pub channel_type: ChannelType,
    pub bindings: Vec<TypeAttributeBinding>,
    /// Attributes referenced by `bindings`
    pub attributes: Vec<Attribute>,
}

/// Where the resolver reads catalog state from.
///
/// Implemented by [`SchemaBinder`](super::SchemaBinder); tests may supply
/// their own in-memory catalog.
pub trait SchemaSource: Send + Sync {
    /// Loads one type's schema state. `NotFound` if the type does not exist.
    fn load(&self, channel_type_id: i64) -> CatalogResult<TypeSchema>;
}

/// One field of a resolved schema
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub attribute: Attribute,
    pub is_required: bool,
}

/// The effective, ordered schema of a channel type
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub channel_type: ChannelType,
    pub fields: Vec<ResolvedField>,
}

/// Wire view of a field: what a form renderer needs and nothing more
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub code: String,
    pub name: String,
    pub data_type: DataType,
    pub is_required: bool,
}

impl ResolvedSchema {
    pub fn field(&self, code: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.attribute.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.field(code).is_some()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.attribute.code.as_str()).collect()
    }

    pub fn views(&self) -> Vec<FieldView> {
        self.fields
            .iter()
            .map(|f| FieldView {
                code: f.attribute.code.clone(),
                name: f.attribute.name.clone(),
                data_type: f.attribute.data_type,
                is_required: f.is_required,
            })
            .collect()
    }
}

/// Resolves schemas from an injected [`SchemaSource`]
#[derive(Clone)]
pub struct SchemaResolver {
    source: Arc<dyn SchemaSource>,
}

impl SchemaResolver {
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self { source }
    }

    /// Resolves the schema of `channel_type_id`.
    ///
    /// Fields are ordered by binding position, ties broken by attribute code.
    pub fn resolve(&self, channel_type_id: i64) -> CatalogResult<ResolvedSchema> {
        let TypeSchema {
            channel_type,
            bindings,
            attributes,
        } = self.source.load(channel_type_id)?;

        let mut fields: Vec<(i32, ResolvedField)> = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            match attributes.iter().find(|a| a.id == binding.attribute_id) {
                Some(attribute) => fields.push((
                    binding.display_order,
                    ResolvedField {
                        attribute: attribute.clone(),
                        is_required: binding.is_required,
                    },
                )),
                None => warn!(
                    channel_type_id,
                    attribute_id = binding.attribute_id,
                    "binding references a missing attribute; skipped"
                ),
            }
        }

        fields.sort_by(|(a_order, a), (b_order, b)| {
            a_order
                .cmp(b_order)
                .then_with(|| a.attribute.code.cmp(&b.attribute.code))
        });

        Ok(ResolvedSchema {
            channel_type,
            fields: fields.into_iter().map(|(_, field)| field).collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::CatalogError;

    /// Hand-built catalog for resolver and validator tests
    #[derive(Default)]
    pub struct FakeCatalog {
        pub schemas: HashMap<i64, TypeSchema>,
    }

    impl FakeCatalog {
        pub fn with_type(mut self, id: i64, code: &str, fields: &[(&str, DataType, bool, i32)]) -> Self {
            let channel_type = ChannelType {
                id,
                code: code.into(),
                name: code.into(),
                description: None,
                icon: None,
                color: None,
                display_order: id as i32,
            };
            let mut bindings = Vec::new();
            let mut attributes = Vec::new();
            for (index, (attr_code, data_type, is_required, order)) in fields.iter().enumerate() {
                let attribute_id = id * 100 + index as i64;
                attributes.push(Attribute {
                    id: attribute_id,
                    code: attr_code.to_string(),
                    name: attr_code.to_string(),
                    data_type: *data_type,
                    display_order: index as i32,
                });
                bindings.push(TypeAttributeBinding {
                    id: attribute_id,
                    channel_type_id: id,
                    attribute_id,
                    is_required: *is_required,
                    display_order: *order,
                });
            }
            self.schemas.insert(
                id,
                TypeSchema {
                    channel_type,
                    bindings,
                    attributes,
                },
            );
            self
        }
    }

    impl SchemaSource for FakeCatalog {
        fn load(&self, channel_type_id: i64) -> CatalogResult<TypeSchema> {
            self.schemas
                .get(&channel_type_id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("channel type", channel_type_id))
        }
    }
}
