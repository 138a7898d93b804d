//! # Attribute Registry
//!
//! Owns the catalog of attribute definitions. Codes are validated, unique,
//! immutable, and never reused after deletion. The data type is frozen as
//! soon as any channel record holds a value under the attribute's code.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::{CatalogError, CatalogResult, ValidationIssue};
use crate::model::{validate_attribute_code, Attribute, DataType};
use crate::observability::Event;
use crate::store::{from_row, to_row, RowStore, Table, WriteBatch};

use super::next_display_order;

/// Input for [`AttributeRegistry::create`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttribute {
    pub code: String,
    #[serde(alias = "displayName")]
    pub name: String,
    pub data_type: DataType,
    /// Appended after the current maximum when absent
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Partial update. `code` is deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributePatch {
    #[serde(default, alias = "displayName")]
    pub name: Option<String>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Attribute catalog backed by the row store
#[derive(Clone)]
pub struct AttributeRegistry {
    store: Arc<dyn RowStore>,
}

impl AttributeRegistry {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Creates an attribute.
    ///
    /// # Errors
    ///
    /// - `InvalidCode` if the code breaks the identifier rules
    /// - `Validation` if the display name is blank
    /// - `UniquenessConflict` if the code is taken or was used before
    pub fn create(&self, new: NewAttribute) -> CatalogResult<Attribute> {
        validate_attribute_code(&new.code)?;
        let name = required_name(&new.name)?;

        let display_order = match new.display_order {
            Some(order) => order,
            None => next_display_order(&self.store.scan(Table::Attributes)?),
        };

        let mut attribute = Attribute {
            id: 0,
            code: new.code,
            name,
            data_type: new.data_type,
            display_order,
        };

        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, to_row(&attribute)?);
        let ids = self.store.apply(batch)?;
        attribute.id = ids[0];

        info!(
            event = %Event::AttributeCreated,
            id = attribute.id,
            code = %attribute.code,
            data_type = %attribute.data_type,
            "attribute created"
        );
        Ok(attribute)
    }

    pub fn get(&self, id: i64) -> CatalogResult<Attribute> {
        let row = self
            .store
            .get(Table::Attributes, id)?
            .ok_or_else(|| CatalogError::not_found("attribute", id))?;
        Ok(from_row(row)?)
    }

    pub fn find_by_code(&self, code: &str) -> CatalogResult<Option<Attribute>> {
        Ok(self.list()?.into_iter().find(|a| a.code == code))
    }

    /// Applies a partial update. Last write wins.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the attribute does not exist
    /// - `ImmutableField` when changing the data type while records hold values
    pub fn update(&self, id: i64, patch: AttributePatch) -> CatalogResult<Attribute> {
        let mut attribute = self.get(id)?;

        if let Some(name) = patch.name {
            attribute.name = required_name(&name)?;
        }
        if let Some(order) = patch.display_order {
            attribute.display_order = order;
        }
        if let Some(data_type) = patch.data_type {
            if data_type != attribute.data_type {
                let holders = self.count_records_holding(&attribute.code)?;
                if holders > 0 {
                    return Err(CatalogError::ImmutableField {
                        entity: "attribute",
                        field: "data_type",
                        reason: format!(
                            "{} channel record(s) hold values for '{}'; migrate them explicitly first",
                            holders, attribute.code
                        ),
                    });
                }
                attribute.data_type = data_type;
            }
        }

        let mut batch = WriteBatch::new();
        batch.update(Table::Attributes, id, to_row(&attribute)?);
        self.store.apply(batch)?;

        info!(event = %Event::AttributeUpdated, id, code = %attribute.code, "attribute updated");
        Ok(attribute)
    }

    /// All attributes by display order, ties broken by code.
    pub fn list(&self) -> CatalogResult<Vec<Attribute>> {
        let mut attributes = self
            .store
            .scan(Table::Attributes)?
            .into_iter()
            .map(from_row::<Attribute>)
            .collect::<Result<Vec<_>, _>>()?;
        sort_attributes(&mut attributes);
        Ok(attributes)
    }

    /// Deletes an attribute that no binding references.
    ///
    /// The reference check and the delete run in one batch.
    pub fn delete(&self, id: i64) -> CatalogResult<()> {
        let mut batch = WriteBatch::new();
        batch
            .expect_unreferenced(Table::Attributes, id, Table::TypeAttributeBindings, "attribute_id")
            .delete(Table::Attributes, id);
        self.store.apply(batch)?;

        info!(event = %Event::AttributeDeleted, id, "attribute deleted");
        Ok(())
    }

    fn count_records_holding(&self, code: &str) -> CatalogResult<usize> {
        Ok(self
            .store
            .scan(Table::Channels)?
            .iter()
            .filter(|row| {
                row.get("attributes")
                    .and_then(Value::as_object)
                    .map(|values| values.contains_key(code))
                    .unwrap_or(false)
            })
            .count())
    }
}

/// Deterministic listing order
pub fn sort_attributes(attributes: &mut [Attribute]) {
    attributes.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.code.cmp(&b.code))
    });
}

fn required_name(name: &str) -> CatalogResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation(vec![ValidationIssue::missing_required("name")]));
    }
    Ok(trimmed.to_string())
}
