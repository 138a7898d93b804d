//! # Type Registry
//!
//! Owns the catalog of channel types. Deleting a type is rejected while any
//! channel record or binding still references it; bindings are never
//! cascade-deleted.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::errors::{CatalogError, CatalogResult, ValidationIssue};
use crate::model::{validate_code, ChannelType};
use crate::observability::Event;
use crate::store::{from_row, to_row, RowStore, Table, WriteBatch};

use super::next_display_order;

/// Input for [`TypeRegistry::create`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChannelType {
    pub code: String,
    #[serde(alias = "displayName")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Partial update of presentation metadata
///
/// For the optional text fields the outer `None` leaves the value alone and
/// `Some(None)` clears it; in JSON that is an absent key versus `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTypePatch {
    #[serde(default, alias = "displayName")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub color: Option<Option<String>>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Marks a key that appeared in the input, even with a `null` value.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Channel type catalog backed by the row store
#[derive(Clone)]
pub struct TypeRegistry {
    store: Arc<dyn RowStore>,
}

impl TypeRegistry {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, new: NewChannelType) -> CatalogResult<ChannelType> {
        validate_code(&new.code)?;
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation(vec![ValidationIssue::missing_required("name")]));
        }

        let display_order = match new.display_order {
            Some(order) => order,
            None => next_display_order(&self.store.scan(Table::ChannelTypes)?),
        };

        let mut channel_type = ChannelType {
            id: 0,
            code: new.code,
            name: name.to_string(),
            description: new.description,
            icon: new.icon,
            color: new.color,
            display_order,
        };

        let mut batch = WriteBatch::new();
        batch.insert(Table::ChannelTypes, to_row(&channel_type)?);
        channel_type.id = self.store.apply(batch)?[0];

        info!(
            event = %Event::ChannelTypeCreated,
            id = channel_type.id,
            code = %channel_type.code,
            "channel type created"
        );
        Ok(channel_type)
    }

    pub fn get(&self, id: i64) -> CatalogResult<ChannelType> {
        let row = self
            .store
            .get(Table::ChannelTypes, id)?
            .ok_or_else(|| CatalogError::not_found("channel type", id))?;
        Ok(from_row(row)?)
    }

    pub fn find_by_code(&self, code: &str) -> CatalogResult<Option<ChannelType>> {
        Ok(self.list()?.into_iter().find(|t| t.code == code))
    }

    /// Resolves a type by code, failing with `NotFound`.
    pub fn require_code(&self, code: &str) -> CatalogResult<ChannelType> {
        self.find_by_code(code)?
            .ok_or_else(|| CatalogError::not_found("channel type", code))
    }

    pub fn update(&self, id: i64, patch: ChannelTypePatch) -> CatalogResult<ChannelType> {
        let mut channel_type = self.get(id)?;

        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::Validation(vec![ValidationIssue::missing_required("name")]));
            }
            channel_type.name = name.to_string();
        }
        if let Some(description) = patch.description {
            channel_type.description = description;
        }
        if let Some(icon) = patch.icon {
            channel_type.icon = icon;
        }
        if let Some(color) = patch.color {
            channel_type.color = color;
        }
        if let Some(order) = patch.display_order {
            channel_type.display_order = order;
        }

        let mut batch = WriteBatch::new();
        batch.update(Table::ChannelTypes, id, to_row(&channel_type)?);
        self.store.apply(batch)?;

        info!(event = %Event::ChannelTypeUpdated, id, code = %channel_type.code, "channel type updated");
        Ok(channel_type)
    }

    /// All types by display order, ties broken by code.
    pub fn list(&self) -> CatalogResult<Vec<ChannelType>> {
        let mut types = self
            .store
            .scan(Table::ChannelTypes)?
            .into_iter()
            .map(from_row::<ChannelType>)
            .collect::<Result<Vec<_>, _>>()?;
        types.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(types)
    }

    /// Deletes a type that no record and no binding references.
    pub fn delete(&self, id: i64) -> CatalogResult<()> {
        let mut batch = WriteBatch::new();
        batch
            .expect_unreferenced(Table::ChannelTypes, id, Table::Channels, "channel_type_id")
            .expect_unreferenced(
                Table::ChannelTypes,
                id,
                Table::TypeAttributeBindings,
                "channel_type_id",
            )
            .delete(Table::ChannelTypes, id);
        self.store.apply(batch)?;

        info!(event = %Event::ChannelTypeDeleted, id, "channel type deleted");
        Ok(())
    }
}
