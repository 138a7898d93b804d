//! # Schema Binder
//!
//! Maintains the `(channel type, attribute)` bindings that make up each
//! type's schema.
//!
//! Every mutation is one store batch. Operations that compute display
//! positions from current state (`attach` with a default order, `reorder`)
//! also hold the binder lock, so two admins editing the same type can never
//! produce duplicate or missing positions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Value};
use tracing::info;

use crate::errors::{CatalogError, CatalogResult, ValidationIssue};
use crate::model::{Attribute, ChannelType, TypeAttributeBinding};
use crate::observability::Event;
use crate::store::{from_row, to_row, Row, RowStore, Snapshot, Table, WriteBatch};

use super::resolver::{SchemaSource, TypeSchema};

/// Binding editor backed by the row store
pub struct SchemaBinder {
    store: Arc<dyn RowStore>,
    lock: Mutex<()>,
}

impl SchemaBinder {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Binds an attribute to a channel type.
    ///
    /// Without an explicit `display_order` the binding is appended after the
    /// type's current last position.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the type or the attribute does not exist
    /// - `UniquenessConflict` if the pair is already bound
    pub fn attach(
        &self,
        channel_type_id: i64,
        attribute_id: i64,
        is_required: bool,
        display_order: Option<i32>,
    ) -> CatalogResult<TypeAttributeBinding> {
        let _guard = self.lock();

        let display_order = match display_order {
            Some(order) => order,
            None => self
                .bindings_for_type(channel_type_id)?
                .iter()
                .map(|b| b.display_order)
                .max()
                .map_or(1, |max| max.saturating_add(1)),
        };

        let mut binding = TypeAttributeBinding {
            id: 0,
            channel_type_id,
            attribute_id,
            is_required,
            display_order,
        };

        let mut batch = WriteBatch::new();
        batch
            .expect_exists(Table::ChannelTypes, channel_type_id)
            .expect_exists(Table::Attributes, attribute_id)
            .insert(Table::TypeAttributeBindings, to_row(&binding)?);
        binding.id = self.store.apply(batch)?[0];

        info!(
            event = %Event::BindingAttached,
            channel_type_id,
            attribute_id,
            is_required,
            display_order,
            "attribute attached"
        );
        Ok(binding)
    }

    /// Removes a binding. Values already stored on records are untouched.
    pub fn detach(&self, channel_type_id: i64, attribute_id: i64) -> CatalogResult<()> {
        let _guard = self.lock();
        let binding = self.require_binding(channel_type_id, attribute_id)?;

        let mut batch = WriteBatch::new();
        batch.delete(Table::TypeAttributeBindings, binding.id);
        self.store.apply(batch)?;

        info!(event = %Event::BindingDetached, channel_type_id, attribute_id, "attribute detached");
        Ok(())
    }

    pub fn set_required(
        &self,
        channel_type_id: i64,
        attribute_id: i64,
        is_required: bool,
    ) -> CatalogResult<TypeAttributeBinding> {
        let _guard = self.lock();
        let mut binding = self.require_binding(channel_type_id, attribute_id)?;

        let mut batch = WriteBatch::new();
        batch.patch(
            Table::TypeAttributeBindings,
            binding.id,
            fields(json!({ "is_required": is_required })),
        );
        self.store.apply(batch)?;
        binding.is_required = is_required;

        info!(
            event = %Event::BindingRequiredChanged,
            channel_type_id,
            attribute_id,
            is_required,
            "binding requirement changed"
        );
        Ok(binding)
    }

    /// Rewrites the positions of a type's bindings in one batch.
    ///
    /// `ordered_attribute_ids` must name every bound attribute; positions
    /// become `1..=n` in the given order. Repeated ids count once.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the type does not exist or an id is not bound to it
    /// - `Validation` with one `missing_required` issue per omitted attribute
    pub fn reorder(
        &self,
        channel_type_id: i64,
        ordered_attribute_ids: &[i64],
    ) -> CatalogResult<Vec<TypeAttributeBinding>> {
        let _guard = self.lock();

        let snapshot = self.store.read_tables(&[
            Table::ChannelTypes,
            Table::TypeAttributeBindings,
            Table::Attributes,
        ])?;
        find_type(&snapshot, channel_type_id)?;
        let current = bindings_in(&snapshot, channel_type_id)?;

        let mut ordered: Vec<TypeAttributeBinding> = Vec::with_capacity(current.len());
        for attribute_id in ordered_attribute_ids {
            if ordered.iter().any(|b| b.attribute_id == *attribute_id) {
                continue;
            }
            let binding = current
                .iter()
                .find(|b| b.attribute_id == *attribute_id)
                .ok_or_else(|| binding_not_found(channel_type_id, *attribute_id))?;
            ordered.push(binding.clone());
        }

        let omitted: Vec<ValidationIssue> = current
            .iter()
            .filter(|b| !ordered.iter().any(|o| o.id == b.id))
            .map(|b| {
                let field = attribute_code(&snapshot, b.attribute_id)
                    .unwrap_or_else(|| b.attribute_id.to_string());
                ValidationIssue::missing_required(field)
            })
            .collect();
        if !omitted.is_empty() {
            return Err(CatalogError::Validation(omitted));
        }

        let mut batch = WriteBatch::new();
        batch.expect_exists(Table::ChannelTypes, channel_type_id);
        for (position, binding) in ordered.iter_mut().enumerate() {
            binding.display_order = position as i32 + 1;
            batch.patch(
                Table::TypeAttributeBindings,
                binding.id,
                fields(json!({ "display_order": binding.display_order })),
            );
        }
        self.store.apply(batch)?;

        info!(
            event = %Event::BindingsReordered,
            channel_type_id,
            count = ordered.len(),
            "bindings reordered"
        );
        Ok(ordered)
    }

    /// Bindings of one type, by display order.
    pub fn bindings_for_type(&self, channel_type_id: i64) -> CatalogResult<Vec<TypeAttributeBinding>> {
        let mut bindings = self
            .store
            .scan(Table::TypeAttributeBindings)?
            .into_iter()
            .filter(|row| row.get("channel_type_id").and_then(Value::as_i64) == Some(channel_type_id))
            .map(from_row::<TypeAttributeBinding>)
            .collect::<Result<Vec<_>, _>>()?;
        bindings.sort_by_key(|b| (b.display_order, b.id));
        Ok(bindings)
    }

    fn require_binding(&self, channel_type_id: i64, attribute_id: i64) -> CatalogResult<TypeAttributeBinding> {
        self.bindings_for_type(channel_type_id)?
            .into_iter()
            .find(|b| b.attribute_id == attribute_id)
            .ok_or_else(|| binding_not_found(channel_type_id, attribute_id))
    }

    /// The mutex guards no data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SchemaSource for SchemaBinder {
    fn load(&self, channel_type_id: i64) -> CatalogResult<TypeSchema> {
        let snapshot = self.store.read_tables(&[
            Table::ChannelTypes,
            Table::TypeAttributeBindings,
            Table::Attributes,
        ])?;

        let channel_type = find_type(&snapshot, channel_type_id)?;
        let bindings = bindings_in(&snapshot, channel_type_id)?;
        let attributes = snapshot
            .rows(Table::Attributes)
            .iter()
            .filter(|row| {
                row.get("id")
                    .and_then(Value::as_i64)
                    .map_or(false, |id| bindings.iter().any(|b| b.attribute_id == id))
            })
            .cloned()
            .map(from_row::<Attribute>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TypeSchema {
            channel_type,
            bindings,
            attributes,
        })
    }
}

fn find_type(snapshot: &Snapshot, channel_type_id: i64) -> CatalogResult<ChannelType> {
    let row = snapshot
        .rows(Table::ChannelTypes)
        .iter()
        .find(|row| row.get("id").and_then(Value::as_i64) == Some(channel_type_id))
        .cloned()
        .ok_or_else(|| CatalogError::not_found("channel type", channel_type_id))?;
    Ok(from_row(row)?)
}

fn bindings_in(snapshot: &Snapshot, channel_type_id: i64) -> CatalogResult<Vec<TypeAttributeBinding>> {
    let mut bindings = snapshot
        .rows(Table::TypeAttributeBindings)
        .iter()
        .filter(|row| row.get("channel_type_id").and_then(Value::as_i64) == Some(channel_type_id))
        .cloned()
        .map(from_row::<TypeAttributeBinding>)
        .collect::<Result<Vec<_>, _>>()?;
    bindings.sort_by_key(|b| (b.display_order, b.id));
    Ok(bindings)
}

fn attribute_code(snapshot: &Snapshot, attribute_id: i64) -> Option<String> {
    snapshot
        .rows(Table::Attributes)
        .iter()
        .find(|row| row.get("id").and_then(Value::as_i64) == Some(attribute_id))
        .and_then(|row| row.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn binding_not_found(channel_type_id: i64, attribute_id: i64) -> CatalogError {
    CatalogError::not_found("binding", format!("{}:{}", channel_type_id, attribute_id))
}

fn fields(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
