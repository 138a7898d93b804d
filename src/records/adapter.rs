//! # Record Store Adapter
//!
//! `get`, `list`, `create`, `update` and `delete` over both record shapes.
//!
//! - Writes are validated first and only ever reach the attribute-map table
//! - Reads prefer the attribute-map table and fall back to the fixed-column
//!   table when a row is missing, its type cannot be resolved, or the read
//!   itself fails
//! - Fallback results are tagged legacy and logged at WARN
//! - Fixed-column rows are never rewritten

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::{CatalogError, CatalogResult, ErrorKind, ValidationIssue};
use crate::model::{ChannelRecord, RecordSource};
use crate::observability::Event;
use crate::registry::TypeRegistry;
use crate::schema::{check, RecordValidator, ValidationMode};

use super::{plain_attributes, ChannelRecordReader, ChannelRecordWriter};

/// Input for [`ChannelStore::create`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChannel {
    pub channel_type_id: i64,
    pub name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for [`ChannelStore::update`]. Absent fields keep their stored value.
///
/// `attributes`, when given, is the full attribute payload; stored values
/// for attributes no longer bound to the type are carried over unless the
/// payload sets them to `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUpdate {
    #[serde(default)]
    pub channel_type_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Listing filter
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelFilter {
    #[serde(default)]
    pub channel_type_id: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ChannelFilter {
    fn matches(&self, record: &ChannelRecord) -> bool {
        self.channel_type_id
            .map_or(true, |id| record.channel_type_id == Some(id))
            && self.is_active.map_or(true, |active| record.is_active == active)
    }
}

/// Logical channel record store
#[derive(Clone)]
pub struct ChannelStore {
    primary: Arc<dyn ChannelRecordWriter>,
    legacy: Arc<dyn ChannelRecordReader>,
    types: TypeRegistry,
    validator: RecordValidator,
}

impl ChannelStore {
    pub fn new(
        primary: Arc<dyn ChannelRecordWriter>,
        legacy: Arc<dyn ChannelRecordReader>,
        types: TypeRegistry,
        validator: RecordValidator,
    ) -> Self {
        Self {
            primary,
            legacy,
            types,
            validator,
        }
    }

    pub fn get(&self, id: i64) -> CatalogResult<ChannelRecord> {
        match self.primary.fetch(id) {
            Ok(Some(record)) => {
                if self.type_resolves(record.channel_type_id)? {
                    return Ok(record);
                }
                Ok(self
                    .fall_back(id, "channel type cannot be resolved")?
                    .unwrap_or(record))
            }
            Ok(None) => self
                .fall_back(id, "no current row")?
                .ok_or_else(|| CatalogError::not_found("channel", id)),
            Err(err) => match self.fall_back(id, "current read failed") {
                Ok(Some(record)) => Ok(record),
                _ => Err(err),
            },
        }
    }

    /// All records matching `filter`, by id.
    ///
    /// Both tables draw ids from one sequence, so a fixed-column row only
    /// shares an id with an attribute-map row once it has been migrated. The
    /// migrated copy is listed in its place unless its type cannot be
    /// resolved.
    pub fn list(&self, filter: ChannelFilter) -> CatalogResult<Vec<ChannelRecord>> {
        let type_ids: HashSet<i64> = self.types.list()?.iter().map(|t| t.id).collect();
        let current = self.primary.fetch_all()?;
        let mut legacy: BTreeMap<i64, ChannelRecord> = self
            .legacy
            .fetch_all()?
            .into_iter()
            .map(|record| (record.id, record))
            .collect();

        let mut records = Vec::with_capacity(current.len() + legacy.len());
        for record in current {
            let resolvable = record
                .channel_type_id
                .map_or(false, |id| type_ids.contains(&id));
            match legacy.remove(&record.id) {
                Some(fallback) if !resolvable => records.push(fallback),
                _ => records.push(record),
            }
        }

        if !legacy.is_empty() {
            warn!(
                event = %Event::LegacyFallback,
                count = legacy.len(),
                "listing includes legacy-sourced records"
            );
        }
        records.extend(legacy.into_values());

        records.retain(|record| filter.matches(record));
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    pub fn create(&self, new: NewChannel) -> CatalogResult<ChannelRecord> {
        let validated = self
            .validator
            .validate(new.channel_type_id, &new.name, &new.attributes, ValidationMode::Create)
            .map_err(rejected)?;

        let now = Utc::now();
        let mut record = ChannelRecord {
            id: 0,
            channel_type_id: Some(validated.channel_type_id),
            name: validated.name,
            attributes: validated.attributes,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
            source: RecordSource::Current,
        };
        record.id = self.primary.insert(&record)?;

        info!(
            event = %Event::RecordCreated,
            id = record.id,
            channel_type_id = validated.channel_type_id,
            "channel record created"
        );
        Ok(record)
    }

    /// Updates an attribute-map record. Legacy-only ids are `NotFound`;
    /// migrating them is a separate, explicit step.
    pub fn update(&self, id: i64, update: ChannelUpdate) -> CatalogResult<ChannelRecord> {
        let existing = self
            .primary
            .fetch(id)?
            .ok_or_else(|| CatalogError::not_found("channel", id))?;

        let channel_type_id = update
            .channel_type_id
            .or(existing.channel_type_id)
            .ok_or_else(|| {
                CatalogError::Validation(vec![ValidationIssue::missing_required("channel_type_id")])
            })?;
        let name = update.name.unwrap_or_else(|| existing.name.clone());
        let payload = update
            .attributes
            .unwrap_or_else(|| plain_attributes(&existing.attributes));

        let schema = self.validator.resolver().resolve(channel_type_id)?;
        let mut validated = check(&schema, &name, &payload, ValidationMode::Update).map_err(rejected)?;

        // Values outside the schema keep their stored discriminant
        for (code, stored) in &existing.attributes {
            if schema.contains(code) {
                continue;
            }
            let keep = match payload.get(code) {
                None => true,
                Some(raw) => *raw == stored.to_plain(),
            };
            if keep {
                validated.attributes.insert(code.clone(), stored.clone());
            }
        }

        let record = ChannelRecord {
            id,
            channel_type_id: Some(channel_type_id),
            name: validated.name,
            attributes: validated.attributes,
            is_active: update.is_active.unwrap_or(existing.is_active),
            created_at: existing.created_at,
            updated_at: Utc::now(),
            source: RecordSource::Current,
        };
        self.primary.replace(&record)?;

        info!(event = %Event::RecordUpdated, id, channel_type_id, "channel record updated");
        Ok(record)
    }

    /// Hard delete of an attribute-map record.
    pub fn delete(&self, id: i64) -> CatalogResult<()> {
        self.primary.remove(id)?;
        info!(event = %Event::RecordDeleted, id, "channel record deleted");
        Ok(())
    }

    fn type_resolves(&self, channel_type_id: Option<i64>) -> CatalogResult<bool> {
        let Some(type_id) = channel_type_id else {
            return Ok(false);
        };
        match self.types.get(type_id) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn fall_back(&self, id: i64, reason: &'static str) -> CatalogResult<Option<ChannelRecord>> {
        let record = self.legacy.fetch(id)?;
        if record.is_some() {
            warn!(event = %Event::LegacyFallback, id, reason, "serving legacy-sourced record");
        }
        Ok(record)
    }
}

fn rejected(err: CatalogError) -> CatalogError {
    if let CatalogError::Validation(issues) = &err {
        info!(event = %Event::RecordRejected, issues = issues.len(), "channel record rejected");
    }
    err
}
