//! Fixed-column channel table, read only.
//!
//! Rows carry a free-form `category` instead of a type id and named columns
//! instead of an attribute map. Each row is reconstructed into a
//! [`ChannelRecord`] tagged [`RecordSource::Legacy`]. Nothing here writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CatalogResult;
use crate::model::{is_blank, AttributeValue, ChannelRecord, DataType, RecordSource};
use crate::store::{Row, RowStore, Table};

use super::ChannelRecordReader;

/// Fixed column -> attribute code
pub const LEGACY_COLUMNS: &[(&str, &str)] = &[
    ("url", "url"),
    ("member_count", "member_count"),
    ("avg_daily_views", "view_count"),
    ("description", "description"),
    ("contact_info", "contact_info"),
    ("requirements", "requirements"),
];

/// How legacy categories map onto channel types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// Type assigned when a category has no explicit mapping
    pub default_type_code: String,
    /// Legacy category -> channel type code
    pub category_types: BTreeMap<String, String>,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            default_type_code: "platform_service".to_string(),
            category_types: BTreeMap::new(),
        }
    }
}

impl LegacyConfig {
    pub fn type_code_for(&self, category: Option<&str>) -> &str {
        category
            .and_then(|c| self.category_types.get(c.trim()))
            .map(String::as_str)
            .unwrap_or(&self.default_type_code)
    }
}

/// Reads the `campaign_channels` relation
#[derive(Clone)]
pub struct LegacyChannels {
    store: Arc<dyn RowStore>,
    config: LegacyConfig,
}

/// Catalog lookups needed to reconstruct rows
struct Catalog {
    type_ids: HashMap<String, i64>,
    data_types: HashMap<String, DataType>,
}

impl LegacyChannels {
    pub fn new(store: Arc<dyn RowStore>, config: LegacyConfig) -> Self {
        Self { store, config }
    }

    fn catalog(&self) -> CatalogResult<Catalog> {
        let snapshot = self
            .store
            .read_tables(&[Table::ChannelTypes, Table::Attributes])?;

        let code_and_id = |row: &Row| {
            Some((
                row.get("code")?.as_str()?.to_string(),
                row.get("id")?.as_i64()?,
            ))
        };
        let type_ids = snapshot
            .rows(Table::ChannelTypes)
            .iter()
            .filter_map(code_and_id)
            .collect();
        let data_types = snapshot
            .rows(Table::Attributes)
            .iter()
            .filter_map(|row| {
                let code = row.get("code")?.as_str()?.to_string();
                let data_type = row.get("data_type")?.as_str()?.parse::<DataType>().ok()?;
                Some((code, data_type))
            })
            .collect();

        Ok(Catalog {
            type_ids,
            data_types,
        })
    }

    fn reconstruct(&self, row: &Row, catalog: &Catalog) -> Option<ChannelRecord> {
        let id = row.get("id").and_then(Value::as_i64)?;
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let category = row.get("category").and_then(Value::as_str);
        let channel_type_id = catalog
            .type_ids
            .get(self.config.type_code_for(category))
            .copied();

        let mut attributes = BTreeMap::new();
        for (column, code) in LEGACY_COLUMNS {
            let Some(raw) = row.get(*column).filter(|raw| !is_blank(raw)) else {
                continue;
            };
            let value = catalog
                .data_types
                .get(*code)
                .and_then(|data_type| AttributeValue::parse(*data_type, raw).ok())
                .or_else(|| AttributeValue::infer(raw));
            if let Some(value) = value {
                attributes.insert(code.to_string(), value);
            }
        }

        let created_at = timestamp(row, "created_at").unwrap_or_default();
        let updated_at = timestamp(row, "updated_at").unwrap_or(created_at);

        Some(ChannelRecord {
            id,
            channel_type_id,
            name,
            attributes,
            is_active: row.get("is_active").and_then(Value::as_bool).unwrap_or(true),
            created_at,
            updated_at,
            source: RecordSource::Legacy,
        })
    }
}

fn timestamp(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    row.get(column)
        .and_then(|raw| DateTime::<Utc>::deserialize(raw).ok())
}

impl ChannelRecordReader for LegacyChannels {
    fn source(&self) -> RecordSource {
        RecordSource::Legacy
    }

    fn fetch(&self, id: i64) -> CatalogResult<Option<ChannelRecord>> {
        let Some(row) = self.store.get(Table::CampaignChannels, id)? else {
            return Ok(None);
        };
        let catalog = self.catalog()?;
        Ok(self.reconstruct(&row, &catalog))
    }

    fn fetch_all(&self) -> CatalogResult<Vec<ChannelRecord>> {
        let rows = self.store.scan(Table::CampaignChannels)?;
        let catalog = self.catalog()?;
        Ok(rows
            .iter()
            .filter_map(|row| self.reconstruct(row, &catalog))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::{MemoryRowStore, WriteBatch};

    fn object(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn seeded() -> Arc<dyn RowStore> {
        let store: Arc<dyn RowStore> = Arc::new(MemoryRowStore::new());
        let mut batch = WriteBatch::new();
        batch
            .insert(
                Table::ChannelTypes,
                object(json!({"code": "platform_service", "name": "Platform", "display_order": 1})),
            )
            .insert(
                Table::ChannelTypes,
                object(json!({"code": "community", "name": "Community", "display_order": 2})),
            )
            .insert(
                Table::Attributes,
                object(json!({"code": "url", "name": "URL", "data_type": "url", "display_order": 1})),
            )
            .insert(
                Table::Attributes,
                object(json!({"code": "member_count", "name": "Members", "data_type": "number", "display_order": 2})),
            )
            .insert(
                Table::CampaignChannels,
                object(json!({
                    "name": "Old forum",
                    "category": "forum",
                    "url": "https://forum.example.com",
                    "member_count": 1500,
                    "avg_daily_views": 320,
                    "description": "",
                    "is_active": false,
                    "created_at": "2023-05-01T09:00:00Z"
                })),
            );
        store.apply(batch).unwrap();
        store
    }

    #[test]
    fn test_columns_map_onto_attribute_codes() {
        let legacy = LegacyChannels::new(seeded(), LegacyConfig::default());
        let record = legacy.fetch(1).unwrap().unwrap();

        assert!(record.is_legacy());
        assert_eq!(record.name, "Old forum");
        assert!(!record.is_active);
        assert_eq!(
            record.attributes["url"],
            AttributeValue::Url("https://forum.example.com".into())
        );
        assert_eq!(record.attributes["member_count"].to_plain(), json!(1500));
        assert_eq!(record.attributes["view_count"].to_plain(), json!(320));
        assert!(!record.attributes.contains_key("description"));
        assert_eq!(record.updated_at, record.created_at);
    }

    #[test]
    fn test_category_mapping() {
        let legacy = LegacyChannels::new(seeded(), LegacyConfig::default());
        assert_eq!(legacy.fetch(1).unwrap().unwrap().channel_type_id, Some(1));

        let mut config = LegacyConfig::default();
        config
            .category_types
            .insert("forum".to_string(), "community".to_string());
        let legacy = LegacyChannels::new(seeded(), config);
        assert_eq!(legacy.fetch(1).unwrap().unwrap().channel_type_id, Some(2));

        let config = LegacyConfig {
            default_type_code: "missing".into(),
            category_types: BTreeMap::new(),
        };
        let legacy = LegacyChannels::new(seeded(), config);
        assert_eq!(legacy.fetch(1).unwrap().unwrap().channel_type_id, None);
    }

    #[test]
    fn test_absent_row() {
        let legacy = LegacyChannels::new(seeded(), LegacyConfig::default());
        assert!(legacy.fetch(9).unwrap().is_none());
        assert_eq!(legacy.fetch_all().unwrap().len(), 1);
    }
}
