//! Relations held by the row store and their constraints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Row;

/// A logical relation in the row store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Attributes,
    ChannelTypes,
    TypeAttributeBindings,
    Channels,
    /// Fixed-column channel table kept for rows that were never migrated
    CampaignChannels,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Attributes,
        Table::ChannelTypes,
        Table::TypeAttributeBindings,
        Table::Channels,
        Table::CampaignChannels,
    ];

    pub fn relation_name(&self) -> &'static str {
        match self {
            Table::Attributes => "attributes",
            Table::ChannelTypes => "channel_types",
            Table::TypeAttributeBindings => "type_attribute_bindings",
            Table::Channels => "channels",
            Table::CampaignChannels => "campaign_channels",
        }
    }

    /// The relation whose id counter this relation draws from.
    ///
    /// Legacy channel rows share the channel sequence, so an id names at most
    /// one channel across both tables.
    pub fn id_sequence(&self) -> Table {
        match self {
            Table::CampaignChannels => Table::Channels,
            other => *other,
        }
    }

    /// Singular entity name used in error messages
    pub fn entity_name(&self) -> &'static str {
        match self {
            Table::Attributes => "attribute",
            Table::ChannelTypes => "channel type",
            Table::TypeAttributeBindings => "binding",
            Table::Channels => "channel",
            Table::CampaignChannels => "legacy channel",
        }
    }

    /// The UNIQUE key of a row, if this relation declares one.
    pub fn unique_key(&self, row: &Row) -> Option<String> {
        match self {
            Table::Attributes | Table::ChannelTypes => {
                row.get("code").and_then(Value::as_str).map(str::to_string)
            }
            Table::TypeAttributeBindings => {
                let type_id = row.get("channel_type_id").and_then(Value::as_i64)?;
                let attribute_id = row.get("attribute_id").and_then(Value::as_i64)?;
                Some(format!("{}:{}", type_id, attribute_id))
            }
            Table::Channels | Table::CampaignChannels => None,
        }
    }

    /// Whether unique keys of deleted rows stay reserved.
    ///
    /// Attribute and channel type codes are never reused so that values stored
    /// under an old code cannot silently pick up a new meaning. Binding keys
    /// are not retired: detaching and re-attaching is an ordinary edit.
    pub fn retires_unique_keys(&self) -> bool {
        matches!(self, Table::Attributes | Table::ChannelTypes)
    }
}
