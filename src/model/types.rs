//! Catalog entities and channel records.
//!
//! Field names follow the persisted relations (`snake_case` rows). The HTTP
//! layer has its own camelCase views.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value::AttributeValue;

/// Closed set of attribute data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
    Date,
    Boolean,
    Url,
    Email,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::Text,
        DataType::Number,
        DataType::Date,
        DataType::Boolean,
        DataType::Url,
        DataType::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Url => "url",
            DataType::Email => "email",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown data type '{}'", s))
    }
}

/// Globally scoped, typed field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: i64,
    /// Immutable storage key inside every record's attribute map
    pub code: String,
    /// Display name
    pub name: String,
    pub data_type: DataType,
    pub display_order: i32,
}

/// A category of channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelType {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub display_order: i32,
}

/// "This attribute applies to this channel type"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAttributeBinding {
    pub id: i64,
    pub channel_type_id: i64,
    pub attribute_id: i64,
    pub is_required: bool,
    /// Position within the owning type
    pub display_order: i32,
}

/// Where a record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// The attribute-map table; authoritative
    Current,
    /// Reconstructed from the fixed-column table; best effort
    Legacy,
}

/// A channel conforming (at write time) to its type's schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: i64,
    /// `None` only for legacy rows whose category maps to no known type
    pub channel_type_id: Option<i64>,
    pub name: String,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip, default = "default_source")]
    pub source: RecordSource,
}

fn default_source() -> RecordSource {
    RecordSource::Current
}

impl ChannelRecord {
    pub fn is_legacy(&self) -> bool {
        self.source == RecordSource::Legacy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_names_round_trip() {
        for data_type in DataType::ALL {
            assert_eq!(data_type.as_str().parse::<DataType>().unwrap(), data_type);
            assert_eq!(
                serde_json::to_value(data_type).unwrap(),
                serde_json::Value::from(data_type.as_str())
            );
        }
        assert!("json".parse::<DataType>().is_err());
    }

    #[test]
    fn test_source_is_not_persisted() {
        let record = ChannelRecord {
            id: 1,
            channel_type_id: Some(1),
            name: "AI Korea".into(),
            attributes: BTreeMap::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            source: RecordSource::Legacy,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("source").is_none());

        let decoded: ChannelRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.source, RecordSource::Current);
    }
}
