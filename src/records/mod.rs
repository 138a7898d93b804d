//! Channel record storage
//!
//! Two physical shapes hold channel records:
//!
//! - `channels`: attribute map keyed by code, references a channel type
//! - `campaign_channels`: fixed named columns and a free-form category
//!
//! Each shape sits behind the [`ChannelRecordReader`] port.
//! [`ChannelStore`] is the single logical interface: it writes only to the
//! attribute-map table and falls back to the fixed-column table on reads.

mod adapter;
mod current;
mod legacy;

pub use adapter::{ChannelFilter, ChannelStore, ChannelUpdate, NewChannel};
pub use current::CurrentChannels;
pub use legacy::{LegacyChannels, LegacyConfig, LEGACY_COLUMNS};

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::CatalogResult;
use crate::model::{AttributeValue, ChannelRecord, RecordSource};

/// Read side of a physical record shape
pub trait ChannelRecordReader: Send + Sync {
    /// Which shape this reader serves
    fn source(&self) -> RecordSource;

    fn fetch(&self, id: i64) -> CatalogResult<Option<ChannelRecord>>;

    fn fetch_all(&self) -> CatalogResult<Vec<ChannelRecord>>;
}

/// Write side. Only the attribute-map shape implements this.
pub trait ChannelRecordWriter: ChannelRecordReader {
    /// Stores a new record and returns its id. `record.id` is ignored.
    fn insert(&self, record: &ChannelRecord) -> CatalogResult<i64>;

    /// Replaces an existing record. `NotFound` if it is gone.
    fn replace(&self, record: &ChannelRecord) -> CatalogResult<()>;

    fn remove(&self, id: i64) -> CatalogResult<()>;
}

/// Plain JSON view of an attribute map
pub fn plain_attributes(attributes: &BTreeMap<String, AttributeValue>) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(code, value)| (code.clone(), value.to_plain()))
        .collect()
}
