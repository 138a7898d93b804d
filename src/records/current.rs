//! Attribute-map channel table. Authoritative for every write.

use std::sync::Arc;

use crate::errors::CatalogResult;
use crate::model::{ChannelRecord, RecordSource};
use crate::store::{from_row, to_row, RowStore, Table, WriteBatch};

use super::{ChannelRecordReader, ChannelRecordWriter};

/// Reads and writes the `channels` relation
#[derive(Clone)]
pub struct CurrentChannels {
    store: Arc<dyn RowStore>,
}

impl CurrentChannels {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }
}

impl ChannelRecordReader for CurrentChannels {
    fn source(&self) -> RecordSource {
        RecordSource::Current
    }

    fn fetch(&self, id: i64) -> CatalogResult<Option<ChannelRecord>> {
        match self.store.get(Table::Channels, id)? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    fn fetch_all(&self) -> CatalogResult<Vec<ChannelRecord>> {
        Ok(self
            .store
            .scan(Table::Channels)?
            .into_iter()
            .map(from_row::<ChannelRecord>)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ChannelRecordWriter for CurrentChannels {
    fn insert(&self, record: &ChannelRecord) -> CatalogResult<i64> {
        let mut batch = WriteBatch::new();
        if let Some(type_id) = record.channel_type_id {
            batch.expect_exists(Table::ChannelTypes, type_id);
        }
        batch.insert(Table::Channels, to_row(record)?);
        Ok(self.store.apply(batch)?[0])
    }

    fn replace(&self, record: &ChannelRecord) -> CatalogResult<()> {
        let mut batch = WriteBatch::new();
        if let Some(type_id) = record.channel_type_id {
            batch.expect_exists(Table::ChannelTypes, type_id);
        }
        batch.update(Table::Channels, record.id, to_row(record)?);
        self.store.apply(batch)?;
        Ok(())
    }

    fn remove(&self, id: i64) -> CatalogResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(Table::Channels, id);
        self.store.apply(batch)?;
        Ok(())
    }
}
