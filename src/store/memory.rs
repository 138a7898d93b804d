//! Volatile row store, used for tests and for deployments without `data_file`.

use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::state::StoreState;
use super::{Row, RowStore, Snapshot, Table, WriteBatch};

/// In-memory row store
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    state: RwLock<StoreState>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowStore for MemoryRowStore {
    fn get(&self, table: Table, id: i64) -> StoreResult<Option<Row>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.get(table, id))
    }

    fn scan(&self, table: Table) -> StoreResult<Vec<Row>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.scan(table))
    }

    fn read_tables(&self, tables: &[Table]) -> StoreResult<Snapshot> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut snapshot = Snapshot::default();
        for table in tables {
            snapshot.insert(*table, state.scan(*table));
        }
        Ok(snapshot)
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<Vec<i64>> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let applied = state.apply(batch)?;
        Ok(applied.inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_reads_several_tables() {
        let store = MemoryRowStore::new();
        let mut batch = WriteBatch::new();
        batch.insert(
            Table::ChannelTypes,
            json!({"code": "discord"}).as_object().cloned().unwrap(),
        );
        batch.insert(
            Table::Attributes,
            json!({"code": "url"}).as_object().cloned().unwrap(),
        );
        store.apply(batch).unwrap();

        let snapshot = store
            .read_tables(&[Table::ChannelTypes, Table::Attributes, Table::Channels])
            .unwrap();
        assert_eq!(snapshot.rows(Table::ChannelTypes).len(), 1);
        assert_eq!(snapshot.rows(Table::Attributes).len(), 1);
        assert!(snapshot.rows(Table::Channels).is_empty());
        assert!(snapshot.rows(Table::CampaignChannels).is_empty());
    }

    #[test]
    fn test_missing_row_is_none() {
        let store = MemoryRowStore::new();
        assert!(store.get(Table::Channels, 42).unwrap().is_none());
    }
}
