//! In-memory table state shared by every row store implementation.
//!
//! A batch is applied operation by operation while recording an undo log.
//! If any operation fails the log is replayed backwards, so a batch is either
//! fully visible or not visible at all.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::table::Table;
use super::{Guard, Row, WriteBatch, WriteOp};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoreState {
    tables: BTreeMap<Table, BTreeMap<i64, Row>>,
    next_ids: BTreeMap<Table, i64>,
    #[serde(default)]
    retired_keys: BTreeMap<Table, BTreeSet<String>>,
}

/// Inverse of one applied operation
#[derive(Debug)]
enum Undo {
    Remove(Table, i64),
    Restore(Table, i64, Row),
    Unretire(Table, String),
}

/// Outcome of a successfully applied batch
#[derive(Debug)]
pub(crate) struct Applied {
    /// Ids of inserted rows, in batch order
    pub inserted: Vec<i64>,
    undo: Vec<Undo>,
}

impl StoreState {
    pub fn get(&self, table: Table, id: i64) -> Option<Row> {
        self.tables.get(&table).and_then(|rows| rows.get(&id)).cloned()
    }

    pub fn scan(&self, table: Table) -> Vec<Row> {
        self.tables
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn apply(&mut self, batch: WriteBatch) -> StoreResult<Applied> {
        let mut undo = Vec::new();
        let mut inserted = Vec::new();

        for op in batch.into_ops() {
            match self.apply_op(op, &mut undo) {
                Ok(Some(id)) => inserted.push(id),
                Ok(None) => {}
                Err(e) => {
                    self.rollback_log(undo);
                    return Err(e);
                }
            }
        }

        Ok(Applied { inserted, undo })
    }

    /// Reverts a batch that was applied but could not be made durable.
    pub fn rollback(&mut self, applied: Applied) {
        self.rollback_log(applied.undo);
    }

    fn rollback_log(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Remove(table, id) => {
                    self.rows_mut(table).remove(&id);
                }
                Undo::Restore(table, id, row) => {
                    self.rows_mut(table).insert(id, row);
                }
                Undo::Unretire(table, key) => {
                    if let Some(keys) = self.retired_keys.get_mut(&table) {
                        keys.remove(&key);
                    }
                }
            }
        }
    }

    fn apply_op(&mut self, op: WriteOp, undo: &mut Vec<Undo>) -> StoreResult<Option<i64>> {
        match op {
            WriteOp::Insert { table, mut row } => {
                self.check_unique(table, &row, None)?;
                let id = self.allocate_id(table);
                row.insert("id".to_string(), Value::from(id));
                self.rows_mut(table).insert(id, row);
                undo.push(Undo::Remove(table, id));
                Ok(Some(id))
            }
            WriteOp::Update { table, id, mut row } => {
                let old = self.get(table, id).ok_or(StoreError::MissingRow { table, id })?;
                self.check_unique(table, &row, Some(id))?;
                row.insert("id".to_string(), Value::from(id));
                self.rows_mut(table).insert(id, row);
                undo.push(Undo::Restore(table, id, old));
                Ok(None)
            }
            WriteOp::Patch { table, id, fields } => {
                let old = self.get(table, id).ok_or(StoreError::MissingRow { table, id })?;
                let mut row = old.clone();
                for (key, value) in fields {
                    if key != "id" {
                        row.insert(key, value);
                    }
                }
                self.check_unique(table, &row, Some(id))?;
                self.rows_mut(table).insert(id, row);
                undo.push(Undo::Restore(table, id, old));
                Ok(None)
            }
            WriteOp::Delete { table, id } => {
                let old = self
                    .rows_mut(table)
                    .remove(&id)
                    .ok_or(StoreError::MissingRow { table, id })?;
                if table.retires_unique_keys() {
                    if let Some(key) = table.unique_key(&old) {
                        if self.retired_keys.entry(table).or_default().insert(key.clone()) {
                            undo.push(Undo::Unretire(table, key));
                        }
                    }
                }
                undo.push(Undo::Restore(table, id, old));
                Ok(None)
            }
            WriteOp::Expect(guard) => {
                self.check_guard(&guard)?;
                Ok(None)
            }
        }
    }

    fn check_guard(&self, guard: &Guard) -> StoreResult<()> {
        match guard {
            Guard::Exists { table, id } => {
                if self.get(*table, *id).is_none() {
                    return Err(StoreError::MissingRow { table: *table, id: *id });
                }
            }
            Guard::Unreferenced { table, id, by, column } => {
                let referenced = self
                    .tables
                    .get(by)
                    .map(|rows| {
                        rows.values()
                            .any(|row| row.get(*column).and_then(Value::as_i64) == Some(*id))
                    })
                    .unwrap_or(false);
                if referenced {
                    return Err(StoreError::Referenced {
                        table: *table,
                        id: *id,
                        referenced_by: *by,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_unique(&self, table: Table, row: &Row, own_id: Option<i64>) -> StoreResult<()> {
        let Some(key) = table.unique_key(row) else {
            return Ok(());
        };

        let retired = self
            .retired_keys
            .get(&table)
            .map(|keys| keys.contains(&key))
            .unwrap_or(false);

        let taken = self
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter().any(|(id, other)| {
                    Some(*id) != own_id && table.unique_key(other).as_deref() == Some(key.as_str())
                })
            })
            .unwrap_or(false);

        if retired || taken {
            return Err(StoreError::UniqueViolation { table, key });
        }
        Ok(())
    }

    /// Next id of the table's sequence, never below an id already in use by
    /// any table drawing from it.
    fn allocate_id(&mut self, table: Table) -> i64 {
        let sequence = table.id_sequence();
        let floor = Table::ALL
            .iter()
            .filter(|other| other.id_sequence() == sequence)
            .filter_map(|other| self.tables.get(other).and_then(|rows| rows.keys().next_back()))
            .max()
            .map_or(1, |max| max + 1);
        let next = self.next_ids.entry(sequence).or_insert(1);
        let id = (*next).max(floor);
        *next = id + 1;
        id
    }

    fn rows_mut(&mut self, table: Table) -> &mut BTreeMap<i64, Row> {
        self.tables.entry(table).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, row(json!({"code": "url"})));
        batch.insert(Table::Attributes, row(json!({"code": "email"})));
        let applied = state.apply(batch).unwrap();
        assert_eq!(applied.inserted, vec![1, 2]);
        assert_eq!(state.get(Table::Attributes, 2).unwrap()["code"], "email");
        assert_eq!(state.get(Table::Attributes, 2).unwrap()["id"], 2);
    }

    #[test]
    fn test_channel_tables_never_reuse_each_others_ids() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::CampaignChannels, row(json!({"name": "Old forum"})));
        batch.insert(Table::Channels, row(json!({"name": "Team chat"})));
        batch.insert(Table::CampaignChannels, row(json!({"name": "Old blog"})));
        let applied = state.apply(batch).unwrap();
        assert_eq!(applied.inserted, vec![1, 2, 3]);

        // Other relations keep their own counters
        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, row(json!({"code": "url"})));
        assert_eq!(state.apply(batch).unwrap().inserted, vec![1]);
    }

    #[test]
    fn test_ids_skip_rows_loaded_without_a_counter() {
        let mut state = StoreState::default();
        state
            .rows_mut(Table::CampaignChannels)
            .insert(7, row(json!({"id": 7, "name": "Imported"})));

        let mut batch = WriteBatch::new();
        batch.insert(Table::Channels, row(json!({"name": "Team chat"})));
        assert_eq!(state.apply(batch).unwrap().inserted, vec![8]);
    }

    #[test]
    fn test_failed_batch_leaves_no_trace() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, row(json!({"code": "url"})));
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, row(json!({"code": "email"})));
        batch.patch(Table::Attributes, 1, row(json!({"name": "Link"})));
        batch.insert(Table::Attributes, row(json!({"code": "url"})));
        let err = state.apply(batch).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));

        assert_eq!(state.scan(Table::Attributes).len(), 1);
        assert!(state.get(Table::Attributes, 1).unwrap().get("name").is_none());
    }

    #[test]
    fn test_deleted_codes_stay_retired() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::ChannelTypes, row(json!({"code": "discord"})));
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(Table::ChannelTypes, 1);
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.insert(Table::ChannelTypes, row(json!({"code": "discord"})));
        assert!(matches!(
            state.apply(batch),
            Err(StoreError::UniqueViolation { .. })
        ));
    }

    #[test]
    fn test_binding_keys_are_reusable_after_delete() {
        let mut state = StoreState::default();
        let binding = row(json!({"channel_type_id": 1, "attribute_id": 1}));

        let mut batch = WriteBatch::new();
        batch.insert(Table::TypeAttributeBindings, binding.clone());
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(Table::TypeAttributeBindings, 1);
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.insert(Table::TypeAttributeBindings, binding);
        assert!(state.apply(batch).is_ok());
    }

    #[test]
    fn test_rolled_back_delete_unretires_key() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, row(json!({"code": "memo"})));
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(Table::Attributes, 1);
        let applied = state.apply(batch).unwrap();
        state.rollback(applied);

        assert!(state.get(Table::Attributes, 1).is_some());
        let mut batch = WriteBatch::new();
        batch.update(Table::Attributes, 1, row(json!({"code": "memo", "name": "Memo"})));
        assert!(state.apply(batch).is_ok());
    }

    #[test]
    fn test_unreferenced_guard() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::ChannelTypes, row(json!({"code": "discord"})));
        batch.insert(Table::Channels, row(json!({"channel_type_id": 1, "name": "AI Korea"})));
        state.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.expect_unreferenced(Table::ChannelTypes, 1, Table::Channels, "channel_type_id");
        batch.delete(Table::ChannelTypes, 1);
        assert!(matches!(
            state.apply(batch),
            Err(StoreError::Referenced { referenced_by: Table::Channels, .. })
        ));
        assert!(state.get(Table::ChannelTypes, 1).is_some());
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = StoreState::default();
        let mut batch = WriteBatch::new();
        batch.insert(Table::Attributes, row(json!({"code": "url"})));
        batch.delete(Table::Attributes, 1);
        state.apply(batch).unwrap();

        let bytes = serde_json::to_vec(&state).unwrap();
        let restored: StoreState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(restored, state);
    }
}
