//! Row store port for the channel registry
//!
//! The relational backend is treated as an opaque transactional row store:
//! rows are JSON objects addressed by `(table, id)`, UNIQUE constraints are
//! enforced by the store, and multi-row writes go through an atomic
//! [`WriteBatch`].
//!
//! # Guarantees
//!
//! - A batch is all-or-nothing and invisible to readers until complete
//! - Guards inside a batch are evaluated in the same critical section as
//!   the writes that follow them
//! - `read_tables` returns one consistent snapshot across several tables

mod errors;
mod file;
mod memory;
mod state;
mod table;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

pub use errors::{StoreError, StoreResult};
pub use file::FileRowStore;
pub use memory::MemoryRowStore;
pub use table::Table;

/// A stored row. The store owns the `id` column.
pub type Row = Map<String, Value>;

/// Precondition checked atomically with the rest of a batch
#[derive(Debug, Clone)]
pub enum Guard {
    /// Fails with `MissingRow` unless the row exists
    Exists { table: Table, id: i64 },
    /// Fails with `Referenced` if any row of `by` has `column == id`
    Unreferenced {
        table: Table,
        id: i64,
        by: Table,
        column: &'static str,
    },
}

/// A single write inside a batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    Insert { table: Table, row: Row },
    /// Full replacement of an existing row
    Update { table: Table, id: i64, row: Row },
    /// Merge of the given columns into an existing row
    Patch { table: Table, id: i64, fields: Row },
    Delete { table: Table, id: i64 },
    Expect(Guard),
}

/// Ordered, atomic group of writes
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table, row: Row) -> &mut Self {
        self.ops.push(WriteOp::Insert { table, row });
        self
    }

    pub fn update(&mut self, table: Table, id: i64, row: Row) -> &mut Self {
        self.ops.push(WriteOp::Update { table, id, row });
        self
    }

    pub fn patch(&mut self, table: Table, id: i64, fields: Row) -> &mut Self {
        self.ops.push(WriteOp::Patch { table, id, fields });
        self
    }

    pub fn delete(&mut self, table: Table, id: i64) -> &mut Self {
        self.ops.push(WriteOp::Delete { table, id });
        self
    }

    pub fn expect_exists(&mut self, table: Table, id: i64) -> &mut Self {
        self.ops.push(WriteOp::Expect(Guard::Exists { table, id }));
        self
    }

    pub fn expect_unreferenced(
        &mut self,
        table: Table,
        id: i64,
        by: Table,
        column: &'static str,
    ) -> &mut Self {
        self.ops.push(WriteOp::Expect(Guard::Unreferenced {
            table,
            id,
            by,
            column,
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Consistent read of several tables
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    tables: BTreeMap<Table, Vec<Row>>,
}

impl Snapshot {
    pub fn rows(&self, table: Table) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn insert(&mut self, table: Table, rows: Vec<Row>) {
        self.tables.insert(table, rows);
    }
}

/// Transactional row store
pub trait RowStore: Send + Sync {
    /// Reads a single row
    fn get(&self, table: Table, id: i64) -> StoreResult<Option<Row>>;

    /// Reads all rows of a table, ordered by id
    fn scan(&self, table: Table) -> StoreResult<Vec<Row>>;

    /// Reads several tables under one lock
    fn read_tables(&self, tables: &[Table]) -> StoreResult<Snapshot>;

    /// Applies a batch atomically, returning the ids of inserted rows
    fn apply(&self, batch: WriteBatch) -> StoreResult<Vec<i64>>;
}

/// Builds a row from a serializable value.
pub fn to_row<T: serde::Serialize>(value: &T) -> StoreResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Corrupted(format!(
            "expected an object row, got {}",
            other
        ))),
    }
}

/// Decodes a row into a typed value.
pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
