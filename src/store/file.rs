//! Durable row store backed by a checksummed JSON snapshot file.
//!
//! File layout:
//!
//! ```text
//! <crc32 of body, 8 lowercase hex digits>\n
//! <body: JSON-encoded table state>
//! ```
//!
//! The whole state is rewritten after every successful batch through a
//! temporary file and an atomic rename, so a crash leaves either the old or
//! the new snapshot on disk. A checksum mismatch on open is reported as
//! corruption and never repaired silently.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crc32fast::Hasher;

use super::errors::{StoreError, StoreResult};
use super::state::StoreState;
use super::{Row, RowStore, Snapshot, Table, WriteBatch};

/// Row store persisted to a single snapshot file
#[derive(Debug)]
pub struct FileRowStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl FileRowStore {
    /// Opens the snapshot at `path`, or starts empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            read_snapshot(&path)?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            StoreState::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowStore for FileRowStore {
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

        if let Err(e) = write_snapshot(&self.path, &state) {
            state.rollback(applied);
            return Err(e);
        }

        Ok(applied.inserted)
    }
}

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn read_snapshot(path: &Path) -> StoreResult<StoreState> {
    let content = fs::read(path)?;
    let newline = content
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| StoreError::Corrupted(format!("{}: missing checksum header", path.display())))?;

    let header = std::str::from_utf8(&content[..newline])
        .map_err(|_| StoreError::Corrupted(format!("{}: unreadable checksum header", path.display())))?;
    let expected = u32::from_str_radix(header.trim(), 16)
        .map_err(|_| StoreError::Corrupted(format!("{}: malformed checksum '{}'", path.display(), header)))?;

    let body = &content[newline + 1..];
    let actual = compute_checksum(body);
    if actual != expected {
        return Err(StoreError::Corrupted(format!(
            "{}: checksum mismatch (expected {:08x}, got {:08x})",
            path.display(),
            expected,
            actual
        )));
    }

    Ok(serde_json::from_slice(body)?)
}

fn write_snapshot(path: &Path, state: &StoreState) -> StoreResult<()> {
    let body = serde_json::to_vec(state)?;
    let checksum = compute_checksum(&body);

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        writeln!(file, "{:08x}", checksum)?;
        file.write_all(&body)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
