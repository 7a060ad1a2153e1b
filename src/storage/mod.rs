// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Storage engines.
//!
//! Two engines share the [`Storage`], [`Table`] and [`Transaction`] traits:
//!
//! * [`InMemoryStorage`] keeps everything in memory and is lost on exit.
//! * [`DiskStorage`] persists every committed table version to a directory.
//!
//! Both engines give snapshot isolation: a transaction sees the table as it was when
//! the transaction started, and a commit publishes the new contents in one step.
//! A table's `Int64` primary key column is a serial identifier filled by the engine
//! at commit time; appended chunks carry every other column.

use std::sync::Arc;

use async_trait::async_trait;

use crate::array::{ArrayImpl, DataChunk, I64Array};
use crate::catalog::{ColumnCatalog, RootCatalogRef, TableId};
use crate::types::{DataTypeKind, RowId};

mod disk;
mod error;
mod memory;

pub use self::disk::*;
pub use self::error::*;
pub use self::memory::*;

/// A storage engine.
#[async_trait]
pub trait Storage: Sync + Send + 'static {
    /// Type of the transaction.
    type Transaction: Transaction;

    /// Type of the table belonging to this storage.
    type Table: Table<Transaction = Self::Transaction>;

    /// Create a table and return its id.
    async fn create_table(
        &self,
        table_name: &str,
        column_descs: &[ColumnCatalog],
    ) -> StorageResult<TableId>;

    /// Get a table by id.
    fn get_table(&self, table_id: TableId) -> StorageResult<Self::Table>;

    /// Catalog of all tables in this storage.
    fn catalog(&self) -> &RootCatalogRef;
}

/// A table in the storage engine. [`Table`] is by default a reference to a table,
/// so you could clone it and manipulate in different threads as you like.
#[async_trait]
pub trait Table: Sync + Send + Clone + 'static {
    /// Type of the transaction.
    type Transaction: Transaction;

    /// Get table id.
    fn table_id(&self) -> TableId;

    /// Begin a read-write transaction.
    async fn write(&self) -> StorageResult<Self::Transaction>;

    /// Begin a read-only transaction.
    async fn read(&self) -> StorageResult<Self::Transaction>;
}

/// A transaction on a table.
///
/// A transaction must be finished with [`Transaction::commit`] or
/// [`Transaction::abort`].
#[async_trait]
pub trait Transaction: Sync + Send + 'static {
    /// Type of the table iterator.
    type TxnIteratorType: TxnIterator;

    /// Scan the snapshot of this transaction, selecting the columns at `col_idx`.
    async fn scan(&self, col_idx: &[usize]) -> StorageResult<Self::TxnIteratorType>;

    /// Discard every row visible to this transaction when it commits.
    ///
    /// Chunks appended afterwards become the whole contents of the table.
    async fn truncate(&mut self) -> StorageResult<()>;

    /// Append a chunk of rows. Row identifiers are assigned at commit.
    async fn append(&mut self, chunk: DataChunk) -> StorageResult<()>;

    /// Commit the transaction, returning the number of rows it appended.
    async fn commit(self) -> StorageResult<usize>;

    /// Abort the transaction.
    async fn abort(self) -> StorageResult<()>;
}

/// An iterator over table in a transaction.
#[async_trait]
pub trait TxnIterator: Send {
    /// Get the next batch of the table.
    async fn next_batch(&mut self) -> StorageResult<Option<DataChunk>>;
}

/// Position of the serial identifier column, if the table has one.
fn serial_column(columns: &[ColumnCatalog]) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.is_primary() && c.datatype().kind() == DataTypeKind::Int64)
}

/// Check that `chunk` carries every column of the table except the serial one.
fn check_append(table: TableId, columns: &[ColumnCatalog], chunk: &DataChunk) -> StorageResult<()> {
    let serial = serial_column(columns);
    let expected = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != serial)
        .map(|(_, c)| c);
    if chunk.column_count() != columns.len() - usize::from(serial.is_some()) {
        return Err(StorageError::InvalidChunk {
            table,
            reason: format!(
                "expected {} columns, found {}",
                columns.len() - usize::from(serial.is_some()),
                chunk.column_count()
            ),
        });
    }
    for (array, col) in chunk.arrays().iter().zip(expected) {
        if array.kind() != col.datatype().kind() {
            return Err(StorageError::InvalidChunk {
                table,
                reason: format!(
                    "column {:?} expects {}, found {}",
                    col.name(),
                    col.datatype().kind(),
                    array.kind()
                ),
            });
        }
    }
    Ok(())
}

/// Fill the serial column of each chunk, starting from `next_row_id`.
///
/// Returns the filled chunks and the next unused identifier.
fn assign_row_ids(
    columns: &[ColumnCatalog],
    chunks: Vec<DataChunk>,
    mut next_row_id: RowId,
) -> (Vec<DataChunk>, RowId) {
    let Some(serial) = serial_column(columns) else {
        return (chunks, next_row_id);
    };
    let chunks = chunks
        .into_iter()
        .map(|chunk| {
            let start = next_row_id;
            next_row_id += chunk.cardinality() as RowId;
            let ids: I64Array = (start..next_row_id).collect();
            chunk.with_array_at(serial, ArrayImpl::Int64(ids))
        })
        .collect();
    (chunks, next_row_id)
}

/// Iterates over a snapshot of chunks, projecting the requested columns.
pub struct SnapshotIterator {
    chunks: Arc<Vec<DataChunk>>,
    col_idx: Vec<usize>,
    cnt: usize,
}

impl SnapshotIterator {
    fn new(
        table: TableId,
        columns: &[ColumnCatalog],
        chunks: Arc<Vec<DataChunk>>,
        col_idx: &[usize],
    ) -> StorageResult<Self> {
        if col_idx.is_empty() {
            return Err(StorageError::InvalidChunk {
                table,
                reason: "no column selected".into(),
            });
        }
        if let Some(&idx) = col_idx.iter().find(|&&idx| idx >= columns.len()) {
            return Err(StorageError::InvalidColumn(idx));
        }
        Ok(Self {
            chunks,
            col_idx: col_idx.to_vec(),
            cnt: 0,
        })
    }
}

#[async_trait]
impl TxnIterator for SnapshotIterator {
    async fn next_batch(&mut self) -> StorageResult<Option<DataChunk>> {
        let Some(chunk) = self.chunks.get(self.cnt) else {
            return Ok(None);
        };
        self.cnt += 1;
        Ok(Some(chunk.project(&self.col_idx)))
    }
}

/// Embeds all storage engines, so that the engine can be picked at runtime.
#[derive(Clone)]
pub enum StorageImpl {
    InMemoryStorage(Arc<InMemoryStorage>),
    DiskStorage(Arc<DiskStorage>),
}

impl StorageImpl {
    pub fn catalog(&self) -> &RootCatalogRef {
        match self {
            Self::InMemoryStorage(s) => s.catalog(),
            Self::DiskStorage(s) => s.catalog(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::catalog::bibliography_columns;

    #[test]
    fn assign_ids_continues_sequence() {
        let columns = bibliography_columns();
        let width = columns.len() - 1;
        let chunk = |rows: usize| -> DataChunk {
            (0..width)
                .map(|_| ArrayImpl::Utf8(std::iter::repeat_n("x", rows).collect()))
                .collect()
        };
        let (chunks, next) = assign_row_ids(&columns, vec![chunk(2), chunk(3)], 10);
        assert_eq!(next, 15);
        let ids: Vec<_> = chunks
            .iter()
            .flat_map(|c| c.array_at(0).as_int64().unwrap().iter())
            .map(|v| *v.unwrap())
            .collect();
        assert_eq!(ids, vec![10, 11, 12, 13, 14]);
        assert_eq!(chunks[0].column_count(), columns.len());
    }

    #[test]
    fn reject_wrong_arity() {
        let columns = bibliography_columns();
        let chunk: DataChunk = [ArrayImpl::Utf8(["x"].into_iter().collect())]
            .into_iter()
            .collect();
        assert!(matches!(
            check_append(0, &columns, &chunk),
            Err(StorageError::InvalidChunk { .. })
        ));
    }
}
