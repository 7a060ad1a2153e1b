// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::InMemoryTable;
use crate::array::DataChunk;
use crate::storage::{
    assign_row_ids, check_append, SnapshotIterator, StorageResult, Transaction,
};

/// A transaction running on `InMemoryStorage`.
pub struct InMemoryTransaction {
    /// Indicates whether the transaction is committed or aborted. If
    /// the [`InMemoryTransaction`] object is dropped without finishing,
    /// a warning is logged.
    finished: bool,

    /// Whether the rows of `snapshot` are discarded on commit.
    truncated: bool,

    /// Includes all to-be-committed data.
    buffer: Vec<DataChunk>,

    /// When transaction is started, reference to all data chunks will
    /// be cached in `snapshot` to provide snapshot isolation.
    snapshot: Arc<Vec<DataChunk>>,

    /// Reference to the table.
    table: InMemoryTable,
}

impl InMemoryTransaction {
    pub(super) fn start(table: &InMemoryTable) -> Self {
        let snapshot = table.inner.read().chunks.clone();
        Self {
            finished: false,
            truncated: false,
            buffer: vec![],
            snapshot,
            table: table.clone(),
        }
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    type TxnIteratorType = SnapshotIterator;

    async fn scan(&self, col_idx: &[usize]) -> StorageResult<SnapshotIterator> {
        SnapshotIterator::new(
            self.table.table_id,
            &self.table.columns,
            self.snapshot.clone(),
            col_idx,
        )
    }

    async fn truncate(&mut self) -> StorageResult<()> {
        self.truncated = true;
        self.buffer.clear();
        Ok(())
    }

    async fn append(&mut self, chunk: DataChunk) -> StorageResult<()> {
        check_append(self.table.table_id, &self.table.columns, &chunk)?;
        self.buffer.push(chunk);
        Ok(())
    }

    async fn commit(mut self) -> StorageResult<usize> {
        let buffer = std::mem::take(&mut self.buffer);
        let appended = buffer.iter().map(|c| c.cardinality()).sum();
        let mut inner = self.table.inner.write();
        let (chunks, next_row_id) = assign_row_ids(&self.table.columns, buffer, inner.next_row_id);
        if self.truncated {
            inner.chunks = Arc::new(chunks);
        } else {
            Arc::make_mut(&mut inner.chunks).extend(chunks);
        }
        inner.next_row_id = next_row_id;
        drop(inner);

        self.finished = true;
        debug!(
            table = self.table.table_id,
            appended,
            truncated = self.truncated,
            "committed"
        );
        Ok(appended)
    }

    async fn abort(mut self) -> StorageResult<()> {
        self.finished = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Transaction dropped without committing or aborting");
        }
    }
}
