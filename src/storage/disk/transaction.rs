// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::*;
use crate::storage::{
    assign_row_ids, check_append, SnapshotIterator, StorageResult, Transaction,
};

/// A transaction running on `DiskStorage`.
pub struct DiskTransaction {
    /// If dropped without committing or aborting, a warning is logged.
    finished: bool,

    /// Whether the rows of `snapshot` are discarded on commit.
    truncated: bool,

    /// Includes all to-be-committed data.
    buffer: Vec<DataChunk>,

    /// Version of the table when the transaction started.
    snapshot: Arc<Vec<DataChunk>>,

    table: DiskTable,
}

impl DiskTransaction {
    pub(super) fn start(table: &DiskTable) -> Self {
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
impl Transaction for DiskTransaction {
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
        let shared = self.table.shared.clone();
        let table_id = self.table.table_id;
        let buffer = std::mem::take(&mut self.buffer);
        let appended = buffer.iter().map(|c| c.cardinality()).sum();

        let mut manifest = shared.manifest.lock().await;
        let (base, next_row_id, epoch, old_file) = {
            let inner = self.table.inner.read();
            (
                inner.chunks.clone(),
                inner.next_row_id,
                inner.epoch,
                inner.data_file.clone(),
            )
        };
        let (chunks, next_row_id) = assign_row_ids(&self.table.columns, buffer, next_row_id);
        let chunks: Vec<DataChunk> = if self.truncated {
            chunks
        } else {
            base.iter().cloned().chain(chunks).collect()
        };

        let epoch = epoch + 1;
        let data_file = data_file_name(table_id, epoch);
        let data_path = shared.options.path.join(&data_file);
        write_data_file(&data_path, &chunks, shared.options.enable_fsync).await?;

        let mut snapshot = manifest.snapshot().clone();
        let entry = snapshot
            .tables
            .get_mut(&table_id)
            .ok_or_else(|| StorageError::not_found("table", table_id))?;
        entry.next_row_id = next_row_id;
        entry.epoch = epoch;
        entry.data_file = Some(data_file);
        if let Err(e) = manifest.store(snapshot).await {
            fs::remove_file(&data_path).await.ok();
            return Err(e);
        }

        {
            let mut inner = self.table.inner.write();
            inner.chunks = Arc::new(chunks);
            inner.next_row_id = next_row_id;
            inner.epoch = epoch;
            inner.data_file = manifest.snapshot().tables[&table_id].data_file.clone();
        }
        drop(manifest);

        if let Some(old_file) = old_file {
            if let Err(e) = fs::remove_file(shared.options.path.join(&old_file)).await {
                warn!(file = old_file, error = %e, "failed to remove replaced data file");
            }
        }

        self.finished = true;
        debug!(
            table = table_id,
            epoch,
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

impl Drop for DiskTransaction {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Transaction dropped without committing or aborting");
        }
    }
}
