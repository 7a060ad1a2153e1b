// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::manifest::TableEntry;
use super::*;
use crate::storage::Table;
use crate::types::RowId;

/// A table in disk engine. This struct can be freely cloned, as it only serves as a
/// reference to a table.
#[derive(Clone)]
pub struct DiskTable {
    pub(super) table_id: TableId,
    pub(super) columns: Arc<[ColumnCatalog]>,
    pub(super) inner: Arc<RwLock<DiskTableInner>>,
    pub(super) shared: Arc<Shared>,
}

/// The current version of a table, mirrored from disk.
pub(super) struct DiskTableInner {
    pub(super) chunks: Arc<Vec<DataChunk>>,
    pub(super) next_row_id: RowId,
    pub(super) epoch: u64,
    pub(super) data_file: Option<String>,
}

impl DiskTable {
    pub(super) fn restore(entry: &TableEntry, chunks: Vec<DataChunk>, shared: Arc<Shared>) -> Self {
        Self {
            table_id: entry.table_id,
            columns: entry.columns.clone().into(),
            inner: Arc::new(RwLock::new(DiskTableInner {
                chunks: Arc::new(chunks),
                next_row_id: entry.next_row_id,
                epoch: entry.epoch,
                data_file: entry.data_file.clone(),
            })),
            shared,
        }
    }
}

#[async_trait]
impl Table for DiskTable {
    type Transaction = DiskTransaction;

    fn table_id(&self) -> TableId {
        self.table_id
    }

    async fn write(&self) -> StorageResult<DiskTransaction> {
        Ok(DiskTransaction::start(self))
    }

    async fn read(&self) -> StorageResult<DiskTransaction> {
        Ok(DiskTransaction::start(self))
    }
}
