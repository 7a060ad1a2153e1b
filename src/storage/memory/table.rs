// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::*;
use crate::array::DataChunk;
use crate::storage::Table;
use crate::types::RowId;

/// A table in in-memory engine. This struct can be freely cloned, as it
/// only serves as a reference to a table.
#[derive(Clone)]
pub struct InMemoryTable {
    pub(super) table_id: TableId,
    pub(super) columns: Arc<[ColumnCatalog]>,
    pub(super) inner: Arc<RwLock<InMemoryTableInner>>,
}

pub(super) struct InMemoryTableInner {
    pub(super) chunks: Arc<Vec<DataChunk>>,
    pub(super) next_row_id: RowId,
}

impl InMemoryTable {
    pub fn new(table_id: TableId, columns: &[ColumnCatalog]) -> Self {
        Self {
            table_id,
            columns: columns.into(),
            inner: Arc::new(RwLock::new(InMemoryTableInner {
                chunks: Arc::new(vec![]),
                next_row_id: 1,
            })),
        }
    }
}

#[async_trait]
impl Table for InMemoryTable {
    type Transaction = InMemoryTransaction;

    fn table_id(&self) -> TableId {
        self.table_id
    }

    async fn write(&self) -> StorageResult<InMemoryTransaction> {
        Ok(InMemoryTransaction::start(self))
    }

    async fn read(&self) -> StorageResult<InMemoryTransaction> {
        Ok(InMemoryTransaction::start(self))
    }
}
