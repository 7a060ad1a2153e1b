// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! In-memory storage engine.
//!
//! The in-memory representation of a table is simply a vector of `DataChunk`s behind
//! a lock. A transaction clones the reference to the vector when it starts, which
//! gives snapshot isolation. Writes are buffered until commit, where the whole vector
//! is swapped at once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::{Storage, StorageError, StorageResult};
use crate::catalog::{ColumnCatalog, RootCatalog, RootCatalogRef, TableId};

mod table;
pub use table::InMemoryTable;

mod transaction;
pub use transaction::InMemoryTransaction;

/// In-memory storage.
pub struct InMemoryStorage {
    catalog: RootCatalogRef,
    tables: Mutex<HashMap<TableId, InMemoryTable>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            catalog: Arc::new(RootCatalog::new()),
            tables: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Transaction = InMemoryTransaction;
    type Table = InMemoryTable;

    async fn create_table(
        &self,
        table_name: &str,
        column_descs: &[ColumnCatalog],
    ) -> StorageResult<TableId> {
        if self.catalog.get_table_by_name(table_name).is_some() {
            return Err(StorageError::duplicated("table", table_name));
        }
        let table_id = self
            .catalog
            .add_table(table_name.into(), column_descs.to_vec())?;
        let table = InMemoryTable::new(table_id, column_descs);
        self.tables.lock().insert(table_id, table);
        info!(table = table_name, id = table_id, "created in-memory table");
        Ok(table_id)
    }

    fn get_table(&self, table_id: TableId) -> StorageResult<InMemoryTable> {
        let table = self
            .tables
            .lock()
            .get(&table_id)
            .ok_or_else(|| StorageError::not_found("table", table_id))?
            .clone();
        Ok(table)
    }

    fn catalog(&self) -> &RootCatalogRef {
        &self.catalog
    }
}
