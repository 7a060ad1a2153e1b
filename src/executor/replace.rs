// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use tracing::info;

use super::*;
use crate::array::DataChunk;
use crate::storage::{Table, Transaction};

/// The executor of replacing the whole contents of a table.
///
/// Existing rows are truncated and the new chunks appended in one write transaction,
/// so readers observe either the old contents or the new ones. Nothing is written
/// when `chunks` holds no row.
pub struct ReplaceExecutor<T: Table> {
    pub table: T,
}

impl<T: Table> ReplaceExecutor<T> {
    /// Returns the number of rows written.
    pub async fn execute(self, chunks: Vec<DataChunk>) -> Result<usize, LoadError> {
        if chunks.iter().all(|c| c.cardinality() == 0) {
            return Err(LoadError::Empty);
        }
        let mut txn = self.table.write().await?;
        if let Err(e) = Self::write(&mut txn, chunks).await {
            txn.abort().await?;
            return Err(e);
        }
        let rows = txn.commit().await?;
        info!(table = self.table.table_id(), rows, "replaced table contents");
        Ok(rows)
    }

    async fn write(txn: &mut T::Transaction, chunks: Vec<DataChunk>) -> Result<(), LoadError> {
        txn.truncate().await?;
        for chunk in chunks.into_iter().filter(|c| c.cardinality() > 0) {
            txn.append(chunk).await?;
        }
        Ok(())
    }
}
