// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Persistence of the table list.
//!
//! The manifest is a single JSON document. It is never edited in place: every update
//! writes a complete new document and renames it over the old one.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::write_atomic;
use crate::catalog::{ColumnCatalog, TableId};
use crate::storage::StorageResult;
use crate::types::RowId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub table_id: TableId,
    pub name: String,
    pub columns: Vec<ColumnCatalog>,
    pub next_row_id: RowId,
    pub epoch: u64,
    /// Data file of the current version, relative to the storage directory.
    pub data_file: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    pub tables: BTreeMap<TableId, TableEntry>,
}

impl ManifestSnapshot {
    pub fn next_table_id(&self) -> TableId {
        self.tables.keys().next_back().map_or(0, |id| id + 1)
    }

    /// Whether `file` is the current data file of any table.
    pub fn references(&self, file: &str) -> bool {
        self.tables
            .values()
            .any(|t| t.data_file.as_deref() == Some(file))
    }
}

/// Handles all reads and writes to a manifest file.
pub struct Manifest {
    path: PathBuf,
    enable_fsync: bool,
    snapshot: ManifestSnapshot,
}

impl Manifest {
    /// Load the manifest at `path`. A missing file is an empty manifest.
    pub async fn open(path: PathBuf, enable_fsync: bool) -> StorageResult<Self> {
        let snapshot = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ManifestSnapshot::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            enable_fsync,
            snapshot,
        })
    }

    pub fn snapshot(&self) -> &ManifestSnapshot {
        &self.snapshot
    }

    /// Persist `snapshot` and make it current. On error the previous snapshot stays
    /// current, both on disk and in memory.
    pub async fn store(&mut self, snapshot: ManifestSnapshot) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        write_atomic(&self.path, &bytes, self.enable_fsync).await?;
        self.snapshot = snapshot;
        Ok(())
    }
}
