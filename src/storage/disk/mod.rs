// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Disk storage engine.
//!
//! Every committed version of a table is written as one data file named
//! `<table id>-<epoch>.chunks.json`. The manifest (`manifest.json`) records, for each
//! table, its columns, the next row id, and the data file of the current version.
//!
//! A commit writes the new data file first and then replaces the manifest by renaming
//! a temporary file over it. A crash at any point leaves either the old or the new
//! version visible. Data files that the manifest no longer references are removed
//! after the commit, or on the next open.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{Storage, StorageError, StorageResult};
use crate::array::DataChunk;
use crate::catalog::{ColumnCatalog, RootCatalog, RootCatalogRef, TableId};

mod manifest;
mod options;
mod table;
mod transaction;

use self::manifest::*;
pub use self::options::*;
pub use self::table::*;
pub use self::transaction::*;

const MANIFEST_FILE_NAME: &str = "manifest.json";
const DATA_FILE_SUFFIX: &str = ".chunks.json";
const TEMP_FILE_SUFFIX: &str = ".tmp";

/// State shared by the storage and all of its tables.
pub(super) struct Shared {
    options: DiskStorageOptions,
    /// Serializes manifest updates, and therefore commits.
    manifest: Mutex<Manifest>,
}

/// Disk storage.
pub struct DiskStorage {
    catalog: RootCatalogRef,
    tables: RwLock<HashMap<TableId, DiskTable>>,
    shared: Arc<Shared>,
}

impl DiskStorage {
    /// Open the storage at `options.path`, creating the directory if it does not exist.
    pub async fn open(options: DiskStorageOptions) -> StorageResult<Self> {
        fs::create_dir_all(&options.path).await?;
        let manifest = Manifest::open(
            options.path.join(MANIFEST_FILE_NAME),
            options.enable_fsync,
        )
        .await?;

        let catalog = Arc::new(RootCatalog::new());
        let mut loaded = vec![];
        for entry in manifest.snapshot().tables.values() {
            catalog.restore_table(entry.table_id, entry.name.clone(), entry.columns.clone())?;
            let chunks = match &entry.data_file {
                Some(file) => read_data_file(&options.path.join(file)).await?,
                None => vec![],
            };
            loaded.push((entry.clone(), chunks));
        }
        remove_stale_files(&options.path, manifest.snapshot()).await?;

        let shared = Arc::new(Shared {
            options,
            manifest: Mutex::new(manifest),
        });
        let tables: HashMap<_, _> = loaded
            .into_iter()
            .map(|(entry, chunks)| {
                (
                    entry.table_id,
                    DiskTable::restore(&entry, chunks, shared.clone()),
                )
            })
            .collect();
        info!(
            path = %shared.options.path.display(),
            tables = tables.len(),
            "opened disk storage"
        );
        Ok(DiskStorage {
            catalog,
            tables: RwLock::new(tables),
            shared,
        })
    }
}

#[async_trait]
impl Storage for DiskStorage {
    type Transaction = DiskTransaction;
    type Table = DiskTable;

    async fn create_table(
        &self,
        table_name: &str,
        column_descs: &[ColumnCatalog],
    ) -> StorageResult<TableId> {
        let mut manifest = self.shared.manifest.lock().await;
        if self.catalog.get_table_by_name(table_name).is_some() {
            return Err(StorageError::duplicated("table", table_name));
        }
        let mut snapshot = manifest.snapshot().clone();
        let table_id = snapshot.next_table_id();
        let entry = TableEntry {
            table_id,
            name: table_name.into(),
            columns: column_descs.to_vec(),
            next_row_id: 1,
            epoch: 0,
            data_file: None,
        };
        snapshot.tables.insert(table_id, entry.clone());
        manifest.store(snapshot).await?;
        drop(manifest);

        self.catalog
            .restore_table(table_id, table_name.into(), column_descs.to_vec())?;
        self.tables.write().insert(
            table_id,
            DiskTable::restore(&entry, vec![], self.shared.clone()),
        );
        info!(table = table_name, id = table_id, "created disk table");
        Ok(table_id)
    }

    fn get_table(&self, table_id: TableId) -> StorageResult<DiskTable> {
        let table = self
            .tables
            .read()
            .get(&table_id)
            .ok_or_else(|| StorageError::not_found("table", table_id))?
            .clone();
        Ok(table)
    }

    fn catalog(&self) -> &RootCatalogRef {
        &self.catalog
    }
}

fn data_file_name(table_id: TableId, epoch: u64) -> String {
    format!("{table_id}-{epoch}{DATA_FILE_SUFFIX}")
}

/// Write `bytes` to `path` through a temporary file, so that `path` is either absent,
/// or complete.
async fn write_atomic(path: &Path, bytes: &[u8], enable_fsync: bool) -> StorageResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TEMP_FILE_SUFFIX);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    if enable_fsync {
        file.sync_all().await?;
    } else {
        file.flush().await?;
    }
    drop(file);
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn write_data_file(
    path: &Path,
    chunks: &[DataChunk],
    enable_fsync: bool,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(chunks)?;
    write_atomic(path, &bytes, enable_fsync).await
}

async fn read_data_file(path: &Path) -> StorageResult<Vec<DataChunk>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::not_found("data file", path.display()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Remove data files and temporary files not referenced by the manifest.
async fn remove_stale_files(dir: &Path, snapshot: &ManifestSnapshot) -> StorageResult<()> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let stale = name.ends_with(TEMP_FILE_SUFFIX)
            || (name.ends_with(DATA_FILE_SUFFIX) && !snapshot.references(name));
        if !stale {
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => info!(file = name, "removed stale file"),
            Err(e) => warn!(file = name, error = %e, "failed to remove stale file"),
        }
    }
    Ok(())
}
