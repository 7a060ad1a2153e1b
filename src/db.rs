// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::array::DataChunk;
use crate::catalog::{
    bibliography_columns, RootCatalogRef, TableCatalogRef, BIBLIOGRAPHY_TABLE, DEFAULT_PROJECTION,
};
use crate::chart::{Chart, ChartKind};
use crate::config::{ConfigError, EngineKind, StoreConfig};
use crate::executor::{
    CopyFromBufferExecutor, CsvOptions, LoadError, ParseError, ParsedUpload, ProjectionExecutor,
    QueryError, ReplaceExecutor, WorkingSet,
};
use crate::storage::{
    DiskStorage, DiskStorageOptions, InMemoryStorage, Storage, StorageError, StorageImpl,
    StorageResult,
};
use crate::types::TableId;

/// Run `$body` with `$s` bound to the concrete engine behind a [`StorageImpl`].
macro_rules! with_storage {
    ($storage:expr, $s:ident => $body:expr) => {
        match $storage {
            StorageImpl::InMemoryStorage($s) => $body,
            StorageImpl::DiskStorage($s) => $body,
        }
    };
}

/// The bibliographic database: one backing table on one storage engine.
///
/// A replace holds the write side of `lock`, readers the read side, so a reader never
/// observes the table while it is being replaced.
pub struct Database {
    storage: StorageImpl,
    table: TableCatalogRef,
    csv: CsvOptions,
    lock: RwLock<()>,
}

impl Database {
    /// Open the database described by `config` and make sure its table exists.
    pub async fn open(config: &StoreConfig) -> Result<Self, Error> {
        config.validate()?;
        let storage = match config.engine {
            EngineKind::Memory => StorageImpl::InMemoryStorage(Arc::new(InMemoryStorage::new())),
            EngineKind::Disk => {
                let storage = DiskStorage::open(config.disk_options()).await?;
                StorageImpl::DiskStorage(Arc::new(storage))
            }
        };
        Self::from_storage(storage, config.csv).await
    }

    /// Create a new in-memory database.
    pub async fn new_in_memory() -> Result<Self, Error> {
        Self::open(&StoreConfig::in_memory()).await
    }

    /// Open a database on disk at `options.path`.
    pub async fn new_on_disk(options: DiskStorageOptions) -> Result<Self, Error> {
        let storage = StorageImpl::DiskStorage(Arc::new(DiskStorage::open(options).await?));
        Self::from_storage(storage, CsvOptions::default()).await
    }

    async fn from_storage(storage: StorageImpl, csv: CsvOptions) -> Result<Self, Error> {
        let table_id = with_storage!(&storage, s => ensure_table(s.as_ref()).await?);
        let table = storage
            .catalog()
            .get_table(table_id)
            .ok_or_else(|| StorageError::not_found("table", table_id))?;
        info!(table = table.name(), id = table_id, "database ready");
        Ok(Database {
            storage,
            table,
            csv,
            lock: RwLock::new(()),
        })
    }

    /// Create the backing table unless it exists. Returns its id.
    pub async fn ensure_table(&self) -> Result<TableId, Error> {
        let id = with_storage!(&self.storage, s => ensure_table(s.as_ref()).await?);
        Ok(id)
    }

    pub fn catalog(&self) -> &RootCatalogRef {
        self.storage.catalog()
    }

    /// Catalog of the backing table.
    pub fn table(&self) -> &TableCatalogRef {
        &self.table
    }

    /// Parse a CSV buffer into chunks of the table's text columns.
    pub fn parse_csv(&self, buf: &[u8]) -> Result<ParsedUpload, Error> {
        let columns: Vec<_> = self
            .table
            .all_columns()
            .iter()
            .filter(|c| !c.is_primary())
            .cloned()
            .collect();
        let parsed = CopyFromBufferExecutor {
            options: self.csv,
            columns: &columns,
        }
        .execute(buf)?;
        debug!(rows = parsed.rows, chunks = parsed.chunks.len(), "parsed upload");
        Ok(parsed)
    }

    /// Replace the contents of the table with `chunks`. Returns the number of rows written.
    pub async fn replace_all(&self, chunks: Vec<DataChunk>) -> Result<usize, Error> {
        let _guard = self.lock.write().await;
        self.replace_locked(chunks).await
    }

    /// Parse a CSV buffer and replace the contents of the table with it.
    pub async fn load_csv(&self, buf: &[u8]) -> Result<usize, Error> {
        let parsed = self.parse_csv(buf)?;
        self.replace_all(parsed.chunks).await
    }

    /// Load a CSV buffer, then read back the default projection of what was stored.
    pub async fn upload(&self, buf: &[u8]) -> Result<UploadSummary, Error> {
        let parsed = self.parse_csv(buf)?;
        let guard = self.lock.write().await;
        let rows_written = self.replace_locked(parsed.chunks).await?;
        let _guard = guard.downgrade();
        let working_set = self.projection_locked(&DEFAULT_PROJECTION).await?;
        Ok(UploadSummary {
            rows_written,
            working_set,
            ignored_columns: parsed.ignored_columns,
            missing_columns: parsed.missing_columns,
        })
    }

    /// Read the columns named in `names` of every row.
    pub async fn fetch_projection(&self, names: &[&str]) -> Result<WorkingSet, Error> {
        let _guard = self.lock.read().await;
        self.projection_locked(names).await
    }

    /// Read the default projection of every row.
    pub async fn records(&self) -> Result<WorkingSet, Error> {
        self.fetch_projection(&DEFAULT_PROJECTION).await
    }

    /// Draw a chart from the current contents of the table.
    pub async fn chart(&self, kind: ChartKind) -> Result<Chart, Error> {
        let set = self.fetch_projection(&[kind.column()]).await?;
        Ok(kind.draw(&set)?)
    }

    /// Release the storage engine. Every commit is already durable.
    pub fn shutdown(self) {
        info!(table = self.table.name(), "database closed");
    }

    async fn replace_locked(&self, chunks: Vec<DataChunk>) -> Result<usize, Error> {
        let id = self.table.id();
        let rows = with_storage!(&self.storage, s => {
            let table = s.get_table(id).map_err(LoadError::from)?;
            ReplaceExecutor { table }.execute(chunks).await?
        });
        Ok(rows)
    }

    async fn projection_locked(&self, names: &[&str]) -> Result<WorkingSet, Error> {
        let id = self.table.id();
        let set = with_storage!(&self.storage, s => {
            let table = s.get_table(id).map_err(QueryError::from)?;
            ProjectionExecutor { table, catalog: self.table.clone() }.execute(names).await?
        });
        debug!(rows = set.cardinality(), columns = names.len(), "fetched projection");
        Ok(set)
    }
}

/// Create the backing table on `storage` unless it exists.
async fn ensure_table<S: Storage>(storage: &S) -> StorageResult<TableId> {
    if let Some(id) = storage.catalog().get_table_id_by_name(BIBLIOGRAPHY_TABLE) {
        return Ok(id);
    }
    match storage
        .create_table(BIBLIOGRAPHY_TABLE, &bibliography_columns())
        .await
    {
        Err(StorageError::Duplicated(..)) => storage
            .catalog()
            .get_table_id_by_name(BIBLIOGRAPHY_TABLE)
            .ok_or_else(|| StorageError::not_found("table", BIBLIOGRAPHY_TABLE)),
        other => other,
    }
}

/// The outcome of an upload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UploadSummary {
    pub rows_written: usize,
    /// The default projection of the table after the load.
    pub working_set: WorkingSet,
    /// Input columns that are not part of a record.
    pub ignored_columns: Vec<String>,
    /// Record fields absent from the input, stored as NULL.
    pub missing_columns: Vec<String>,
}

impl UploadSummary {
    pub fn total_records(&self) -> usize {
        self.working_set.cardinality()
    }

    pub fn available_columns(&self) -> Vec<&str> {
        self.working_set.column_names().collect()
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.working_set)?;
        writeln!(f, "Total records: {}", self.total_records())?;
        writeln!(f, "Available columns: {}", self.available_columns().join(", "))
    }
}

/// The error type of database operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to parse upload: {0}")]
    ParseFailed(#[from] ParseError),
    #[error("failed to load records: {0}")]
    LoadFailed(#[from] LoadError),
    #[error("query failed: {0}")]
    QueryFailed(#[from] QueryError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StoreUnavailable,
    ParseFailed,
    LoadFailed,
    QueryFailed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreUnavailable(_) | Self::Config(_) => ErrorKind::StoreUnavailable,
            Self::ParseFailed(_) => ErrorKind::ParseFailed,
            Self::LoadFailed(_) => ErrorKind::LoadFailed,
            Self::QueryFailed(_) => ErrorKind::QueryFailed,
        }
    }

    /// Whether the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::StoreUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ID_COLUMN, YEAR};
    use crate::types::DataValue;

    #[tokio::test]
    async fn ensure_table_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let id = db.table().id();
        for _ in 0..3 {
            assert_eq!(db.ensure_table().await.unwrap(), id);
        }
        assert_eq!(db.catalog().table_count(), 1);
        assert_eq!(db.table().name(), BIBLIOGRAPHY_TABLE);
    }

    #[tokio::test]
    async fn reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let options = DiskStorageOptions::default_for_test(dir.path().to_path_buf());
        let db = Database::new_on_disk(options.clone()).await.unwrap();
        db.load_csv(b"Year\n2020\n2021\n").await.unwrap();
        db.shutdown();

        let db = Database::new_on_disk(options).await.unwrap();
        assert_eq!(db.records().await.unwrap().cardinality(), 2);
    }

    #[tokio::test]
    async fn upload_summary() {
        let db = Database::new_in_memory().await.unwrap();
        let summary = db
            .upload(b"Authors,Title,Year,Extra\nSmith J.,A,2020,x\nDoe A.,B,2021,y\n")
            .await
            .unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.total_records(), 2);
        assert_eq!(summary.available_columns(), DEFAULT_PROJECTION.to_vec());
        assert_eq!(summary.ignored_columns, vec!["Extra".to_string()]);
        assert!(summary.missing_columns.contains(&"DOI".to_string()));
        let text = summary.to_string();
        assert!(text.contains("Total records: 2"));
        assert!(text.contains("Available columns: Authors, Title, DOI, Year, Source title"));
    }

    #[tokio::test]
    async fn identifiers_continue_across_loads() {
        let db = Database::new_in_memory().await.unwrap();
        db.load_csv(b"Year\n2019\n2020\n").await.unwrap();
        db.load_csv(b"Year\n2021\n").await.unwrap();
        let set = db.fetch_projection(&[ID_COLUMN, YEAR]).await.unwrap();
        let rows: Vec<_> = set.chunks().iter().flat_map(|c| c.rows()).collect();
        assert_eq!(
            rows,
            vec![vec![DataValue::Int64(3), DataValue::from("2021")]]
        );
    }

    #[tokio::test]
    async fn error_kinds() {
        let db = Database::new_in_memory().await.unwrap();
        let err = db.upload(b"").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert!(!err.is_fatal());

        let err = db.replace_all(vec![]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadFailed);

        let err = db.fetch_projection(&["Nope"]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailed);

        let mut config = StoreConfig::in_memory();
        config.database = "no/slashes".into();
        let err = Database::open(&config).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(err.is_fatal());
    }
}
