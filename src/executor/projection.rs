// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::fmt;

use prettytable::{format, Table as PrettyTable};

use super::*;
use crate::array::{Array, DataChunk};
use crate::catalog::{CatalogError, ColumnCatalog, TableCatalogRef};
use crate::storage::{Table, Transaction, TxnIterator};
use crate::types::DataTypeKind;

/// The executor of reading selected columns of every row.
pub struct ProjectionExecutor<T: Table> {
    pub table: T,
    pub catalog: TableCatalogRef,
}

impl<T: Table> ProjectionExecutor<T> {
    /// Read the columns named in `names`, in that order.
    pub async fn execute(&self, names: &[&str]) -> Result<WorkingSet, QueryError> {
        if names.is_empty() {
            return Err(QueryError::NoColumns);
        }
        let mut col_idx = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for &name in names {
            let idx = self
                .catalog
                .get_column_index_by_name(name)
                .ok_or_else(|| CatalogError::NotFound("column", name.into()))?;
            col_idx.push(idx);
            columns.push(self.catalog.all_columns()[idx].clone());
        }

        let txn = self.table.read().await?;
        let chunks = match Self::scan_all(&txn, &col_idx).await {
            Ok(chunks) => chunks,
            Err(e) => {
                txn.abort().await?;
                return Err(e);
            }
        };
        txn.abort().await?;
        Ok(WorkingSet { columns, chunks })
    }

    async fn scan_all(
        txn: &T::Transaction,
        col_idx: &[usize],
    ) -> Result<Vec<DataChunk>, QueryError> {
        let mut iter = txn.scan(col_idx).await?;
        let mut chunks = vec![];
        while let Some(chunk) = iter.next_batch().await? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }
}

/// Rows fetched from the table, restricted to a set of columns.
///
/// Row order follows storage order. The set is read-only once fetched.
///
/// The fetch is unbounded: every projected cell of every row is held in memory,
/// so the footprint grows with rows times projected columns.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkingSet {
    columns: Vec<ColumnCatalog>,
    chunks: Vec<DataChunk>,
}

impl WorkingSet {
    pub fn new(columns: Vec<ColumnCatalog>, chunks: Vec<DataChunk>) -> Self {
        WorkingSet { columns, chunks }
    }

    pub fn cardinality(&self) -> usize {
        self.chunks.iter().map(|c| c.cardinality()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn chunks(&self) -> &[DataChunk] {
        &self.chunks
    }

    /// Iterate over the values of a text column across all rows.
    ///
    /// Returns `None` if the set has no such column or it does not hold text.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>> + '_> {
        let idx = self.columns.iter().position(|c| c.name() == name)?;
        if self.columns[idx].datatype().kind() != DataTypeKind::String {
            return None;
        }
        Some(
            self.chunks
                .iter()
                .filter_map(move |c| c.array_at(idx).as_utf8())
                .flat_map(|a| a.iter()),
        )
    }
}

/// Print the working set as a pretty table.
impl fmt::Display for WorkingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = PrettyTable::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(self.column_names().collect());
        for chunk in &self.chunks {
            for row in chunk.rows() {
                table.add_row(row.iter().map(|v| v.to_string()).collect());
            }
        }
        write!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ArrayImpl;
    use crate::catalog::bibliography_columns;
    use crate::storage::{InMemoryStorage, InMemoryTable, Storage};
    use crate::types::DataValue;

    async fn setup(rows: &[[Option<&str>; 2]]) -> ProjectionExecutor<InMemoryTable> {
        let storage = InMemoryStorage::new();
        let columns = bibliography_columns();
        let id = storage.create_table("t", &columns).await.unwrap();
        let table = storage.get_table(id).unwrap();
        let catalog = storage.catalog().get_table(id).unwrap();

        // Authors and Year filled, every other field NULL
        let year = catalog.get_column_index_by_name("Year").unwrap() - 1;
        let arrays = (0..columns.len() - 1).map(|i| {
            let values = rows.iter().map(|r| match i {
                0 => r[0],
                _ if i == year => r[1],
                _ => None,
            });
            ArrayImpl::Utf8(values.collect())
        });
        let mut txn = table.write().await.unwrap();
        txn.append(arrays.collect()).await.unwrap();
        txn.commit().await.unwrap();
        ProjectionExecutor { table, catalog }
    }

    #[tokio::test]
    async fn project_in_requested_order() {
        let exec = setup(&[[Some("Smith J."), Some("2020")], [None, Some("2021")]]).await;
        let set = exec.execute(&["Year", "Authors", "DOI"]).await.unwrap();
        assert_eq!(set.cardinality(), 2);
        assert_eq!(
            set.column_names().collect::<Vec<_>>(),
            vec!["Year", "Authors", "DOI"]
        );
        let rows: Vec<_> = set.chunks().iter().flat_map(|c| c.rows()).collect();
        assert_eq!(
            rows,
            vec![
                vec!["2020".into(), "Smith J.".into(), DataValue::Null],
                vec!["2021".into(), DataValue::Null, DataValue::Null],
            ]
        );
        let authors: Vec<_> = set.column("Authors").unwrap().collect();
        assert_eq!(authors, vec![Some("Smith J."), None]);
        assert!(set.column("Title").is_none());
    }

    #[tokio::test]
    async fn identifier_is_not_text() {
        let exec = setup(&[[Some("a"), Some("1")]]).await;
        let set = exec.execute(&["id"]).await.unwrap();
        assert_eq!(set.chunks()[0].row(0), vec![DataValue::Int64(1)]);
        assert!(set.column("id").is_none());
    }

    #[tokio::test]
    async fn empty_table() {
        let exec = setup(&[]).await;
        let set = exec.execute(&["Year"]).await.unwrap();
        assert!(set.is_empty());
        assert_eq!(set.column("Year").unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unknown_column() {
        let exec = setup(&[]).await;
        let err = exec.execute(&["Year", "Nope"]).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Catalog(CatalogError::NotFound("column", _))
        ));
        assert!(matches!(
            exec.execute(&[]).await.unwrap_err(),
            QueryError::NoColumns
        ));
    }
}
