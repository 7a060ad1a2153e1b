// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;

use super::*;

/// The catalog of a table.
///
/// Columns keep their declaration order; names are matched case-sensitively.
#[derive(Debug, Clone)]
pub struct TableCatalog {
    id: TableId,
    name: String,
    /// Mapping from column names to column ids
    column_idxs: HashMap<String, ColumnId>,
    columns: Vec<ColumnCatalog>,
}

impl TableCatalog {
    pub fn new(
        id: TableId,
        name: String,
        columns: Vec<ColumnCatalog>,
    ) -> Result<TableCatalog, CatalogError> {
        let mut column_idxs = HashMap::with_capacity(columns.len());
        for col in &columns {
            if column_idxs
                .insert(col.name().to_string(), col.id())
                .is_some()
            {
                return Err(CatalogError::Duplicated("column", col.name().into()));
            }
        }
        Ok(TableCatalog {
            id,
            name,
            column_idxs,
            columns,
        })
    }

    /// All columns in declaration order.
    pub fn all_columns(&self) -> &[ColumnCatalog] {
        &self.columns
    }

    pub fn get_column_by_id(&self, id: ColumnId) -> Option<&ColumnCatalog> {
        self.columns.iter().find(|c| c.id() == id)
    }

    pub fn get_column_by_name(&self, name: &str) -> Option<&ColumnCatalog> {
        self.column_idxs
            .get(name)
            .and_then(|&id| self.get_column_by_id(id))
    }

    /// Position of the column in declaration order.
    pub fn get_column_index_by_name(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TableId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataTypeKind;

    #[test]
    fn test_table_catalog() {
        let col0 = ColumnCatalog::new(0, DataTypeKind::Int64.not_null().to_column("a".into()));
        let col1 = ColumnCatalog::new(1, DataTypeKind::String.nullable().to_column("B".into()));
        let table_catalog = TableCatalog::new(0, "t".into(), vec![col0, col1]).unwrap();

        assert!(table_catalog.get_column_by_name("c").is_none());
        assert_eq!(table_catalog.get_column_by_name("a").unwrap().id(), 0);
        assert!(table_catalog.get_column_by_name("b").is_none());
        assert_eq!(table_catalog.get_column_index_by_name("B"), Some(1));

        let col1_catalog = table_catalog.get_column_by_id(1).unwrap();
        assert_eq!(col1_catalog.name(), "B");
        assert_eq!(col1_catalog.datatype().kind(), DataTypeKind::String);
    }

    #[test]
    fn duplicated_column() {
        let col = ColumnCatalog::new(0, DataTypeKind::String.nullable().to_column("a".into()));
        let err = TableCatalog::new(0, "t".into(), vec![col.clone(), col]).unwrap_err();
        assert_eq!(err, CatalogError::Duplicated("column", "a".into()));
    }
}
