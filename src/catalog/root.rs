// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::*;

/// The root of all catalogs.
#[derive(Default)]
pub struct RootCatalog {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    table_idxs: HashMap<String, TableId>,
    tables: HashMap<TableId, TableCatalogRef>,
    next_table_id: TableId,
}

impl RootCatalog {
    pub fn new() -> RootCatalog {
        Self::default()
    }

    pub fn add_table(
        &self,
        name: String,
        columns: Vec<ColumnCatalog>,
    ) -> Result<TableId, CatalogError> {
        let mut inner = self.inner.lock();
        let table_id = inner.next_table_id;
        inner.restore_table(table_id, name, columns)?;
        Ok(table_id)
    }

    /// Register a table under a known id, e.g. when replaying a manifest.
    pub fn restore_table(
        &self,
        table_id: TableId,
        name: String,
        columns: Vec<ColumnCatalog>,
    ) -> Result<(), CatalogError> {
        self.inner.lock().restore_table(table_id, name, columns)
    }

    pub fn get_table_id_by_name(&self, name: &str) -> Option<TableId> {
        self.inner.lock().table_idxs.get(name).cloned()
    }

    pub fn get_table(&self, table_id: TableId) -> Option<TableCatalogRef> {
        self.inner.lock().tables.get(&table_id).cloned()
    }

    pub fn get_table_by_name(&self, name: &str) -> Option<TableCatalogRef> {
        let inner = self.inner.lock();
        let id = inner.table_idxs.get(name)?;
        inner.tables.get(id).cloned()
    }

    /// Number of registered tables.
    pub fn table_count(&self) -> usize {
        self.inner.lock().tables.len()
    }
}

impl Inner {
    fn restore_table(
        &mut self,
        table_id: TableId,
        name: String,
        columns: Vec<ColumnCatalog>,
    ) -> Result<(), CatalogError> {
        if self.table_idxs.contains_key(&name) {
            return Err(CatalogError::Duplicated("table", name));
        }
        if self.tables.contains_key(&table_id) {
            return Err(CatalogError::Duplicated("table", table_id.to_string()));
        }
        let table = TableCatalog::new(table_id, name.clone(), columns)?;
        self.table_idxs.insert(name, table_id);
        self.tables.insert(table_id, Arc::new(table));
        self.next_table_id = self.next_table_id.max(table_id + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_catalog() {
        let catalog = RootCatalog::new();
        let id = catalog
            .add_table(BIBLIOGRAPHY_TABLE.into(), bibliography_columns())
            .unwrap();
        assert_eq!(catalog.get_table_id_by_name(BIBLIOGRAPHY_TABLE), Some(id));
        assert_eq!(catalog.get_table(id).unwrap().name(), BIBLIOGRAPHY_TABLE);

        let err = catalog
            .add_table(BIBLIOGRAPHY_TABLE.into(), bibliography_columns())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicated("table", _)));
        assert_eq!(catalog.table_count(), 1);
    }

    #[test]
    fn restored_ids_are_not_reused() {
        let catalog = RootCatalog::new();
        catalog.restore_table(4, "a".into(), vec![]).unwrap();
        assert_eq!(catalog.add_table("b".into(), vec![]).unwrap(), 5);
    }
}
