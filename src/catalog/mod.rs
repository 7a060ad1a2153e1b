// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Catalog of the tables known to a storage engine.

use std::sync::Arc;

pub use self::bibliography::*;
pub use self::column::*;
pub use self::root::*;
pub use self::table::*;
pub use crate::types::{ColumnId, TableId};

mod bibliography;
mod column;
mod root;
mod table;

pub type RootCatalogRef = Arc<RootCatalog>;
pub type TableCatalogRef = Arc<TableCatalog>;

/// The error type of catalog operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("duplicated {0}: {1}")]
    Duplicated(&'static str, String),
}
