// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use crate::array::ArrayError;
use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Errors of turning an uploaded buffer into records.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid csv format: {0}")]
    InvalidFormat(String),
    #[error("the input has no header row")]
    MissingHeader,
    #[error("the input has no data rows")]
    NoRecords,
    #[error("record on line {line}: expected {expected} fields but got {actual}")]
    LengthMismatch {
        line: u64,
        expected: usize,
        actual: usize,
    },
    #[error("array error: {0}")]
    Array(#[from] ArrayError),
}

/// Errors of replacing the table contents.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("nothing to load")]
    Empty,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors of reading and aggregating records.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("no column selected")]
    NoColumns,
    #[error("column {0:?} is not a text column")]
    NotText(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
