// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Logical types of stored values.

use serde::{Deserialize, Serialize};

mod value;

pub use self::value::*;

/// Kind of a column's values.
///
/// Bibliographic fields are kept as opaque text at the storage boundary. The only
/// integer column is the identifier assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataTypeKind {
    Int64,
    String,
}

impl DataTypeKind {
    /// Returns a nullable [`DataType`] of this kind.
    pub const fn nullable(self) -> DataType {
        DataType::new(self, true)
    }

    /// Returns a non-null [`DataType`] of this kind.
    pub const fn not_null(self) -> DataType {
        DataType::new(self, false)
    }
}

impl std::fmt::Display for DataTypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int64 => write!(f, "BIGINT"),
            Self::String => write!(f, "TEXT"),
        }
    }
}

/// Data type with nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub kind: DataTypeKind,
    pub nullable: bool,
}

impl DataType {
    pub const fn new(kind: DataTypeKind, nullable: bool) -> Self {
        DataType { kind, nullable }
    }

    pub const fn kind(&self) -> DataTypeKind {
        self.kind
    }

    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

pub type TableId = u32;
pub type ColumnId = u32;
/// Identifier of a stored row, assigned by the storage engine.
pub type RowId = i64;
