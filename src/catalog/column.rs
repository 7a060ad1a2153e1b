// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use serde::{Deserialize, Serialize};

use super::*;
use crate::types::DataType;

/// A descriptor of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    datatype: DataType,
    name: String,
    is_primary: bool,
}

impl ColumnDesc {
    pub fn new(datatype: DataType, name: String, is_primary: bool) -> Self {
        ColumnDesc {
            datatype,
            name,
            is_primary,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_nullable(&self) -> bool {
        self.datatype.is_nullable()
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl DataType {
    pub fn to_column(self, name: String) -> ColumnDesc {
        ColumnDesc::new(self, name, false)
    }

    pub fn to_column_primary_key(self, name: String) -> ColumnDesc {
        ColumnDesc::new(self, name, true)
    }
}

/// The catalog of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCatalog {
    id: ColumnId,
    desc: ColumnDesc,
}

impl ColumnCatalog {
    pub fn new(id: ColumnId, desc: ColumnDesc) -> ColumnCatalog {
        ColumnCatalog { id, desc }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn datatype(&self) -> DataType {
        self.desc.datatype()
    }

    pub fn is_primary(&self) -> bool {
        self.desc.is_primary()
    }

    pub fn is_nullable(&self) -> bool {
        self.desc.is_nullable()
    }
}
