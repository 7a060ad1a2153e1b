// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::*;

/// A collection of arrays.
///
/// A chunk is a horizontal subset of a table or a query result. All arrays of a
/// chunk have the same length.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChunk {
    arrays: SmallVec<[ArrayImpl; 16]>,
}

impl FromIterator<ArrayImpl> for DataChunk {
    fn from_iter<I: IntoIterator<Item = ArrayImpl>>(iter: I) -> Self {
        let arrays: SmallVec<[ArrayImpl; 16]> = iter.into_iter().collect();
        assert!(!arrays.is_empty());
        let cardinality = arrays[0].len();
        assert!(
            arrays.iter().map(|a| a.len()).all(|l| l == cardinality),
            "all arrays must have the same length"
        );
        DataChunk { arrays }
    }
}

impl DataChunk {
    /// Return the number of rows in the chunk.
    pub fn cardinality(&self) -> usize {
        self.arrays.first().map_or(0, |a| a.len())
    }

    /// Return the number of columns in the chunk.
    pub fn column_count(&self) -> usize {
        self.arrays.len()
    }

    /// Get the reference of array by index.
    pub fn array_at(&self, idx: usize) -> &ArrayImpl {
        &self.arrays[idx]
    }

    /// Get all arrays.
    pub fn arrays(&self) -> &[ArrayImpl] {
        &self.arrays
    }

    /// Get the values of a row.
    pub fn row(&self, idx: usize) -> Vec<DataValue> {
        self.arrays.iter().map(|a| a.get(idx)).collect()
    }

    /// Iterate over all rows.
    pub fn rows(&self) -> impl Iterator<Item = Vec<DataValue>> + '_ {
        (0..self.cardinality()).map(|i| self.row(i))
    }

    /// Select the arrays at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> Self {
        DataChunk {
            arrays: indices.iter().map(|&i| self.arrays[i].clone()).collect(),
        }
    }

    /// Insert an array so that it becomes the column at `idx`.
    pub fn with_array_at(mut self, idx: usize, array: ArrayImpl) -> Self {
        assert_eq!(array.len(), self.cardinality(), "array length mismatch");
        self.arrays.insert(idx, array);
        self
    }
}

/// Print the chunk as a pretty table.
impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use prettytable::{format, Table};
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for i in 0..self.cardinality() {
            let row = self.arrays.iter().map(|a| a.get_to_string(i)).collect();
            table.add_row(row);
        }
        write!(f, "{}", table)
    }
}
