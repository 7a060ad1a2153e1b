// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::iter::IntoIterator;

use super::{ArrayBuilderImpl, ArrayError, DataChunk};
use crate::types::DataType;

/// Builds [`DataChunk`]s row by row.
///
/// A chunk is emitted every time `capacity` rows have been pushed; the remaining rows
/// can be flushed with [`DataChunkBuilder::take`]. A builder that returned an error
/// holds a partial row and must be discarded.
pub struct DataChunkBuilder {
    types: Vec<DataType>,
    array_builders: Vec<ArrayBuilderImpl>,
    size: usize,
    capacity: usize,
}

impl DataChunkBuilder {
    pub fn new<'a>(data_types: impl IntoIterator<Item = &'a DataType>, capacity: usize) -> Self {
        assert_ne!(capacity, 0);
        let types: Vec<DataType> = data_types.into_iter().copied().collect();
        let array_builders = types
            .iter()
            .map(|ty| ArrayBuilderImpl::with_capacity(capacity, ty))
            .collect();
        DataChunkBuilder {
            types,
            array_builders,
            size: 0,
            capacity,
        }
    }

    /// Push a row of raw strings. `None` stands for NULL.
    pub fn push_str_row<'a>(
        &mut self,
        row: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Result<Option<DataChunk>, ArrayError> {
        let expected = self.types.len();
        let mut found = 0;
        for s in row {
            let Some(builder) = self.array_builders.get_mut(found) else {
                return Err(ArrayError::RowLengthMismatch {
                    expected,
                    found: found + 1,
                });
            };
            builder.push_str(s)?;
            found += 1;
        }
        self.finish_row(found)
    }

    fn finish_row(&mut self, found: usize) -> Result<Option<DataChunk>, ArrayError> {
        if found != self.types.len() {
            return Err(ArrayError::RowLengthMismatch {
                expected: self.types.len(),
                found,
            });
        }
        self.size += 1;
        if self.size == self.capacity {
            Ok(self.take())
        } else {
            Ok(None)
        }
    }

    /// Generate a [`DataChunk`] with the remaining rows.
    ///
    /// If there are no remaining rows, `None` will be returned.
    #[must_use]
    pub fn take(&mut self) -> Option<DataChunk> {
        if self.size == 0 {
            return None;
        }
        let capacity = self.capacity;
        let builders = std::mem::replace(
            &mut self.array_builders,
            self.types
                .iter()
                .map(|ty| ArrayBuilderImpl::with_capacity(capacity, ty))
                .collect(),
        );
        self.size = 0;
        Some(builders.into_iter().map(|b| b.finish()).collect())
    }
}
