// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Columnar in-memory representation of records.
//!
//! Every column of a [`DataChunk`] is an [`ArrayImpl`]. Bibliographic fields are
//! [`Utf8Array`]s and the store-assigned identifier is an [`I64Array`].

use serde::{Deserialize, Serialize};

use crate::types::{DataType, DataTypeKind, DataValue};

mod data_chunk;
mod data_chunk_builder;
mod primitive_array;
mod utf8_array;

pub use self::data_chunk::*;
pub use self::data_chunk_builder::*;
pub use self::primitive_array::*;
pub use self::utf8_array::*;

/// A trait over all array builders.
///
/// The `push` function always accepts a reference to an element, e.g.
/// `builder.push(Some(&1))` for a [`PrimitiveArray`] or `builder.push(Some("xxx"))`
/// for a [`Utf8Array`].
pub trait ArrayBuilder: Send + Sync + 'static {
    /// Corresponding `Array` of this builder.
    type Array: Array<Builder = Self>;

    /// Create a new builder with `capacity`.
    fn with_capacity(capacity: usize) -> Self;

    /// Append a value to builder.
    fn push(&mut self, value: Option<&<Self::Array as Array>::Item>);

    /// Finish build and return a new array.
    fn finish(self) -> Self::Array;
}

/// A trait over all arrays.
pub trait Array: Sized + Send + Sync + 'static {
    /// Corresponding builder of this array.
    type Builder: ArrayBuilder<Array = Self>;

    /// Type of the item that can be retrieved from the array.
    type Item: ?Sized;

    /// Retrieve a reference to value.
    fn get(&self, idx: usize) -> Option<&Self::Item>;

    /// Number of items of array.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get iterator of current array.
    fn iter(&self) -> ArrayIter<'_, Self> {
        ArrayIter {
            array: self,
            pos: 0,
        }
    }
}

/// An iterator over the elements of an [`Array`].
pub struct ArrayIter<'a, A: Array> {
    array: &'a A,
    pos: usize,
}

impl<'a, A: Array> Iterator for ArrayIter<'a, A> {
    type Item = Option<&'a A::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.array.len() {
            return None;
        }
        let item = self.array.get(self.pos);
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl<A: Array> ExactSizeIterator for ArrayIter<'_, A> {}

/// Errors raised when building arrays from values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArrayError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: DataTypeKind,
        found: DataTypeKind,
    },
    #[error("row length mismatch: expected {expected}, found {found}")]
    RowLengthMismatch { expected: usize, found: usize },
}

/// Embeds all types of arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayImpl {
    Int64(I64Array),
    Utf8(Utf8Array),
}

/// Embeds all types of array builders.
pub enum ArrayBuilderImpl {
    Int64(I64ArrayBuilder),
    Utf8(Utf8ArrayBuilder),
}

impl ArrayImpl {
    /// Number of items of array.
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(a) => a.len(),
            Self::Utf8(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> DataTypeKind {
        match self {
            Self::Int64(_) => DataTypeKind::Int64,
            Self::Utf8(_) => DataTypeKind::String,
        }
    }

    /// Get the value at the given index.
    pub fn get(&self, idx: usize) -> DataValue {
        match self {
            Self::Int64(a) => a.get(idx).map_or(DataValue::Null, |v| DataValue::Int64(*v)),
            Self::Utf8(a) => a.get(idx).into(),
        }
    }

    /// Get the value at the given index, rendered for display.
    pub fn get_to_string(&self, idx: usize) -> String {
        self.get(idx).to_string()
    }

    pub fn as_utf8(&self) -> Option<&Utf8Array> {
        match self {
            Self::Utf8(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_int64(&self) -> Option<&I64Array> {
        match self {
            Self::Int64(a) => Some(a),
            _ => None,
        }
    }
}

impl From<I64Array> for ArrayImpl {
    fn from(array: I64Array) -> Self {
        Self::Int64(array)
    }
}

impl From<Utf8Array> for ArrayImpl {
    fn from(array: Utf8Array) -> Self {
        Self::Utf8(array)
    }
}

impl ArrayBuilderImpl {
    /// Create a new array builder from data type.
    pub fn with_capacity(capacity: usize, ty: &DataType) -> Self {
        match ty.kind() {
            DataTypeKind::Int64 => Self::Int64(I64ArrayBuilder::with_capacity(capacity)),
            DataTypeKind::String => Self::Utf8(Utf8ArrayBuilder::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> DataTypeKind {
        match self {
            Self::Int64(_) => DataTypeKind::Int64,
            Self::Utf8(_) => DataTypeKind::String,
        }
    }

    /// Appends an element in string form. NULL can be pushed into any builder.
    pub fn push_str(&mut self, s: Option<&str>) -> Result<(), ArrayError> {
        match (self, s) {
            (Self::Utf8(b), s) => b.push(s),
            (Self::Int64(b), None) => b.push(None),
            (b, Some(_)) => {
                return Err(ArrayError::TypeMismatch {
                    expected: b.kind(),
                    found: DataTypeKind::String,
                })
            }
        }
        Ok(())
    }

    /// Finish build and return a new array.
    pub fn finish(self) -> ArrayImpl {
        match self {
            Self::Int64(b) => ArrayImpl::Int64(b.finish()),
            Self::Utf8(b) => ArrayImpl::Utf8(b.finish()),
        }
    }
}
