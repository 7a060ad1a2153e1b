// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::iter::FromIterator;

use bitvec::vec::BitVec;
use serde::{Deserialize, Serialize};

use super::{Array, ArrayBuilder};

/// A collection of variable-length UTF-8 strings.
///
/// Values are stored back to back in `data`; the `i`-th value spans
/// `data[offset[i]..offset[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utf8Array {
    offset: Vec<usize>,
    valid: BitVec,
    data: String,
}

impl Array for Utf8Array {
    type Item = str;
    type Builder = Utf8ArrayBuilder;

    fn get(&self, idx: usize) -> Option<&str> {
        if self.valid[idx] {
            Some(&self.data[self.offset[idx]..self.offset[idx + 1]])
        } else {
            None
        }
    }

    fn len(&self) -> usize {
        self.valid.len()
    }
}

impl<'a> FromIterator<Option<&'a str>> for Utf8Array {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut builder = Utf8ArrayBuilder::with_capacity(iter.size_hint().0);
        for e in iter {
            builder.push(e);
        }
        builder.finish()
    }
}

impl<'a> FromIterator<&'a str> for Utf8Array {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Some).collect()
    }
}

/// A builder that uses `&str` to build an [`Utf8Array`].
pub struct Utf8ArrayBuilder {
    offset: Vec<usize>,
    valid: BitVec,
    data: String,
}

impl ArrayBuilder for Utf8ArrayBuilder {
    type Array = Utf8Array;

    fn with_capacity(capacity: usize) -> Self {
        let mut offset = Vec::with_capacity(capacity + 1);
        offset.push(0);
        Self {
            offset,
            valid: BitVec::with_capacity(capacity),
            // The byte length of values is unknown, so we only reserve one byte per value.
            data: String::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: Option<&str>) {
        self.valid.push(value.is_some());
        if let Some(value) = value {
            self.data.push_str(value);
        }
        self.offset.push(self.data.len());
    }

    fn finish(self) -> Utf8Array {
        Utf8Array {
            offset: self.offset,
            valid: self.valid,
            data: self.data,
        }
    }
}
