// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::*;
use crate::array::{DataChunk, DataChunkBuilder};
use crate::catalog::ColumnCatalog;
use crate::types::DataType;

/// Dialect of an uploaded CSV buffer. The first row is always the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    pub delimiter: char,
    pub quote: char,
    pub escape: Option<char>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            escape: None,
        }
    }
}

impl CsvOptions {
    /// Check that every special character is a distinct ASCII character.
    pub fn validate(&self) -> Result<(), String> {
        let chars = [Some(self.delimiter), Some(self.quote), self.escape];
        if let Some(c) = chars.iter().flatten().find(|c| !c.is_ascii()) {
            return Err(format!("{c:?} is not an ASCII character"));
        }
        if !chars.iter().flatten().all_unique() {
            return Err("delimiter, quote and escape must differ".into());
        }
        Ok(())
    }
}

/// Records parsed from an upload, shaped like the target columns.
#[derive(Debug, Default)]
pub struct ParsedUpload {
    pub chunks: Vec<DataChunk>,
    pub rows: usize,
    /// Input columns with no target column, in input order.
    pub ignored_columns: Vec<String>,
    /// Target columns absent from the input. They are stored as NULL.
    pub missing_columns: Vec<String>,
}

/// The executor of parsing an uploaded CSV buffer.
///
/// Header names are matched case-sensitively against `columns`. When a name repeats,
/// the first occurrence wins. Empty cells are kept as empty strings.
pub struct CopyFromBufferExecutor<'a> {
    pub options: CsvOptions,
    /// Target columns, in the order of the produced chunks.
    pub columns: &'a [ColumnCatalog],
}

impl CopyFromBufferExecutor<'_> {
    pub fn execute(&self, buf: &[u8]) -> Result<ParsedUpload, ParseError> {
        self.options.validate().map_err(ParseError::InvalidFormat)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter as u8)
            .quote(self.options.quote as u8)
            .escape(self.options.escape.map(|c| c as u8))
            .has_headers(true)
            .flexible(true)
            .from_reader(buf);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| match i {
                // exports often start with a byte order mark
                0 => name.trim_start_matches('\u{feff}').to_string(),
                _ => name.to_string(),
            })
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(ParseError::MissingHeader);
        }

        let positions: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|col| headers.iter().position(|h| h == col.name()))
            .collect();
        let ignored_columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !positions.contains(&Some(*i)))
            .map(|(_, h)| h.clone())
            .collect();
        let missing_columns: Vec<String> = self
            .columns
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(col, _)| col.name().to_string())
            .collect();
        if !ignored_columns.is_empty() {
            debug!(columns = ?ignored_columns, "ignoring unknown input columns");
        }

        let types: Vec<DataType> = self.columns.iter().map(|c| c.datatype()).collect();
        let mut builder = DataChunkBuilder::new(&types, PROCESSING_WINDOW_SIZE);
        let mut chunks = vec![];
        let mut rows = 0;
        for record in reader.records() {
            let record = record?;
            // missing trailing fields read as NULL; a trailing delimiter adds one empty field
            let trailing_delimiter =
                record.len() == headers.len() + 1 && record.get(headers.len()) == Some("");
            if record.len() > headers.len() && !trailing_delimiter {
                return Err(ParseError::LengthMismatch {
                    line: record.position().map_or(0, |p| p.line()),
                    expected: headers.len(),
                    actual: record.len(),
                });
            }
            let row = positions.iter().map(|pos| pos.and_then(|i| record.get(i)));
            if let Some(chunk) = builder.push_str_row(row)? {
                chunks.push(chunk);
            }
            rows += 1;
        }
        chunks.extend(builder.take());
        if rows == 0 {
            return Err(ParseError::NoRecords);
        }

        Ok(ParsedUpload {
            chunks,
            rows,
            ignored_columns,
            missing_columns,
        })
    }
}
