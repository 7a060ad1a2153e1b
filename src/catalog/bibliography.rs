// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! The fixed record shape of a bibliometric export.

use super::*;
use crate::types::DataTypeKind;

/// Name of the backing table.
pub const BIBLIOGRAPHY_TABLE: &str = "bibliometric_data";

/// Store-assigned row identifier. Not part of the upload contract.
pub const ID_COLUMN: &str = "id";

pub const AUTHORS: &str = "Authors";
pub const TITLE: &str = "Title";
pub const YEAR: &str = "Year";
pub const SOURCE_TITLE: &str = "Source title";
pub const DOI: &str = "DOI";

/// Text fields of a record, in table order.
pub const BIBLIOGRAPHY_FIELDS: [&str; 46] = [
    AUTHORS,
    "Author full names",
    "Author(s) ID",
    TITLE,
    YEAR,
    SOURCE_TITLE,
    "Volume",
    "Issue",
    "Art. No.",
    "Page start",
    "Page end",
    "Page count",
    "Cited by",
    DOI,
    "Link",
    "Affiliations",
    "Authors with affiliations",
    "Abstract",
    "Author Keywords",
    "Index Keywords",
    "Molecular Sequence Numbers",
    "Chemicals/CAS",
    "Tradenames",
    "Manufacturers",
    "Funding Details",
    "Funding Texts",
    "References",
    "Correspondence Address",
    "Editors",
    "Publisher",
    "Sponsors",
    "Conference name",
    "Conference date",
    "Conference location",
    "Conference code",
    "ISSN",
    "ISBN",
    "CODEN",
    "PubMed ID",
    "Language of Original Document",
    "Abbreviated Source Title",
    "Document Type",
    "Publication Stage",
    "Open Access",
    "Source",
    "EID",
];

/// Fields fetched for rendering after an upload.
pub const DEFAULT_PROJECTION: [&str; 5] = [AUTHORS, TITLE, DOI, YEAR, SOURCE_TITLE];

/// Columns of the backing table: the identifier followed by every text field.
pub fn bibliography_columns() -> Vec<ColumnCatalog> {
    let id = ColumnCatalog::new(
        0,
        DataTypeKind::Int64
            .not_null()
            .to_column_primary_key(ID_COLUMN.into()),
    );
    std::iter::once(id)
        .chain(BIBLIOGRAPHY_FIELDS.iter().zip(1..).map(|(name, id)| {
            ColumnCatalog::new(id, DataTypeKind::String.nullable().to_column(name.to_string()))
        }))
        .collect()
}
