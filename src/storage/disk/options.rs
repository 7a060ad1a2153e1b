// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::path::PathBuf;

/// Options for `DiskStorage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskStorageOptions {
    /// Directory of the storage engine.
    pub path: PathBuf,

    /// Whether to fsync data files and the manifest before publishing them.
    pub enable_fsync: bool,
}

impl DiskStorageOptions {
    pub fn default_for_cli() -> Self {
        Self {
            path: PathBuf::from("bibliolight.db"),
            enable_fsync: true,
        }
    }

    pub fn default_for_test(path: PathBuf) -> Self {
        Self {
            path,
            enable_fsync: false,
        }
    }
}
