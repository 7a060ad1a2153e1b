// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Configuration of the store, supplied before a session starts.

use std::path::PathBuf;

use crate::executor::CsvOptions;
use crate::storage::DiskStorageOptions;

pub const ENV_ENGINE: &str = "BIBLIOLIGHT_ENGINE";
pub const ENV_DATA_DIR: &str = "BIBLIOLIGHT_DATA_DIR";
pub const ENV_DATABASE: &str = "BIBLIOLIGHT_DATABASE";
pub const ENV_FSYNC: &str = "BIBLIOLIGHT_FSYNC";
pub const ENV_CSV_DELIMITER: &str = "BIBLIOLIGHT_CSV_DELIMITER";

/// The storage engine backing a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    Memory,
    #[default]
    Disk,
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            _ => Err("expected `memory` or `disk`".into()),
        }
    }
}

/// Where and how the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub engine: EngineKind,
    /// Root directory of the disk engine.
    pub path: PathBuf,
    /// Name of the database, a subdirectory of `path`.
    pub database: String,
    pub enable_fsync: bool,
    pub csv: CsvOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let disk = DiskStorageOptions::default_for_cli();
        Self {
            engine: EngineKind::Disk,
            path: disk.path,
            database: "bibliometrics".into(),
            enable_fsync: disk.enable_fsync,
            csv: CsvOptions::default(),
        }
    }
}

/// An invalid configuration value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            engine: EngineKind::Memory,
            ..Self::default()
        }
    }

    pub fn default_for_test(path: PathBuf) -> Self {
        let disk = DiskStorageOptions::default_for_test(path);
        Self {
            engine: EngineKind::Disk,
            path: disk.path,
            enable_fsync: disk.enable_fsync,
            ..Self::default()
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration from `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_ENGINE) {
            config.engine = v.parse().map_err(|reason| ConfigError {
                key: ENV_ENGINE,
                value: v.clone(),
                reason,
            })?;
        }
        if let Some(v) = lookup(ENV_DATA_DIR) {
            config.path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DATABASE) {
            config.database = v;
        }
        if let Some(v) = lookup(ENV_FSYNC) {
            config.enable_fsync = match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                _ => {
                    return Err(ConfigError {
                        key: ENV_FSYNC,
                        value: v,
                        reason: "expected a boolean".into(),
                    })
                }
            };
        }
        if let Some(v) = lookup(ENV_CSV_DELIMITER) {
            let mut chars = v.chars();
            config.csv.delimiter = match (chars.next(), chars.next()) {
                (Some('\\'), Some('t')) if v.len() == 2 => '\t',
                (Some(c), None) => c,
                _ => {
                    return Err(ConfigError {
                        key: ENV_CSV_DELIMITER,
                        value: v,
                        reason: "expected a single character".into(),
                    })
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be checked while parsing a single key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_name = !self.database.is_empty()
            && self
                .database
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(ConfigError {
                key: ENV_DATABASE,
                value: self.database.clone(),
                reason: "expected ASCII letters, digits, `_` or `-`".into(),
            });
        }
        self.csv.validate().map_err(|reason| ConfigError {
            key: ENV_CSV_DELIMITER,
            value: self.csv.delimiter.to_string(),
            reason,
        })
    }

    /// Options of the disk engine serving this database.
    pub fn disk_options(&self) -> DiskStorageOptions {
        DiskStorageOptions {
            path: self.path.join(&self.database),
            enable_fsync: self.enable_fsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoreConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.engine, EngineKind::Disk);
        assert_eq!(
            config.disk_options().path,
            PathBuf::from("bibliolight.db").join("bibliometrics")
        );
    }

    #[test]
    fn read_every_key() {
        let config = from_pairs(&[
            (ENV_ENGINE, "Memory"),
            (ENV_DATA_DIR, "/var/lib/biblio"),
            (ENV_DATABASE, "scopus_2024"),
            (ENV_FSYNC, "off"),
            (ENV_CSV_DELIMITER, ";"),
        ])
        .unwrap();
        assert_eq!(config.engine, EngineKind::Memory);
        assert_eq!(config.database, "scopus_2024");
        assert!(!config.enable_fsync);
        assert_eq!(config.csv.delimiter, ';');
        assert_eq!(
            config.disk_options().path,
            PathBuf::from("/var/lib/biblio/scopus_2024")
        );
    }

    #[test]
    fn tab_delimiter() {
        let config = from_pairs(&[(ENV_CSV_DELIMITER, "\\t")]).unwrap();
        assert_eq!(config.csv.delimiter, '\t');
    }

    #[test_case(ENV_ENGINE, "postgres" ; "unknown engine")]
    #[test_case(ENV_FSYNC, "maybe" ; "bad boolean")]
    #[test_case(ENV_DATABASE, "../escape" ; "path in database name")]
    #[test_case(ENV_DATABASE, "" ; "empty database name")]
    #[test_case(ENV_CSV_DELIMITER, ",;" ; "long delimiter")]
    #[test_case(ENV_CSV_DELIMITER, "\"" ; "delimiter is quote")]
    fn reject(key: &'static str, value: &str) {
        let err = from_pairs(&[(key, value)]).unwrap_err();
        assert_eq!(err.key, key);
    }
}
