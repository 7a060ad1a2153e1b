// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Ingestion and aggregation of bibliometric exports.
//!
//! A CSV export is parsed into records of fixed text fields, replaces the contents of
//! a single backing table, and is read back to draw frequency charts: publications
//! per year, top authors and top venues.

#![deny(unused_must_use)]

pub mod array;
pub mod catalog;
pub mod chart;
pub mod config;
mod db;
pub mod executor;
pub mod session;
pub mod storage;
pub mod types;

pub use self::chart::{Chart, ChartKind};
pub use self::config::{EngineKind, StoreConfig};
pub use self::db::{Database, Error, ErrorKind, UploadSummary};
pub use self::session::{Notice, Reply, Session};
