// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! One interactive session over a [`Database`].
//!
//! Every interaction runs to completion and reports its outcome as a [`Reply`]. Parse,
//! load and query failures become an error notice next to an empty value; only an
//! unavailable store is returned as an error, which ends the session.

use tracing::{error, info, warn};

use crate::catalog::BIBLIOGRAPHY_TABLE;
use crate::chart::{Chart, ChartKind};
use crate::config::StoreConfig;
use crate::db::{Database, Error, UploadSummary};
use crate::executor::WorkingSet;

/// A message shown next to the outcome of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Notice {
    #[default]
    None,
    Success(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// The outcome of an interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub value: T,
    pub notice: Notice,
}

impl<T> Reply<T> {
    fn ok(value: T) -> Self {
        Reply {
            value,
            notice: Notice::None,
        }
    }
}

pub struct Session {
    db: Database,
}

impl Session {
    /// Open the store and prepare the backing table.
    pub async fn open(config: &StoreConfig) -> Result<Self, Error> {
        let db = Database::open(config).await.map_err(|e| {
            error!(error = %e, "failed to open the store");
            e
        })?;
        Ok(Session { db })
    }

    pub fn with_database(db: Database) -> Self {
        Session { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Replace the stored records with a CSV upload.
    pub async fn upload(&self, buf: &[u8]) -> Result<Reply<UploadSummary>, Error> {
        let reply = recover(self.db.upload(buf).await, UploadSummary::default)?;
        if reply.notice.is_error() {
            return Ok(reply);
        }
        let message = format!(
            "Inserted {} records into table {}",
            reply.value.rows_written, BIBLIOGRAPHY_TABLE
        );
        info!("{message}");
        Ok(Reply {
            notice: Notice::Success(message),
            ..reply
        })
    }

    /// The default projection of the stored records.
    pub async fn records(&self) -> Result<Reply<WorkingSet>, Error> {
        recover(self.db.records().await, WorkingSet::default)
    }

    pub async fn chart(&self, kind: ChartKind) -> Result<Reply<Chart>, Error> {
        recover(self.db.chart(kind).await, || Chart::empty(kind))
    }

    pub fn close(self) {
        self.db.shutdown();
    }
}

/// Turn a non-fatal error into an error notice next to an empty value.
fn recover<T>(result: Result<T, Error>, empty: impl FnOnce() -> T) -> Result<Reply<T>, Error> {
    match result {
        Ok(value) => Ok(Reply::ok(value)),
        Err(e) if e.is_fatal() => {
            error!(error = %e, "session aborted");
            Err(e)
        }
        Err(e) => {
            warn!(error = %e, kind = ?e.kind(), "interaction failed");
            Ok(Reply {
                value: empty(),
                notice: Notice::Error(e.to_string()),
            })
        }
    }
}
