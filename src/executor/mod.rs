// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Executors of the ingestion and aggregation pipeline.
//!
//! An upload flows through the executors in this order:
//!
//! 1. [`CopyFromBufferExecutor`] parses a CSV buffer into chunks shaped like the table.
//! 2. [`ReplaceExecutor`] replaces the contents of the table with those chunks.
//! 3. [`ProjectionExecutor`] reads a [`WorkingSet`] of selected columns back.
//! 4. [`FrequencyExecutor`] turns the working set into a [`FrequencyDistribution`].

pub use self::aggregate::*;
pub use self::copy_from_buffer::*;
pub use self::error::*;
pub use self::projection::*;
pub use self::replace::*;

mod aggregate;
mod copy_from_buffer;
mod error;
mod projection;
mod replace;

/// The maximum chunk length produced by executors.
const PROCESSING_WINDOW_SIZE: usize = 1024;
