//! # tabcompare
//!
//! Key-based comparison of two tabular datasets: schema differences, row
//! partition by join key, and per-cell mismatches under numeric tolerance
//! and case rules.

pub mod cache;
pub mod cell;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod joiner;
pub mod loader;
pub mod output;
pub mod progress;
pub mod report;
pub mod schema;
pub mod sql;
pub mod value;
pub mod workspace;

pub use config::{ComparisonConfig, NullKeyPolicy, Settings};
pub use dataset::{Column, Dataset};
pub use engine::{compare, CancelFlag, ComparisonEngine};
pub use error::{Result, TabcompareError};
pub use report::{ColumnStats, ComparisonReport, Mismatch, RowPartition};
pub use schema::SchemaDiff;
pub use value::{DataType, Value};
pub use workspace::TabcompareWorkspace;

/// Version tag mixed into comparison fingerprints
pub const FORMAT_VERSION: &str = "1.0.0";

/// Default number of entries per section in pretty output
pub const DEFAULT_DISPLAY_ROWS: usize = 20;
