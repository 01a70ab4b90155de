//! Error types for `sorriso-core`.

use thiserror::Error;

use crate::{join::Attribute, table::DimensionTable};

#[derive(Debug, Error)]
pub enum Error {
  /// A fact row references a dimension row that does not exist.
  #[error("{table} has no row with key {key}")]
  MissingDimensionKey { table: DimensionTable, key: i64 },

  #[error("{table} has more than one row with key {key}")]
  DuplicateKey { table: DimensionTable, key: i64 },

  /// A stage needed a column the working table does not carry.
  #[error("working table has no {0} column")]
  MissingColumn(Attribute),

  /// A working-table row whose width differs from the column count.
  #[error("working table row {row} has {found} values, expected {expected}")]
  RowWidth { row: usize, expected: usize, found: usize },

  /// A derived column was requested from the join stage.
  #[error("{0} is a derived column and cannot be joined")]
  DerivedAttribute(Attribute),

  #[error("invalid measure in fact row {row}: {reason}")]
  InvalidMeasure { row: usize, reason: String },

  #[error("unknown dimension: {0:?}")]
  UnknownDimension(String),

  #[error("invalid age band: {0:?}")]
  InvalidAgeBand(String),

  /// The data source could not be opened or read.
  #[error("data source error: {0}")]
  DataSource(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
