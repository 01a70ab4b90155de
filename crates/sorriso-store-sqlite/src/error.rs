//! Error type for `sorriso-store-sqlite`.
//!
//! Every variant is a data-source failure: the pipeline cannot proceed and
//! nothing is retried, since the source is static.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot open database {path:?}: {source}")]
  Open {
    path:   PathBuf,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("table {0:?} not found")]
  MissingTable(String),

  #[error("table {table:?} has no column {column:?}")]
  MissingColumn { table: String, column: String },

  #[error("table {table:?}, row {row}: column {column:?} holds invalid value {value}")]
  InvalidValue {
    table:  String,
    column: String,
    row:    usize,
    value:  i64,
  },

  #[error("core error: {0}")]
  Core(#[from] sorriso_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for sorriso_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(inner) => inner,
      other => sorriso_core::Error::DataSource(Box::new(other)),
    }
  }
}
