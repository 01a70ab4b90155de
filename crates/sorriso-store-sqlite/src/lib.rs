//! SQLite backend for the Observatório do Sorriso tables.
//!
//! Wraps [`tokio_rusqlite`] so the one-off bulk read runs on a dedicated
//! thread without blocking the async runtime. The database is opened
//! read-only and closed again before [`SqliteSource::load_base_tables`]
//! returns.
//!
//! [`SqliteSource::load_base_tables`]: sorriso_core::source::TableSource::load_base_tables

mod decode;
mod layout;
mod source;

pub mod error;

pub use error::{Error, Result};
pub use layout::{
  AgeBracketLayout, ExamTypeLayout, FactLayout, SchoolLayout, TableLayout,
};
pub use source::SqliteSource;

#[cfg(test)]
mod tests;
