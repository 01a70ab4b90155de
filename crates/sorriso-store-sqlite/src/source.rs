//! [`SqliteSource`]: the SQLite implementation of [`TableSource`].

use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;
use sorriso_core::{source::TableSource, table::BaseTables};
use tokio_rusqlite::Connection;

use crate::{
  Error, Result,
  decode::{RawAgeBracket, RawExamType, RawFact, RawSchool, RawTables},
  layout::{TableLayout, quote_ident, select_all},
};

// ─── Source ──────────────────────────────────────────────────────────────────

/// A read-only handle on a database file. Holds no connection between
/// loads.
#[derive(Debug, Clone)]
pub struct SqliteSource {
  path:   PathBuf,
  layout: TableLayout,
}

impl SqliteSource {
  /// A source at `path` using the default [`TableLayout`].
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), layout: TableLayout::default() }
  }

  pub fn with_layout(mut self, layout: TableLayout) -> Self {
    self.layout = layout;
    self
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn layout(&self) -> &TableLayout { &self.layout }

  /// Open the file read-only, check the layout, scan the four tables and
  /// close the connection again.
  pub async fn load(&self) -> Result<BaseTables> {
    let conn = self.open().await?;

    let loaded = self.read(&conn).await;
    let closed = conn.close().await;
    let raw = loaded?;
    closed?;

    let tables = raw.into_base_tables(&self.layout)?;

    tracing::info!(
      path = %self.path.display(),
      fact = tables.fact().len(),
      schools = tables.schools().len(),
      age_brackets = tables.age_brackets().len(),
      exam_types = tables.exam_types().len(),
      "loaded base tables"
    );

    Ok(tables)
  }

  async fn open(&self) -> Result<Connection> {
    let flags =
      OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(&self.path, flags)
      .await
      .map_err(|source| Error::Open { path: self.path.clone(), source })
  }

  async fn read(&self, conn: &Connection) -> Result<RawTables> {
    self.check_layout(conn).await?;

    let layout = self.layout.clone();
    let raw = conn
      .call(move |conn| {
        let [fact, schools, age_brackets, exam_types] = layout.required();

        let mut stmt = conn.prepare(&select_all(fact.0, &fact.1))?;
        let fact = stmt
          .query_map([], |row| {
            Ok(RawFact {
              school_id:      row.get(0)?,
              age_bracket_id: row.get(1)?,
              exam_type_id:   row.get(2)?,
              decayed:        row.get(3)?,
              missing:        row.get(4)?,
              filled:         row.get(5)?,
              cpo_sum:        row.get(6)?,
              population:     row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&select_all(schools.0, &schools.1))?;
        let schools = stmt
          .query_map([], |row| {
            Ok(RawSchool {
              id:        row.get(0)?,
              name:      row.get(1)?,
              territory: row.get(2)?,
              region:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt =
          conn.prepare(&select_all(age_brackets.0, &age_brackets.1))?;
        let age_brackets = stmt
          .query_map([], |row| {
            Ok(RawAgeBracket { id: row.get(0)?, age: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt =
          conn.prepare(&select_all(exam_types.0, &exam_types.1))?;
        let exam_types = stmt
          .query_map([], |row| {
            Ok(RawExamType { id: row.get(0)?, label: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(RawTables { fact, schools, age_brackets, exam_types })
      })
      .await?;

    Ok(raw)
  }

  /// Report a missing table or column by name before any scan runs.
  async fn check_layout(&self, conn: &Connection) -> Result<()> {
    let required: Vec<(String, Vec<String>)> = self
      .layout
      .required()
      .into_iter()
      .map(|(table, columns)| {
        (table.to_owned(), columns.into_iter().map(str::to_owned).collect())
      })
      .collect();

    let tables: Vec<String> = required.iter().map(|(t, _)| t.clone()).collect();
    let present: Vec<Vec<String>> = conn
      .call(move |conn| {
        let mut present = Vec::with_capacity(tables.len());
        for table in &tables {
          let pragma = format!("PRAGMA table_info({})", quote_ident(table));
          let mut stmt = conn.prepare(&pragma)?;
          let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          present.push(names);
        }
        Ok(present)
      })
      .await?;

    for ((table, columns), found) in required.into_iter().zip(present) {
      if found.is_empty() {
        return Err(Error::MissingTable(table));
      }
      if let Some(column) = columns.into_iter().find(|c| !found.contains(c)) {
        return Err(Error::MissingColumn { table, column });
      }
    }
    Ok(())
  }
}

// ─── TableSource impl ────────────────────────────────────────────────────────

impl TableSource for SqliteSource {
  type Error = Error;

  fn source_id(&self) -> String { self.path.display().to_string() }

  async fn load_base_tables(&self) -> Result<BaseTables> { self.load().await }
}
