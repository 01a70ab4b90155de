//! Dimensional join: denormalise the fact table against its dimensions.
//!
//! The result is a [`WorkingTable`]: one row per fact row, in fact-table
//! order, carrying the requested descriptive columns and the five measures.
//! Foreign-key columns are not carried over.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::{
  Error, Result,
  age::AgeBand,
  table::{BaseTables, ExamRecord, Measures},
};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// A descriptive column of the working table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
  School,
  Territory,
  Region,
  /// Derived from [`Attribute::Region`] by the classification stage.
  Zone,
  Age,
  ExamType,
}

impl Attribute {
  /// `false` for columns computed from other columns rather than joined.
  pub fn is_stored(&self) -> bool { !matches!(self, Self::Zone) }
}

impl fmt::Display for Attribute {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::School => "school",
      Self::Territory => "territory",
      Self::Region => "region",
      Self::Zone => "zone",
      Self::Age => "age",
      Self::ExamType => "exam type",
    })
  }
}

/// One cell of a descriptive column.
///
/// A column only ever holds one variant, so the derived ordering is the
/// natural one within a column: lexicographic for text, `(lower, upper)` for
/// ages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
  Text(String),
  Age(AgeBand),
}

impl KeyValue {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      Self::Age(_) => None,
    }
  }

  pub fn as_age(&self) -> Option<AgeBand> {
    match self {
      Self::Age(band) => Some(*band),
      Self::Text(_) => None,
    }
  }
}

impl fmt::Display for KeyValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => f.write_str(s),
      Self::Age(band) => band.fmt(f),
    }
  }
}

impl Serialize for KeyValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

// ─── WorkingTable ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingRow {
  /// One value per column of the owning table, in column order.
  pub values:   Vec<KeyValue>,
  pub measures: Measures,
}

/// A denormalised, column-labelled table derived from [`BaseTables`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingTable {
  columns: Vec<Attribute>,
  rows:    Vec<WorkingRow>,
}

impl WorkingTable {
  /// Build a table, rejecting any row without exactly one value per
  /// column.
  pub fn new(columns: Vec<Attribute>, rows: Vec<WorkingRow>) -> Result<Self> {
    if let Some((row, bad)) = rows
      .iter()
      .enumerate()
      .find(|(_, r)| r.values.len() != columns.len())
    {
      return Err(Error::RowWidth {
        row,
        expected: columns.len(),
        found: bad.values.len(),
      });
    }
    Ok(Self { columns, rows })
  }

  pub fn columns(&self) -> &[Attribute] { &self.columns }

  pub fn rows(&self) -> &[WorkingRow] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn into_parts(self) -> (Vec<Attribute>, Vec<WorkingRow>) {
    (self.columns, self.rows)
  }

  /// Position of `attr` among the columns.
  pub fn column_index(&self, attr: Attribute) -> Result<usize> {
    self
      .columns
      .iter()
      .position(|c| *c == attr)
      .ok_or(Error::MissingColumn(attr))
  }

  /// Keep the rows for which `keep` holds, preserving order.
  pub fn retain(&mut self, keep: impl FnMut(&WorkingRow) -> bool) {
    self.rows.retain(keep);
  }
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// Left-join every fact row against the dimensions behind `attributes`.
///
/// The result has exactly one row per fact row, in the same order. A fact row
/// pointing at a missing dimension row is a data-quality failure and aborts
/// the join with [`Error::MissingDimensionKey`].
pub fn join_dimensions(
  tables: &BaseTables,
  attributes: &[Attribute],
) -> Result<WorkingTable> {
  if let Some(derived) = attributes.iter().find(|a| !a.is_stored()) {
    return Err(Error::DerivedAttribute(*derived));
  }

  let rows = tables
    .fact()
    .iter()
    .map(|record| {
      let values = attributes
        .iter()
        .map(|attr| resolve(tables, record, *attr))
        .collect::<Result<Vec<_>>>()?;
      Ok(WorkingRow { values, measures: record.measures })
    })
    .collect::<Result<Vec<_>>>()?;

  tracing::debug!(rows = rows.len(), ?attributes, "joined fact table");

  WorkingTable::new(attributes.to_vec(), rows)
}

fn resolve(
  tables: &BaseTables,
  record: &ExamRecord,
  attr: Attribute,
) -> Result<KeyValue> {
  let value = match attr {
    Attribute::School => {
      KeyValue::Text(tables.school(record.school_id)?.name.clone())
    }
    Attribute::Territory => {
      KeyValue::Text(tables.school(record.school_id)?.territory.clone())
    }
    Attribute::Region => {
      KeyValue::Text(tables.school(record.school_id)?.region.clone())
    }
    Attribute::Age => KeyValue::Age(AgeBand::single(
      tables.age_bracket(record.age_bracket_id)?.age,
    )),
    Attribute::ExamType => {
      KeyValue::Text(tables.exam_type(record.exam_type_id)?.label.clone())
    }
    Attribute::Zone => return Err(Error::DerivedAttribute(attr)),
  };
  Ok(value)
}
