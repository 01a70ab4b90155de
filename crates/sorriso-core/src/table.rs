//! The four base tables and the context object that owns them.
//!
//! [`BaseTables`] is built once per source load and never mutated afterwards.
//! Every pipeline stage borrows it and produces new derived tables.

use std::{collections::HashMap, fmt, ops::AddAssign};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Measures ────────────────────────────────────────────────────────────────

/// The five numeric measures carried by every fact row and summed by every
/// aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measures {
  /// Decayed teeth (`C`).
  pub decayed:    f64,
  /// Missing teeth (`P`).
  pub missing:    f64,
  /// Filled teeth (`O`).
  pub filled:     f64,
  /// Sum of the composite index over the cell (`soma_cpo`).
  pub cpo_sum:    f64,
  /// Number of children examined (`quantidade_populacao`).
  pub population: u64,
}

impl AddAssign for Measures {
  fn add_assign(&mut self, rhs: Self) {
    self.decayed += rhs.decayed;
    self.missing += rhs.missing;
    self.filled += rhs.filled;
    self.cpo_sum += rhs.cpo_sum;
    self.population += rhs.population;
  }
}

impl Measures {
  fn validate(&self, row: usize) -> Result<()> {
    let counts = [
      ("C", self.decayed),
      ("P", self.missing),
      ("O", self.filled),
      ("soma_cpo", self.cpo_sum),
    ];
    for (name, value) in counts {
      if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidMeasure {
          row,
          reason: format!("{name} must be a non-negative number, got {value}"),
        });
      }
    }
    Ok(())
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One exam result cell: a (school, age bracket, exam type) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
  pub school_id:      i64,
  pub age_bracket_id: i64,
  pub exam_type_id:   i64,
  pub measures:       Measures,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
  pub id:        i64,
  pub name:      String,
  pub territory: String,
  pub region:    String,
}

/// A single year of age. The table name is historical; ranges are built
/// downstream from these single ages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBracket {
  pub id:  i64,
  pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamType {
  pub id:    i64,
  pub label: String,
}

/// Names the dimension table involved in a referential-integrity error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionTable {
  School,
  AgeBracket,
  ExamType,
}

impl fmt::Display for DimensionTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::School => "school table",
      Self::AgeBracket => "age bracket table",
      Self::ExamType => "exam type table",
    })
  }
}

// ─── BaseTables ──────────────────────────────────────────────────────────────

/// The immutable inputs to the whole pipeline.
///
/// Passed explicitly into each stage; nothing reads tables from ambient state.
#[derive(Debug, Clone)]
pub struct BaseTables {
  fact:         Vec<ExamRecord>,
  schools:      Vec<School>,
  age_brackets: Vec<AgeBracket>,
  exam_types:   Vec<ExamType>,

  school_idx:      HashMap<i64, usize>,
  age_bracket_idx: HashMap<i64, usize>,
  exam_type_idx:   HashMap<i64, usize>,
}

impl BaseTables {
  /// Validate the fact measures and index each dimension by its identifier.
  ///
  /// Referential integrity is not checked here; the join stage reports a
  /// dangling key when it meets one.
  pub fn new(
    fact: Vec<ExamRecord>,
    schools: Vec<School>,
    age_brackets: Vec<AgeBracket>,
    exam_types: Vec<ExamType>,
  ) -> Result<Self> {
    for (row, record) in fact.iter().enumerate() {
      record.measures.validate(row)?;
    }

    let school_idx = index_by(&schools, |s| s.id, DimensionTable::School)?;
    let age_bracket_idx =
      index_by(&age_brackets, |a| a.id, DimensionTable::AgeBracket)?;
    let exam_type_idx =
      index_by(&exam_types, |e| e.id, DimensionTable::ExamType)?;

    Ok(Self {
      fact,
      schools,
      age_brackets,
      exam_types,
      school_idx,
      age_bracket_idx,
      exam_type_idx,
    })
  }

  pub fn fact(&self) -> &[ExamRecord] { &self.fact }

  pub fn schools(&self) -> &[School] { &self.schools }

  pub fn age_brackets(&self) -> &[AgeBracket] { &self.age_brackets }

  pub fn exam_types(&self) -> &[ExamType] { &self.exam_types }

  pub fn school(&self, id: i64) -> Result<&School> {
    lookup(&self.schools, &self.school_idx, id, DimensionTable::School)
  }

  pub fn age_bracket(&self, id: i64) -> Result<&AgeBracket> {
    lookup(
      &self.age_brackets,
      &self.age_bracket_idx,
      id,
      DimensionTable::AgeBracket,
    )
  }

  pub fn exam_type(&self, id: i64) -> Result<&ExamType> {
    lookup(&self.exam_types, &self.exam_type_idx, id, DimensionTable::ExamType)
  }

  /// Sum of every fact row's measures.
  pub fn totals(&self) -> Measures {
    self.fact.iter().fold(Measures::default(), |mut acc, r| {
      acc += r.measures;
      acc
    })
  }
}

fn index_by<T>(
  rows: &[T],
  key: impl Fn(&T) -> i64,
  table: DimensionTable,
) -> Result<HashMap<i64, usize>> {
  let mut idx = HashMap::with_capacity(rows.len());
  for (pos, row) in rows.iter().enumerate() {
    let id = key(row);
    if idx.insert(id, pos).is_some() {
      return Err(Error::DuplicateKey { table, key: id });
    }
  }
  Ok(idx)
}

fn lookup<'a, T>(
  rows: &'a [T],
  idx: &HashMap<i64, usize>,
  id: i64,
  table: DimensionTable,
) -> Result<&'a T> {
  idx
    .get(&id)
    .map(|&pos| &rows[pos])
    .ok_or(Error::MissingDimensionKey { table, key: id })
}
