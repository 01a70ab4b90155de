//! Raw rows as read from SQLite, and their conversion into domain types.
//!
//! Identifiers and counts are read as `INTEGER`; the tooth measures as
//! `REAL` (SQLite widens integer cells on read). Range checks that the
//! column types cannot express happen here.

use sorriso_core::table::{
  AgeBracket, BaseTables, ExamRecord, ExamType, Measures, School,
};

use crate::{Error, Result, layout::TableLayout};

pub struct RawFact {
  pub school_id:      i64,
  pub age_bracket_id: i64,
  pub exam_type_id:   i64,
  pub decayed:        f64,
  pub missing:        f64,
  pub filled:         f64,
  pub cpo_sum:        f64,
  pub population:     i64,
}

pub struct RawSchool {
  pub id:        i64,
  pub name:      String,
  pub territory: String,
  pub region:    String,
}

pub struct RawAgeBracket {
  pub id:  i64,
  pub age: i64,
}

pub struct RawExamType {
  pub id:    i64,
  pub label: String,
}

pub struct RawTables {
  pub fact:         Vec<RawFact>,
  pub schools:      Vec<RawSchool>,
  pub age_brackets: Vec<RawAgeBracket>,
  pub exam_types:   Vec<RawExamType>,
}

impl RawTables {
  pub fn into_base_tables(self, layout: &TableLayout) -> Result<BaseTables> {
    let fact = self
      .fact
      .into_iter()
      .enumerate()
      .map(|(row, raw)| {
        let fact = &layout.fact;
        let population = u64::try_from(raw.population).map_err(|_| {
          invalid(&fact.table, &fact.population, row, raw.population)
        })?;
        Ok(ExamRecord {
          school_id:      raw.school_id,
          age_bracket_id: raw.age_bracket_id,
          exam_type_id:   raw.exam_type_id,
          measures:       Measures {
            decayed: raw.decayed,
            missing: raw.missing,
            filled: raw.filled,
            cpo_sum: raw.cpo_sum,
            population,
          },
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let schools = self
      .schools
      .into_iter()
      .map(|raw| School {
        id:        raw.id,
        name:      raw.name,
        territory: raw.territory,
        region:    raw.region,
      })
      .collect();

    let age_brackets = self
      .age_brackets
      .into_iter()
      .enumerate()
      .map(|(row, raw)| {
        let ages = &layout.age_brackets;
        let age = u32::try_from(raw.age)
          .map_err(|_| invalid(&ages.table, &ages.age, row, raw.age))?;
        Ok(AgeBracket { id: raw.id, age })
      })
      .collect::<Result<Vec<_>>>()?;

    let exam_types = self
      .exam_types
      .into_iter()
      .map(|raw| ExamType { id: raw.id, label: raw.label })
      .collect();

    Ok(BaseTables::new(fact, schools, age_brackets, exam_types)?)
  }
}

fn invalid(table: &str, column: &str, row: usize, value: i64) -> Error {
  Error::InvalidValue {
    table: table.to_owned(),
    column: column.to_owned(),
    row,
    value,
  }
}
