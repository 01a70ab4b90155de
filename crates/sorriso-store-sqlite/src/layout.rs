//! Table and column names of the source database.
//!
//! The defaults match the published Observatório do Sorriso database. Every
//! name is configurable; they are quoted as SQL identifiers, never spliced in
//! raw.

use serde::Deserialize;

/// Names of the four tables and their columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableLayout {
  pub fact:         FactLayout,
  pub schools:      SchoolLayout,
  pub age_brackets: AgeBracketLayout,
  pub exam_types:   ExamTypeLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FactLayout {
  pub table:          String,
  pub school_id:      String,
  pub age_bracket_id: String,
  pub exam_type_id:   String,
  pub decayed:        String,
  pub missing:        String,
  pub filled:         String,
  pub cpo_sum:        String,
  pub population:     String,
}

impl Default for FactLayout {
  fn default() -> Self {
    Self {
      table:          "CPO_D".into(),
      school_id:      "escola_id".into(),
      age_bracket_id: "faixa_etaria_id".into(),
      exam_type_id:   "exame_id".into(),
      decayed:        "C".into(),
      missing:        "P".into(),
      filled:         "O".into(),
      cpo_sum:        "soma_cpo".into(),
      population:     "quantidade_populacao".into(),
    }
  }
}

/// Dimension rows are identified by their `index` column, the row label the
/// tables were exported with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchoolLayout {
  pub table:     String,
  pub id:        String,
  pub name:      String,
  pub territory: String,
  pub region:    String,
}

impl Default for SchoolLayout {
  fn default() -> Self {
    Self {
      table:     "Escola".into(),
      id:        "index".into(),
      name:      "escola.nome".into(),
      territory: "escola.território".into(),
      region:    "escola.região".into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgeBracketLayout {
  pub table: String,
  pub id:    String,
  pub age:   String,
}

impl Default for AgeBracketLayout {
  fn default() -> Self {
    Self {
      table: "Faixa_etaria".into(),
      id:    "index".into(),
      age:   "idade".into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExamTypeLayout {
  pub table: String,
  pub id:    String,
  pub label: String,
}

impl Default for ExamTypeLayout {
  fn default() -> Self {
    Self {
      table: "Exame".into(),
      id:    "index".into(),
      label: "exame.nome".into(),
    }
  }
}

impl TableLayout {
  /// Every `(table, columns)` pair the loader reads, columns in `SELECT`
  /// order.
  pub(crate) fn required(&self) -> [(&str, Vec<&str>); 4] {
    let f = &self.fact;
    let s = &self.schools;
    let a = &self.age_brackets;
    let e = &self.exam_types;
    [
      (&f.table, vec![
        &f.school_id,
        &f.age_bracket_id,
        &f.exam_type_id,
        &f.decayed,
        &f.missing,
        &f.filled,
        &f.cpo_sum,
        &f.population,
      ]),
      (&s.table, vec![&s.id, &s.name, &s.territory, &s.region]),
      (&a.table, vec![&a.id, &a.age]),
      (&e.table, vec![&e.id, &e.label]),
    ]
    .map(|(table, columns)| {
      (table.as_str(), columns.into_iter().map(String::as_str).collect())
    })
  }
}

/// Quote `name` as an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SELECT "a", "b" FROM "t"`: a whole-table scan of the given columns.
pub(crate) fn select_all(table: &str, columns: &[&str]) -> String {
  let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
  format!("SELECT {} FROM {}", cols.join(", "), quote_ident(table))
}
