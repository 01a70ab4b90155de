//! Row selection by dimension value and age bracket.
//!
//! Predicates are typed set-membership checks; nothing is formatted into a
//! query string.

use std::collections::BTreeSet;

use crate::{
  Result,
  age::AgeSelection,
  join::{Attribute, KeyValue, WorkingTable},
};

/// Keep the rows whose `dimension` value is in `selected` and whose age is
/// covered by `ages`.
///
/// A single-age row matches when its age falls inside any selected bracket;
/// a composite row matches only when that exact band is selected. An empty
/// `selected` or empty `ages` yields an empty table.
pub fn filter_view(
  table: &WorkingTable,
  dimension: Attribute,
  selected: &BTreeSet<String>,
  ages: &AgeSelection,
) -> Result<WorkingTable> {
  let dim_idx = table.column_index(dimension)?;
  let age_idx = table.column_index(Attribute::Age)?;
  let expanded = ages.ages();

  let mut filtered = table.clone();
  filtered.retain(|row| {
    let dim_ok = match &row.values[dim_idx] {
      KeyValue::Text(value) => selected.contains(value),
      other => selected.contains(&other.to_string()),
    };
    let age_ok = match row.values[age_idx] {
      KeyValue::Age(band) if band.is_composite() => ages.contains(&band),
      KeyValue::Age(band) => expanded.contains(&band.lower()),
      KeyValue::Text(_) => false,
    };
    dim_ok && age_ok
  });

  tracing::debug!(
    %dimension,
    selected = selected.len(),
    ages = ?ages.keys(),
    kept = filtered.len(),
    of = table.len(),
    "filtered working table"
  );

  Ok(filtered)
}
