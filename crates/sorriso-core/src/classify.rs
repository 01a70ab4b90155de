//! Derived categorical mappings.

use std::fmt;

use serde::Serialize;

use crate::{
  Result,
  join::{Attribute, KeyValue, WorkingTable},
};

/// The region label that marks a school as rural. Every other label is urban.
pub const RURAL_MARKER: &str = "RURAL";

/// Coarse classification of a school's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
  Rural,
  Urbano,
}

impl Zone {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Rural => "RURAL",
      Self::Urbano => "URBANO",
    }
  }
}

impl fmt::Display for Zone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Map a region label onto its zone.
///
/// Total over any label set: only the rural marker is rural. Idempotent,
/// since `"URBANO"` and `"RURAL"` classify to themselves.
pub fn classify_region(region: &str) -> Zone {
  if region == RURAL_MARKER { Zone::Rural } else { Zone::Urbano }
}

/// The string key of a single age.
pub fn bracket_key(age: u32) -> String { age.to_string() }

/// Replace the region column of `table` with the zone it classifies to.
///
/// The column keeps its position and is relabelled [`Attribute::Zone`].
pub fn classify_zones(table: WorkingTable) -> Result<WorkingTable> {
  let idx = table.column_index(Attribute::Region)?;
  let (mut columns, mut rows) = table.into_parts();

  columns[idx] = Attribute::Zone;
  for row in &mut rows {
    if let KeyValue::Text(region) = &row.values[idx] {
      let zone = classify_region(region);
      row.values[idx] = KeyValue::Text(zone.as_str().to_owned());
    }
  }

  WorkingTable::new(columns, rows)
}
