//! The CPO-D ratio index.
//!
//! `cpo-d = soma_cpo / population`, rounded to two decimals with ties going
//! to the even neighbour (applied to the ratio scaled by 100). A group with
//! no examined population has no index: it is [`CpoIndex::Undefined`], never
//! zero.

use std::fmt;

use serde::{Serialize, Serializer};

/// Decimal places kept by [`cpo_index`].
pub const PRECISION: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpoIndex {
  Defined(f64),
  /// Zero population, or nothing selected.
  Undefined,
}

impl CpoIndex {
  pub fn value(&self) -> Option<f64> {
    match self {
      Self::Defined(v) => Some(*v),
      Self::Undefined => None,
    }
  }
}

impl fmt::Display for CpoIndex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Defined(v) => write!(f, "{v:.2}"),
      Self::Undefined => f.write_str("n/a"),
    }
  }
}

/// Serialised as a number, or `null` when undefined.
impl Serialize for CpoIndex {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.value().serialize(serializer)
  }
}

pub fn cpo_index(cpo_sum: f64, population: u64) -> CpoIndex {
  if population == 0 {
    return CpoIndex::Undefined;
  }
  CpoIndex::Defined(round_to(cpo_sum / population as f64, PRECISION))
}

fn round_to(value: f64, places: i32) -> f64 {
  let scale = 10f64.powi(places);
  (value * scale).round_ties_even() / scale
}
