//! Age brackets: single ages, composite bands and user selections of them.
//!
//! A bracket key is either a single age (`"12"`) or an inclusive range
//! (`"15-19"`). Keys sort by `(lower, upper)`, so a composite band sits
//! right after the single age it starts at: `12 < 15 < 15-19 < 16`.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, classify::bracket_key};

/// The WHO reference age for the CPO-D index.
pub const INDEX_AGE: AgeBand = AgeBand { lo: 12, hi: 12 };

/// The adolescent range, reported as one synthesised band.
pub const ADOLESCENT_BAND: AgeBand = AgeBand { lo: 15, hi: 19 };

// ─── AgeBand ─────────────────────────────────────────────────────────────────

/// A single age or an inclusive range of ages.
///
/// Field order matters: the derived `Ord` compares `lo` first, then `hi`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct AgeBand {
  lo: u32,
  hi: u32,
}

impl AgeBand {
  pub const fn single(age: u32) -> Self { Self { lo: age, hi: age } }

  pub fn range(lo: u32, hi: u32) -> Result<Self> {
    if lo > hi {
      return Err(Error::InvalidAgeBand(format!("{lo}-{hi}")));
    }
    Ok(Self { lo, hi })
  }

  pub fn lower(&self) -> u32 { self.lo }

  pub fn upper(&self) -> u32 { self.hi }

  /// `true` for a band spanning more than one age.
  pub fn is_composite(&self) -> bool { self.lo != self.hi }

  pub fn contains(&self, age: u32) -> bool { (self.lo..=self.hi).contains(&age) }
}

impl fmt::Display for AgeBand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_composite() {
      write!(f, "{}-{}", bracket_key(self.lo), bracket_key(self.hi))
    } else {
      f.write_str(&bracket_key(self.lo))
    }
  }
}

impl FromStr for AgeBand {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let parse = |part: &str| {
      part
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::InvalidAgeBand(s.to_owned()))
    };
    match s.split_once('-') {
      Some((lo, hi)) => Self::range(parse(lo)?, parse(hi)?),
      None => Ok(Self::single(parse(s)?)),
    }
  }
}

impl TryFrom<String> for AgeBand {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<AgeBand> for String {
  fn from(band: AgeBand) -> Self { band.to_string() }
}

// ─── Free functions ──────────────────────────────────────────────────────────

/// Expand an inclusive integer range into its individual age keys.
/// Empty when `lo > hi`.
pub fn age_range(lo: u32, hi: u32) -> Vec<String> {
  (lo..=hi).map(bracket_key).collect()
}

/// The brackets displayed for a slider positioned at `(lo, hi)`.
///
/// Equal ends give that bracket alone. The pair (`12`, `15-19`) gives the
/// two ages of clinical interest plus the single age 15 that starts the band:
/// `["12", "15", "15-19"]`. Any other pair is shown as-is.
pub fn bracket_interval(lo: AgeBand, hi: AgeBand) -> Vec<AgeBand> {
  if lo == hi {
    vec![lo]
  } else if lo == INDEX_AGE && hi == ADOLESCENT_BAND {
    vec![INDEX_AGE, AgeBand::single(ADOLESCENT_BAND.lo), ADOLESCENT_BAND]
  } else {
    vec![lo, hi]
  }
}

// ─── AgeSelection ────────────────────────────────────────────────────────────

/// The brackets a user asked to see, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgeSelection {
  bands: Vec<AgeBand>,
}

impl Default for AgeSelection {
  /// The slider default: (`12`, `15-19`).
  fn default() -> Self { Self::from_interval(INDEX_AGE, ADOLESCENT_BAND) }
}

impl AgeSelection {
  /// Selection from a two-ended slider; see [`bracket_interval`].
  pub fn from_interval(lo: AgeBand, hi: AgeBand) -> Self {
    Self { bands: bracket_interval(lo, hi) }
  }

  /// Selection from an explicit list of bracket keys (a multiselect).
  /// Duplicates are dropped; the first occurrence keeps its position.
  pub fn from_keys<I, S>(keys: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut bands: Vec<AgeBand> = Vec::new();
    for key in keys {
      let band: AgeBand = key.as_ref().parse()?;
      if !bands.contains(&band) {
        bands.push(band);
      }
    }
    Ok(Self { bands })
  }

  pub fn empty() -> Self { Self { bands: Vec::new() } }

  pub fn bands(&self) -> &[AgeBand] { &self.bands }

  pub fn is_empty(&self) -> bool { self.bands.is_empty() }

  pub fn contains(&self, band: &AgeBand) -> bool { self.bands.contains(band) }

  /// The selected keys as display strings.
  pub fn keys(&self) -> Vec<String> {
    self.bands.iter().map(AgeBand::to_string).collect()
  }

  /// Every individual age covered by any selected bracket.
  pub fn ages(&self) -> BTreeSet<u32> {
    self.bands.iter().flat_map(|b| b.lo..=b.hi).collect()
  }

  /// The composite bands that must be synthesised for the age breakdown.
  pub fn composite_bands(&self) -> impl Iterator<Item = AgeBand> + '_ {
    self.bands.iter().copied().filter(AgeBand::is_composite)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn band(s: &str) -> AgeBand { s.parse().unwrap() }

  #[test]
  fn parses_and_prints_keys() {
    assert_eq!(band("12"), AgeBand::single(12));
    assert_eq!(band("15-19"), ADOLESCENT_BAND);
    assert_eq!(ADOLESCENT_BAND.to_string(), "15-19");
    assert_eq!(AgeBand::single(7).to_string(), "7");
  }

  #[test]
  fn rejects_malformed_keys() {
    assert!("".parse::<AgeBand>().is_err());
    assert!("abc".parse::<AgeBand>().is_err());
    assert!("19-15".parse::<AgeBand>().is_err());
    assert!("-3".parse::<AgeBand>().is_err());
  }

  #[test]
  fn composite_band_sorts_next_to_its_start() {
    let mut keys: Vec<AgeBand> =
      ["16", "15-19", "12", "5", "15"].into_iter().map(band).collect();
    keys.sort();
    let printed: Vec<String> = keys.iter().map(ToString::to_string).collect();
    assert_eq!(printed, ["5", "12", "15", "15-19", "16"]);
  }

  #[test]
  fn age_range_is_inclusive() {
    assert_eq!(age_range(15, 19), ["15", "16", "17", "18", "19"]);
    assert_eq!(age_range(12, 12), ["12"]);
    assert!(age_range(3, 2).is_empty());
  }

  #[test]
  fn clinical_pair_expands_to_three_brackets() {
    let shown = bracket_interval(INDEX_AGE, ADOLESCENT_BAND);
    let keys: Vec<String> = shown.iter().map(ToString::to_string).collect();
    assert_eq!(keys, ["12", "15", "15-19"]);
  }

  #[test]
  fn other_slider_positions_are_kept_as_is() {
    assert_eq!(bracket_interval(INDEX_AGE, INDEX_AGE), vec![INDEX_AGE]);
    assert_eq!(
      bracket_interval(band("15"), ADOLESCENT_BAND),
      vec![band("15"), ADOLESCENT_BAND]
    );
  }

  #[test]
  fn default_selection_covers_twelve_and_fifteen_to_nineteen() {
    let selection = AgeSelection::default();
    assert_eq!(selection.keys(), ["12", "15", "15-19"]);
    let ages: Vec<u32> = selection.ages().into_iter().collect();
    assert_eq!(ages, [12, 15, 16, 17, 18, 19]);
    assert_eq!(selection.composite_bands().collect::<Vec<_>>(), [ADOLESCENT_BAND]);
  }

  #[test]
  fn multiselect_keys_drop_duplicates() {
    let selection = AgeSelection::from_keys(["15-19", "12", "15-19"]).unwrap();
    assert_eq!(selection.keys(), ["15-19", "12"]);
    assert!(AgeSelection::from_keys(["12", "x"]).is_err());
  }

  #[test]
  fn serialises_as_bracket_strings() {
    let json = serde_json::to_string(&AgeSelection::default()).unwrap();
    assert_eq!(json, r#"["12","15","15-19"]"#);
    let back: AgeSelection = serde_json::from_str(&json).unwrap();
    assert_eq!(back, AgeSelection::default());
  }
}
