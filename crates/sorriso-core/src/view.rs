//! Per-page views: the canonical pipeline parameterised by the grouping
//! dimension, and the headline overview.
//!
//! Every view re-derives its own join, classification, filter and
//! aggregation from the shared [`BaseTables`]; nothing is cached here.

use std::{collections::BTreeSet, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  age::{AgeBand, AgeSelection},
  aggregate::{Group, aggregate, synthesize_band},
  classify::{classify_region, classify_zones},
  filter::filter_view,
  join::{Attribute, WorkingTable, join_dimensions},
  metric::{CpoIndex, cpo_index},
  table::BaseTables,
};

// ─── Dimension ───────────────────────────────────────────────────────────────

/// What a page groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
  Zone,
  Region,
  Territory,
  School,
}

impl Dimension {
  pub const ALL: [Self; 4] =
    [Self::Zone, Self::Region, Self::Territory, Self::School];

  /// The working-table column grouped on.
  pub fn attribute(&self) -> Attribute {
    match self {
      Self::Zone => Attribute::Zone,
      Self::Region => Attribute::Region,
      Self::Territory => Attribute::Territory,
      Self::School => Attribute::School,
    }
  }

  /// The stored column the grouping column is joined from.
  fn joined_attribute(&self) -> Attribute {
    match self {
      Self::Zone => Attribute::Region,
      other => other.attribute(),
    }
  }
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Zone => "zone",
      Self::Region => "region",
      Self::Territory => "territory",
      Self::School => "school",
    })
  }
}

impl FromStr for Dimension {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|d| d.to_string().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| Error::UnknownDimension(s.to_owned()))
  }
}

// ─── Filter input ────────────────────────────────────────────────────────────

/// The user's selection for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
  /// Dimension values to keep.
  pub values: BTreeSet<String>,
  /// Age brackets to keep and display.
  pub ages:   AgeSelection,
}

impl ViewFilter {
  /// `true` when nothing can match.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty() || self.ages.is_empty()
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One row of the per-dimension table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRow {
  pub label:      String,
  #[serde(rename = "Cariados")]
  pub decayed:    f64,
  #[serde(rename = "Perdidos")]
  pub missing:    f64,
  #[serde(rename = "Obturados")]
  pub filled:     f64,
  #[serde(rename = "soma_cpo")]
  pub cpo_sum:    f64,
  #[serde(rename = "quantidade_populacao")]
  pub population: u64,
  #[serde(rename = "cpo-d")]
  pub cpo_d:      CpoIndex,
}

/// One row of the per-(dimension, age bracket) table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionAgeRow {
  pub label:      String,
  #[serde(rename = "idade")]
  pub age:        AgeBand,
  #[serde(rename = "Cariados")]
  pub decayed:    f64,
  #[serde(rename = "Perdidos")]
  pub missing:    f64,
  #[serde(rename = "Obturados")]
  pub filled:     f64,
  #[serde(rename = "soma_cpo")]
  pub cpo_sum:    f64,
  #[serde(rename = "quantidade_populacao")]
  pub population: u64,
  #[serde(rename = "cpo-d")]
  pub cpo_d:      CpoIndex,
}

/// Headline figures shown above a page's charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
  /// The analysed bracket keys, in display order.
  pub ages:       Vec<String>,
  #[serde(rename = "quantidade_populacao")]
  pub population: u64,
  /// Undefined when the selection is empty or nobody was examined.
  #[serde(rename = "cpo-d")]
  pub cpo_d:      CpoIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionView {
  pub dimension:        Dimension,
  pub summary:          ViewSummary,
  /// Ordered by label.
  pub by_dimension:     Vec<DimensionRow>,
  /// Ordered by age bracket, then label.
  pub by_dimension_age: Vec<DimensionAgeRow>,
}

impl DimensionView {
  /// `true` when the selection matched no rows.
  pub fn is_empty(&self) -> bool { self.by_dimension.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
  pub region:     String,
  #[serde(rename = "quantidade_populacao")]
  pub population: u64,
}

/// Landing-page figures over the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
  /// Examined population per region label, ordered by label.
  pub population_by_region: Vec<RegionCount>,
  pub total_population:     u64,
  #[serde(rename = "cpo-d")]
  pub cpo_d:                CpoIndex,
  pub schools:              usize,
  pub territories:          usize,
  pub regions:              usize,
}

// ─── Observatory ─────────────────────────────────────────────────────────────

/// Entry point for the presentation layer: owns a handle to the loaded
/// tables and derives views from them on demand.
///
/// Cloning is cheap; the tables are shared.
#[derive(Debug, Clone)]
pub struct Observatory {
  tables: Arc<BaseTables>,
}

impl Observatory {
  pub fn new(tables: Arc<BaseTables>) -> Self { Self { tables } }

  pub fn tables(&self) -> &BaseTables { &self.tables }

  /// Distinct values of `dimension`, in school-table order of first
  /// appearance.
  pub fn options(&self, dimension: Dimension) -> Vec<String> {
    let mut seen = BTreeSet::new();
    self
      .tables
      .schools()
      .iter()
      .map(|s| match dimension {
        Dimension::Zone => classify_region(&s.region).as_str().to_owned(),
        Dimension::Region => s.region.clone(),
        Dimension::Territory => s.territory.clone(),
        Dimension::School => s.name.clone(),
      })
      .filter(|value| seen.insert(value.clone()))
      .collect()
  }

  /// Every value of `dimension` and the default age brackets.
  pub fn default_filter(&self, dimension: Dimension) -> ViewFilter {
    ViewFilter {
      values: self.options(dimension).into_iter().collect(),
      ages:   AgeSelection::default(),
    }
  }

  /// The joined, classified table a `dimension` page works from, with
  /// columns `[dimension, age]`.
  pub fn working_table(&self, dimension: Dimension) -> Result<WorkingTable> {
    let joined = join_dimensions(
      &self.tables,
      &[dimension.joined_attribute(), Attribute::Age],
    )?;
    match dimension {
      Dimension::Zone => classify_zones(joined),
      _ => Ok(joined),
    }
  }

  /// Run the full pipeline for one page.
  pub fn view(
    &self,
    dimension: Dimension,
    filter: &ViewFilter,
  ) -> Result<DimensionView> {
    let attr = dimension.attribute();
    let working = self.working_table(dimension)?;
    let filtered = filter_view(&working, attr, &filter.values, &filter.ages)?;

    let by_dimension: Vec<DimensionRow> = aggregate(&filtered, &[attr])?
      .into_groups()
      .into_iter()
      .map(dimension_row)
      .collect();

    let mut by_age = aggregate(&filtered, &[attr, Attribute::Age])?;
    for band in filter.ages.composite_bands() {
      by_age = synthesize_band(by_age, band)?;
    }
    by_age.retain(|g| {
      g.key[1].as_age().is_some_and(|age| filter.ages.contains(&age))
    });

    let mut by_dimension_age: Vec<DimensionAgeRow> = by_age
      .into_groups()
      .into_iter()
      .filter_map(dimension_age_row)
      .collect();
    by_dimension_age
      .sort_by(|a, b| a.age.cmp(&b.age).then_with(|| a.label.cmp(&b.label)));

    let summary = summarise(&filter.ages, &by_dimension, filter.is_empty());

    tracing::debug!(
      %dimension,
      groups = by_dimension.len(),
      age_groups = by_dimension_age.len(),
      cpo_d = %summary.cpo_d,
      "built dimension view"
    );

    Ok(DimensionView { dimension, summary, by_dimension, by_dimension_age })
  }

  /// The landing-page figures.
  pub fn overview(&self) -> Result<Overview> {
    let joined = join_dimensions(&self.tables, &[Attribute::Region])?;
    let population_by_region = aggregate(&joined, &[Attribute::Region])?
      .into_groups()
      .into_iter()
      .map(|g| RegionCount {
        region:     g.key[0].to_string(),
        population: g.measures.population,
      })
      .collect();

    let totals = self.tables.totals();
    let schools = self.tables.schools();
    let territories: BTreeSet<&str> =
      schools.iter().map(|s| s.territory.as_str()).collect();
    let regions: BTreeSet<&str> =
      schools.iter().map(|s| s.region.as_str()).collect();

    Ok(Overview {
      population_by_region,
      total_population: totals.population,
      cpo_d: cpo_index(totals.cpo_sum, totals.population),
      schools: schools.len(),
      territories: territories.len(),
      regions: regions.len(),
    })
  }
}

fn dimension_row(group: Group) -> DimensionRow {
  let cpo_d = group.cpo_d();
  let m = group.measures;
  DimensionRow {
    label: group.key[0].to_string(),
    decayed: m.decayed,
    missing: m.missing,
    filled: m.filled,
    cpo_sum: m.cpo_sum,
    population: m.population,
    cpo_d,
  }
}

fn dimension_age_row(group: Group) -> Option<DimensionAgeRow> {
  let cpo_d = group.cpo_d();
  let m = group.measures;
  Some(DimensionAgeRow {
    label: group.key[0].to_string(),
    age: group.key[1].as_age()?,
    decayed: m.decayed,
    missing: m.missing,
    filled: m.filled,
    cpo_sum: m.cpo_sum,
    population: m.population,
    cpo_d,
  })
}

fn summarise(
  ages: &AgeSelection,
  rows: &[DimensionRow],
  empty: bool,
) -> ViewSummary {
  if empty {
    return ViewSummary {
      ages:       ages.keys(),
      population: 0,
      cpo_d:      CpoIndex::Undefined,
    };
  }
  let population = rows.iter().map(|r| r.population).sum();
  let cpo_sum = rows.iter().map(|r| r.cpo_sum).sum();
  ViewSummary {
    ages: ages.keys(),
    population,
    cpo_d: cpo_index(cpo_sum, population),
  }
}
