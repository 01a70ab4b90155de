//! Group-by-and-sum over a [`WorkingTable`], plus synthesis of composite age
//! bands on top of a per-age aggregate.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  age::AgeBand,
  join::{Attribute, KeyValue, WorkingTable},
  metric::{CpoIndex, cpo_index},
  table::Measures,
};

/// One output row of [`aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
  /// One value per grouping column, in grouping order.
  pub key:      Vec<KeyValue>,
  pub measures: Measures,
}

impl Group {
  pub fn cpo_d(&self) -> CpoIndex {
    cpo_index(self.measures.cpo_sum, self.measures.population)
  }
}

/// Groups ordered by key, one per distinct key combination seen in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
  keys:   Vec<Attribute>,
  groups: Vec<Group>,
}

impl GroupedTable {
  pub fn keys(&self) -> &[Attribute] { &self.keys }

  pub fn groups(&self) -> &[Group] { &self.groups }

  pub fn into_groups(self) -> Vec<Group> { self.groups }

  pub fn len(&self) -> usize { self.groups.len() }

  pub fn is_empty(&self) -> bool { self.groups.is_empty() }

  /// Sum of the measures of every group.
  pub fn totals(&self) -> Measures {
    self.groups.iter().fold(Measures::default(), |mut acc, g| {
      acc += g.measures;
      acc
    })
  }

  pub fn retain(&mut self, keep: impl FnMut(&Group) -> bool) {
    self.groups.retain(keep);
  }

  fn key_index(&self, attr: Attribute) -> Result<usize> {
    self
      .keys
      .iter()
      .position(|k| *k == attr)
      .ok_or(Error::MissingColumn(attr))
  }
}

/// Partition `table` by the values of `group_keys` and sum the measures of
/// each part.
///
/// Every input row lands in exactly one group and no group is emitted for a
/// combination absent from the input, so the totals of the output equal the
/// totals of the input.
pub fn aggregate(
  table: &WorkingTable,
  group_keys: &[Attribute],
) -> Result<GroupedTable> {
  let positions = group_keys
    .iter()
    .map(|k| table.column_index(*k))
    .collect::<Result<Vec<_>>>()?;

  let mut sums: BTreeMap<Vec<KeyValue>, Measures> = BTreeMap::new();
  for row in table.rows() {
    let key = positions.iter().map(|&i| row.values[i].clone()).collect();
    *sums.entry(key).or_default() += row.measures;
  }

  let groups = sums
    .into_iter()
    .map(|(key, measures)| Group { key, measures })
    .collect();

  Ok(GroupedTable { keys: group_keys.to_vec(), groups })
}

/// Add one group per outer key holding the sums of that outer key's
/// single-age groups that fall inside `band`.
///
/// This is a union, not a re-partition: the per-age groups stay in place, so
/// their rows are counted both under their own age and under `band`. Outer
/// keys with no age inside `band` get no synthesised group.
pub fn synthesize_band(
  grouped: GroupedTable,
  band: AgeBand,
) -> Result<GroupedTable> {
  let age_idx = grouped.key_index(Attribute::Age)?;
  let GroupedTable { keys, groups } = grouped;

  let mut sums: BTreeMap<Vec<KeyValue>, Measures> = BTreeMap::new();
  for group in &groups {
    match group.key[age_idx] {
      KeyValue::Age(age) if !age.is_composite() && band.contains(age.lower()) => {
        let mut outer = group.key.clone();
        outer[age_idx] = KeyValue::Age(band);
        *sums.entry(outer).or_default() += group.measures;
      }
      _ => {}
    }
  }

  let mut merged: BTreeMap<Vec<KeyValue>, Measures> = groups
    .into_iter()
    .map(|g| (g.key, g.measures))
    .collect();
  for (key, measures) in sums {
    merged.entry(key).or_insert(measures);
  }

  let groups = merged
    .into_iter()
    .map(|(key, measures)| Group { key, measures })
    .collect();

  Ok(GroupedTable { keys, groups })
}
