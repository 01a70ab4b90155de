//! A small, hand-checked dataset shared by the unit tests.
//!
//! | school | region | territory | ages (population)              |
//! |--------|--------|-----------|--------------------------------|
//! | A (0)  | RURAL  | KRAHÔ     | 12 (10), 15 (8)                |
//! | B (1)  | NORTE  | APINAJÉ   | 12 (20), 14 (5), 15 (10), 16 (4) |
//! | C (2)  | SUL    | APINAJÉ   | 12 (6), 19 (2), 17 (0)         |

use crate::table::{AgeBracket, BaseTables, ExamRecord, ExamType, Measures, School};

pub const TOTAL_POPULATION: u64 = 65;
pub const TOTAL_CPO_SUM: f64 = 56.0;

pub fn school(id: i64, name: &str, territory: &str, region: &str) -> School {
  School {
    id,
    name: name.into(),
    territory: territory.into(),
    region: region.into(),
  }
}

/// `cpo` is `[C, P, O, soma_cpo]`.
pub fn record(
  school_id: i64,
  age_bracket_id: i64,
  population: u64,
  cpo: [f64; 4],
) -> ExamRecord {
  ExamRecord {
    school_id,
    age_bracket_id,
    exam_type_id: 0,
    measures: Measures {
      decayed: cpo[0],
      missing: cpo[1],
      filled: cpo[2],
      cpo_sum: cpo[3],
      population,
    },
  }
}

pub fn age_brackets() -> Vec<AgeBracket> {
  [12, 14, 15, 16, 17, 18, 19]
    .into_iter()
    .enumerate()
    .map(|(id, age)| AgeBracket { id: id as i64, age })
    .collect()
}

pub fn tables() -> BaseTables {
  let schools = vec![
    school(0, "ESCOLA A", "KRAHÔ", "RURAL"),
    school(1, "ESCOLA B", "APINAJÉ", "NORTE"),
    school(2, "ESCOLA C", "APINAJÉ", "SUL"),
  ];

  let fact = vec![
    record(0, 0, 10, [2.0, 1.0, 1.0, 4.0]),
    record(0, 2, 8, [1.0, 1.0, 0.0, 2.0]),
    record(1, 0, 20, [10.0, 2.0, 4.0, 16.0]),
    record(1, 1, 5, [3.0, 0.0, 2.0, 5.0]),
    record(1, 2, 10, [6.0, 2.0, 4.0, 12.0]),
    record(1, 3, 4, [4.0, 1.0, 3.0, 8.0]),
    record(2, 0, 6, [2.0, 0.0, 1.0, 3.0]),
    record(2, 6, 2, [3.0, 1.0, 2.0, 6.0]),
    record(2, 4, 0, [0.0, 0.0, 0.0, 0.0]),
  ];

  let exam_types = vec![ExamType { id: 0, label: "CPO-D".into() }];

  BaseTables::new(fact, schools, age_brackets(), exam_types)
    .expect("fixture tables are valid")
}
