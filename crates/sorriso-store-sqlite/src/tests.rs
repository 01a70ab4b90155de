//! Integration tests for `SqliteSource` against real database files.

use std::path::{Path, PathBuf};

use sorriso_core::{
  age::AgeSelection,
  metric::CpoIndex,
  source::{TableCache, TableSource},
  table::DimensionTable,
  view::{Dimension, Observatory, ViewFilter},
};
use uuid::Uuid;

use crate::{Error, SqliteSource, TableLayout};

/// A database file in the temp directory, removed on drop.
struct TempDb {
  path: PathBuf,
}

impl TempDb {
  fn new() -> Self {
    let path = std::env::temp_dir().join(format!("sorriso-{}.db", Uuid::new_v4()));
    Self { path }
  }

  fn path(&self) -> &Path { &self.path }

  fn execute(&self, sql: &str) {
    let conn = rusqlite::Connection::open(&self.path).expect("open temp db");
    conn.execute_batch(sql).expect("run fixture sql");
  }
}

impl Drop for TempDb {
  fn drop(&mut self) { let _ = std::fs::remove_file(&self.path); }
}

/// The layout of the published database, with its `index` id columns.
const SCHEMA: &str = r#"
CREATE TABLE "CPO_D" (
    "index"               INTEGER,
    escola_id             INTEGER,
    faixa_etaria_id       INTEGER,
    exame_id              INTEGER,
    "C"                   INTEGER,
    "P"                   INTEGER,
    "O"                   INTEGER,
    soma_cpo              INTEGER,
    quantidade_populacao  INTEGER
);
CREATE TABLE "Escola" (
    "index"              INTEGER,
    "escola.nome"        TEXT,
    "escola.território"  TEXT,
    "escola.região"      TEXT
);
CREATE TABLE "Faixa_etaria" ("index" INTEGER, idade INTEGER);
CREATE TABLE "Exame" ("index" INTEGER, "exame.nome" TEXT);
"#;

const ROWS: &str = r#"
INSERT INTO "Escola" VALUES
    (0, 'ESCOLA A', 'KRAHÔ',   'RURAL'),
    (1, 'ESCOLA B', 'APINAJÉ', 'NORTE');
INSERT INTO "Faixa_etaria" VALUES (0, 12), (1, 15), (2, 16);
INSERT INTO "Exame" VALUES (0, 'CPO-D');
INSERT INTO "CPO_D" VALUES
    (0, 0, 0, 0, 2, 1, 1, 4, 10),
    (1, 0, 1, 0, 1, 1, 0, 2, 8),
    (2, 1, 0, 0, 10, 2, 4, 16, 20),
    (3, 1, 2, 0, 4, 1, 3, 8, 4);
"#;

fn seeded() -> TempDb {
  let db = TempDb::new();
  db.execute(SCHEMA);
  db.execute(ROWS);
  db
}

// ─── Loading ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn loads_all_four_tables() {
  let db = seeded();
  let tables = SqliteSource::new(db.path()).load().await.unwrap();

  assert_eq!(tables.fact().len(), 4);
  assert_eq!(tables.schools().len(), 2);
  assert_eq!(tables.age_brackets().len(), 3);
  assert_eq!(tables.exam_types().len(), 1);

  let school = tables.school(0).unwrap();
  assert_eq!(school.name, "ESCOLA A");
  assert_eq!(school.territory, "KRAHÔ");
  assert_eq!(school.region, "RURAL");
  assert_eq!(tables.age_bracket(2).unwrap().age, 16);
  assert_eq!(tables.exam_type(0).unwrap().label, "CPO-D");

  let first = &tables.fact()[0];
  assert_eq!((first.school_id, first.age_bracket_id), (0, 0));
  assert_eq!(first.measures.decayed, 2.0);
  assert_eq!(first.measures.cpo_sum, 4.0);
  assert_eq!(first.measures.population, 10);
}

#[tokio::test]
async fn repeated_loads_are_identical() {
  let db = seeded();
  let source = SqliteSource::new(db.path());
  let a = source.load().await.unwrap();
  let b = source.load().await.unwrap();
  assert_eq!(a.fact(), b.fact());
  assert_eq!(a.schools(), b.schools());
  assert_eq!(a.age_brackets(), b.age_brackets());
}

#[tokio::test]
async fn real_valued_measures_are_accepted() {
  let db = seeded();
  db.execute(r#"UPDATE "CPO_D" SET soma_cpo = 4.5 WHERE "index" = 0"#);
  let tables = SqliteSource::new(db.path()).load().await.unwrap();
  assert_eq!(tables.fact()[0].measures.cpo_sum, 4.5);
}

#[tokio::test]
async fn loading_does_not_touch_the_file() {
  let db = seeded();
  let before = std::fs::read(db.path()).unwrap();
  SqliteSource::new(db.path()).load().await.unwrap();
  assert_eq!(std::fs::read(db.path()).unwrap(), before);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_is_an_open_error() {
  let db = TempDb::new();
  let err = SqliteSource::new(db.path()).load().await.unwrap_err();
  assert!(matches!(err, Error::Open { .. }));
  assert!(!db.path().exists());
}

#[tokio::test]
async fn missing_table_is_reported_by_name() {
  let db = seeded();
  db.execute(r#"DROP TABLE "Exame""#);
  let err = SqliteSource::new(db.path()).load().await.unwrap_err();
  assert!(matches!(err, Error::MissingTable(ref t) if t == "Exame"));
}

#[tokio::test]
async fn missing_column_is_reported_by_name() {
  let db = seeded();
  db.execute(r#"ALTER TABLE "CPO_D" RENAME COLUMN soma_cpo TO soma"#);
  let err = SqliteSource::new(db.path()).load().await.unwrap_err();
  assert!(matches!(
    err,
    Error::MissingColumn { ref table, ref column }
      if table == "CPO_D" && column == "soma_cpo"
  ));
}

#[tokio::test]
async fn negative_population_is_rejected() {
  let db = seeded();
  db.execute(r#"UPDATE "CPO_D" SET quantidade_populacao = -3 WHERE "index" = 2"#);
  let err = SqliteSource::new(db.path()).load().await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidValue { row: 2, value: -3, ref column, .. }
      if column == "quantidade_populacao"
  ));
}

#[tokio::test]
async fn duplicate_school_keys_surface_as_core_errors() {
  let db = seeded();
  db.execute(r#"INSERT INTO "Escola" VALUES (1, 'ESCOLA C', 'X', 'SUL')"#);
  let err = SqliteSource::new(db.path()).load().await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(sorriso_core::Error::DuplicateKey {
      table: DimensionTable::School,
      key: 1
    })
  ));

  // Converting back into the core error unwraps rather than nests.
  let core: sorriso_core::Error = err.into();
  assert!(matches!(core, sorriso_core::Error::DuplicateKey { .. }));
}

#[tokio::test]
async fn source_failures_become_data_source_errors() {
  let db = TempDb::new();
  let err = SqliteSource::new(db.path()).load().await.unwrap_err();
  let core: sorriso_core::Error = err.into();
  assert!(matches!(core, sorriso_core::Error::DataSource(_)));
}

// ─── Layout ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn custom_layout_names_are_honoured() {
  let db = TempDb::new();
  db.execute(
    r#"
    CREATE TABLE exams (school INTEGER, age INTEGER, kind INTEGER,
                        c INTEGER, p INTEGER, o INTEGER, cpo INTEGER, pop INTEGER);
    CREATE TABLE schools (id INTEGER, name TEXT, territory TEXT, region TEXT);
    CREATE TABLE ages (id INTEGER, years INTEGER);
    CREATE TABLE kinds (id INTEGER, label TEXT);
    INSERT INTO schools VALUES (5, 'S', 'T', 'RURAL');
    INSERT INTO ages VALUES (9, 12);
    INSERT INTO kinds VALUES (0, 'CPO-D');
    INSERT INTO exams VALUES (5, 9, 0, 1, 1, 1, 3, 6);
    "#,
  );

  let mut layout = TableLayout::default();
  layout.fact.table = "exams".into();
  layout.fact.school_id = "school".into();
  layout.fact.age_bracket_id = "age".into();
  layout.fact.exam_type_id = "kind".into();
  layout.fact.decayed = "c".into();
  layout.fact.missing = "p".into();
  layout.fact.filled = "o".into();
  layout.fact.cpo_sum = "cpo".into();
  layout.fact.population = "pop".into();
  layout.schools.table = "schools".into();
  layout.schools.id = "id".into();
  layout.schools.name = "name".into();
  layout.schools.territory = "territory".into();
  layout.schools.region = "region".into();
  layout.age_brackets.table = "ages".into();
  layout.age_brackets.id = "id".into();
  layout.age_brackets.age = "years".into();
  layout.exam_types.table = "kinds".into();
  layout.exam_types.id = "id".into();
  layout.exam_types.label = "label".into();

  let tables = SqliteSource::new(db.path())
    .with_layout(layout)
    .load()
    .await
    .unwrap();
  assert_eq!(tables.school(5).unwrap().name, "S");
  assert_eq!(tables.age_bracket(9).unwrap().age, 12);
  assert_eq!(tables.fact()[0].measures.population, 6);
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn cached_load_feeds_the_zone_view() {
  let db = seeded();
  let source = SqliteSource::new(db.path());
  let cache = TableCache::new();

  let tables = cache.get_or_load(&source).await.unwrap();
  assert!(cache.get(&source.source_id()).is_some());

  let obs = Observatory::new(tables);
  let view = obs
    .view(Dimension::Zone, &obs.default_filter(Dimension::Zone))
    .unwrap();

  let rural = &view.by_dimension[0];
  assert_eq!(rural.label, "RURAL");
  assert_eq!(rural.population, 18);
  assert_eq!(rural.cpo_sum, 6.0);
  assert_eq!(rural.cpo_d, CpoIndex::Defined(0.33));

  let nothing = ViewFilter {
    values: Default::default(),
    ages:   AgeSelection::default(),
  };
  let empty = obs.view(Dimension::Zone, &nothing).unwrap();
  assert_eq!(empty.summary.cpo_d, CpoIndex::Undefined);
}
