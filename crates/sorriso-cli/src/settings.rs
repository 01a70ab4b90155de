//! Runtime configuration: an optional TOML file overlaid by `SORRISO_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use sorriso_store_sqlite::TableLayout;

/// Default database file name of the published dataset.
pub const DEFAULT_DATABASE: &str = "observatorio_sorriso";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_database")]
  pub database: PathBuf,
  #[serde(default)]
  pub layout:   TableLayout,
}

fn default_database() -> PathBuf { PathBuf::from(DEFAULT_DATABASE) }

/// Read `path` (if it exists) and the environment.
///
/// Nested keys use a double underscore, e.g.
/// `SORRISO_LAYOUT__FACT__TABLE=CPO_D`.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("SORRISO")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise AppConfig")
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> AppConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_gives_published_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.database, PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(cfg.layout, TableLayout::default());
  }

  #[test]
  fn partial_layout_keeps_remaining_defaults() {
    let cfg = parse(
      r#"
      database = "/data/sorriso.db"

      [layout.fact]
      table = "exames"

      [layout.schools]
      region = "regiao"
      "#,
    );
    assert_eq!(cfg.database, PathBuf::from("/data/sorriso.db"));
    assert_eq!(cfg.layout.fact.table, "exames");
    assert_eq!(cfg.layout.fact.population, "quantidade_populacao");
    assert_eq!(cfg.layout.schools.region, "regiao");
    assert_eq!(cfg.layout.schools.name, "escola.nome");
    assert_eq!(cfg.layout.age_brackets.table, "Faixa_etaria");
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = load(Path::new("/nonexistent/sorriso.toml")).unwrap();
    assert_eq!(cfg.layout, TableLayout::default());
  }
}
