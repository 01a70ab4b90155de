//! `sorriso`: prints Observatório do Sorriso views as JSON.
//!
//! Reads `sorriso.toml` (or the path given with `--config`), loads the four
//! tables from the SQLite database once, runs the requested view and writes
//! it to stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! sorriso overview
//! sorriso options territory
//! sorriso view zone
//! sorriso view region --value NORTE --value SUL --ages 12,15-19
//! sorriso view school --from 12 --to 15-19
//! ```

mod settings;

use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sorriso_core::{
  age::{AgeBand, AgeSelection},
  source::TableCache,
  view::{Dimension, Observatory, ViewFilter},
};
use sorriso_store_sqlite::SqliteSource;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Observatório do Sorriso CPO-D views")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sorriso.toml")]
  config: PathBuf,

  /// SQLite database file; overrides the configured one.
  #[arg(short, long)]
  database: Option<PathBuf>,

  /// Pretty-print the JSON output.
  #[arg(long)]
  pretty: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Landing-page figures over the whole dataset.
  Overview,

  /// The values a dimension can be filtered on.
  Options {
    /// zone, region, territory or school.
    dimension: Dimension,
  },

  /// Per-dimension and per-(dimension, age) tables for one page.
  View {
    /// zone, region, territory or school.
    dimension: Dimension,

    /// Dimension value to keep; repeat for several. Defaults to all.
    #[arg(long = "value", value_name = "VALUE")]
    values: Vec<String>,

    /// Age brackets to keep, e.g. `12,15-19`.
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["from", "to"])]
    ages: Option<Vec<String>>,

    /// Lower end of the age slider.
    #[arg(long, requires = "to")]
    from: Option<AgeBand>,

    /// Upper end of the age slider.
    #[arg(long, requires = "from")]
    to: Option<AgeBand>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = settings::load(&cli.config)?;
  if let Some(database) = cli.database {
    cfg.database = database;
  }

  let source = SqliteSource::new(&cfg.database).with_layout(cfg.layout);
  let cache = TableCache::new();
  let tables = cache
    .get_or_load(&source)
    .await
    .with_context(|| format!("failed to load tables from {:?}", cfg.database))?;
  let observatory = Observatory::new(tables);

  match cli.command {
    Command::Overview => {
      let overview = observatory.overview().context("overview failed")?;
      emit(&overview, cli.pretty)
    }
    Command::Options { dimension } => emit(&observatory.options(dimension), cli.pretty),
    Command::View { dimension, values, ages, from, to } => {
      let mut filter = observatory.default_filter(dimension);
      if !values.is_empty() {
        filter.values = values.into_iter().collect();
      }
      filter.ages = match (ages, from, to) {
        (Some(keys), _, _) => {
          AgeSelection::from_keys(&keys).context("invalid --ages")?
        }
        (None, Some(lo), Some(hi)) => AgeSelection::from_interval(lo, hi),
        _ => filter.ages,
      };
      run_view(&observatory, dimension, &filter, cli.pretty)
    }
  }
}

fn run_view(
  observatory: &Observatory,
  dimension: Dimension,
  filter: &ViewFilter,
  pretty: bool,
) -> anyhow::Result<()> {
  let view = observatory
    .view(dimension, filter)
    .with_context(|| format!("{dimension} view failed"))?;
  if view.is_empty() {
    tracing::warn!(%dimension, "selection matched no rows");
  }
  emit(&view, pretty)
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
  let json = if pretty {
    serde_json::to_string_pretty(value)?
  } else {
    serde_json::to_string(value)?
  };
  let mut stdout = std::io::stdout().lock();
  writeln!(stdout, "{json}").context("failed to write output")?;
  Ok(())
}
