//! tablesync command-line driver.
//!
//! Reads `tablesync.toml` (or the path given with `--config`), connects to the
//! configured Airtable base, and lands its tables in a local SQLite file.
//!
//! ```text
//! tablesync --config crm.toml sync --mode merge --table Contacts
//! tablesync --config crm.toml inspect Contacts
//! tablesync --config crm.toml tables
//! ```

mod config;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tablesync_airtable::AirtableSource;
use tablesync_core::{
  source::TableSource,
  store::{SchemaInspector, TableStore},
  sync::{SyncMode, sync_batch},
};
use tablesync_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::config::SyncConfig;

#[derive(Parser)]
#[command(author, version, about = "Sync Airtable tables into a local SQLite database")]
struct Cli {
  /// Path to the configuration file (TOML, JSON or YAML).
  #[arg(short, long, default_value = "tablesync.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch tables from the source and land them in the database (default).
  Sync {
    /// Overrides the configured mode: `merge` or `replace`.
    #[arg(long)]
    mode:   Option<SyncMode>,
    /// Table to sync; repeat for several. Overrides the configured list.
    #[arg(long = "table", value_name = "NAME")]
    tables: Vec<String>,
  },
  /// Print the columns and row count of a local table.
  Inspect { table: String },
  /// List the tables in the configured base.
  Tables,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = SyncConfig::load(&cli.config)?;

  match cli.command.unwrap_or(Command::Sync { mode: None, tables: Vec::new() }) {
    Command::Sync { mode, tables } => {
      run_sync(&cfg, mode.unwrap_or(cfg.mode), &tables).await
    }
    Command::Inspect { table } => inspect(&cfg, &table),
    Command::Tables => list_tables(&cfg).await,
  }
}

fn open_store(cfg: &SyncConfig) -> anyhow::Result<SqliteStore> {
  let path = cfg.database_path();
  let store = SqliteStore::open(&path, cfg.create_if_missing)
    .with_context(|| format!("failed to open database at {}", path.display()))?;
  info!(path = %path.display(), "opened database");
  Ok(store.with_identity_column(cfg.identity_column.clone()))
}

async fn connect(cfg: &SyncConfig) -> anyhow::Result<AirtableSource> {
  AirtableSource::connect(&cfg.airtable)
    .await
    .with_context(|| format!("failed to connect to base {:?}", cfg.airtable.base_name))
}

async fn run_sync(cfg: &SyncConfig, mode: SyncMode, tables: &[String]) -> anyhow::Result<()> {
  // Open the store first so a missing database fails before any network I/O.
  let mut store = open_store(cfg)?;
  let source = connect(cfg).await?;

  let selected = if !tables.is_empty() {
    Some(tables)
  } else if !cfg.tables.is_empty() {
    Some(cfg.tables.as_slice())
  } else {
    None
  };

  let batches = source
    .read_all_tables(selected)
    .await
    .context("failed to read source tables")?;

  let mut total = 0;
  for (name, batch) in &batches {
    let declared = source.column_types(name)?;
    let report = sync_batch(&mut store, name, batch, &declared, mode)
      .with_context(|| format!("failed to sync table {name:?}"))?;
    total += report.rows;
  }

  info!(tables = batches.len(), rows = total, %mode, "sync complete");
  Ok(())
}

/// Print a local table's columns and row count. The count comes from a
/// full [`TableStore::read_table`], so this reads every row of the table.
fn inspect(cfg: &SyncConfig, table: &str) -> anyhow::Result<()> {
  let mut store = open_store(cfg)?;
  let columns = store
    .existing_columns(table)
    .with_context(|| format!("failed to inspect table {table:?}"))?;
  let rows = store.read_table(table)?.len();

  println!("{table} ({rows} rows)");
  for column in columns {
    println!("  {column}");
  }
  Ok(())
}

async fn list_tables(cfg: &SyncConfig) -> anyhow::Result<()> {
  let source = connect(cfg).await?;
  for name in source.table_names() {
    println!("{name}");
  }
  Ok(())
}
