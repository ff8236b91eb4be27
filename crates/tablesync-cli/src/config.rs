//! Configuration file loading.
//!
//! The file named on the command line is required; its format follows its
//! extension (`.json`, `.toml`, `.yaml`). Environment variables prefixed with
//! `TABLESYNC_` override it, with `__` separating nested keys, e.g.
//! `TABLESYNC_AIRTABLE__API_TOKEN`.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use serde::Deserialize;
use tablesync_airtable::AirtableConfig;
use tablesync_core::sync::SyncMode;

fn default_true() -> bool { true }

fn default_identity() -> String { "id".to_owned() }

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// SQLite file to sync into. A leading `~/` is expanded.
  pub database_path:     PathBuf,
  #[serde(default = "default_true")]
  pub create_if_missing: bool,
  #[serde(default = "default_identity")]
  pub identity_column:   String,
  #[serde(default)]
  pub mode:              SyncMode,
  /// Tables to sync; empty means every table in the base.
  #[serde(default)]
  pub tables:            Vec<String>,
  pub airtable:          AirtableConfig,
}

impl SyncConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    if !path.is_file() {
      bail!("config file {} does not exist", path.display());
    }

    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(true))
      .add_source(
        config::Environment::with_prefix("TABLESYNC")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise SyncConfig")
  }

  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
