//! Error type for `tablesync-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] tablesync_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// The engine refused a merge, typically because the identity column has
  /// no PRIMARY KEY or UNIQUE constraint. The engine's message is kept as-is.
  #[error("constraint error on table {table:?}: {source}")]
  Constraint {
    table:  String,
    #[source]
    source: rusqlite::Error,
  },

  #[error("database file {0:?} does not exist")]
  DatabaseMissing(PathBuf),

  #[error("i/o error at {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  /// True when the referenced table or database file does not exist.
  pub fn is_not_found(&self) -> bool {
    match self {
      Self::Core(e) => e.is_not_found(),
      Self::DatabaseMissing(_) => true,
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
