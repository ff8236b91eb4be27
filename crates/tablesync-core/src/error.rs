//! Error types for `tablesync-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("table {0:?} does not exist")]
  TableNotFound(String),

  #[error("table {0:?} already exists")]
  TableExists(String),

  #[error("table {table:?} has no column {column:?}")]
  UnknownColumn { table: String, column: String },

  /// A merge batch did not carry the identity column.
  #[error("batch for table {table:?} is missing identity column {column:?}")]
  MissingIdentity { table: String, column: String },

  #[error(
    "table {table:?} has no PRIMARY KEY or UNIQUE constraint on {column:?}"
  )]
  MissingUniqueConstraint { table: String, column: String },

  #[error("source has no table named {0:?}")]
  UnknownSourceTable(String),

  #[error("base {0:?} not found")]
  BaseNotFound(String),

  #[error("invalid input: {0}")]
  Validation(String),
}

impl Error {
  /// True for errors naming a table, base or container that does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::TableNotFound(_) | Self::BaseNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
