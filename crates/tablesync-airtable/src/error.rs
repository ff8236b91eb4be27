//! Error type for `tablesync-airtable`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] tablesync_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status.
  #[error("{request} → {status}")]
  Status {
    request: String,
    status:  reqwest::StatusCode,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
