//! The storage contract: [`TableStore`], [`SchemaInspector`] and
//! [`UpsertEngine`].
//!
//! Implemented by storage backends (e.g. `tablesync-store-sqlite`, or
//! [`crate::memory::MemoryStore`]). Reconciliation and the sync driver depend
//! on these traits, not on any concrete backend.
//!
//! Every method takes `&mut self`: a backend owns a single connection and is
//! used by one caller at a time. Callers that need concurrency construct one
//! store per worker or serialise access themselves.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Batch, ColumnType, Row};

/// What [`TableStore::write_table`] does when the target table already
/// exists.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConflictPolicy {
  /// Refuse to touch a pre-existing table. An absent table is created.
  #[default]
  Fail,
  /// Drop the table and recreate it with exactly the batch's columns.
  Replace,
  /// Insert after the existing rows; every batch column must already exist.
  Append,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Whole-table reads and writes plus single-row and single-column additions.
pub trait TableStore {
  type Error: std::error::Error + From<crate::Error>;

  fn table_exists(&mut self, name: &str) -> Result<bool, Self::Error>;

  /// Every row of `name`, in storage order.
  fn read_table(&mut self, name: &str) -> Result<Batch, Self::Error>;

  /// Bulk-load `data` into `name` under `policy`.
  fn write_table(
    &mut self,
    name: &str,
    data: &Batch,
    policy: ConflictPolicy,
  ) -> Result<(), Self::Error>;

  /// Insert one row, using its keys as the column list.
  fn add_row(&mut self, name: &str, row: &Row) -> Result<(), Self::Error>;

  /// Additive, non-destructive schema change.
  fn add_column(
    &mut self,
    name: &str,
    column: &str,
    column_type: ColumnType,
  ) -> Result<(), Self::Error>;

  /// Create an empty table. When `identity` is given, that column is declared
  /// the primary key, which [`UpsertEngine::upsert`] relies on.
  fn create_table(
    &mut self,
    name: &str,
    columns: &[(String, ColumnType)],
    identity: Option<&str>,
  ) -> Result<(), Self::Error>;
}

/// Read-only view of a table's column set.
pub trait SchemaInspector {
  type Error: std::error::Error + From<crate::Error>;

  /// Column names in declaration order.
  fn existing_columns(&mut self, name: &str) -> Result<Vec<String>, Self::Error>;

  /// Per-column presence, aligned positionally with `wanted`. Names compare
  /// ignoring ASCII case.
  fn has_columns<S: AsRef<str>>(
    &mut self,
    name: &str,
    wanted: &[S],
  ) -> Result<Vec<bool>, Self::Error> {
    let existing = self.existing_columns(name)?;
    Ok(
      wanted
        .iter()
        .map(|w| existing.iter().any(|e| e.eq_ignore_ascii_case(w.as_ref())))
        .collect(),
    )
  }
}

/// Insert-or-update-in-place keyed by the store's identity column.
pub trait UpsertEngine {
  type Error: std::error::Error + From<crate::Error>;

  /// The column incoming rows are matched on (conventionally `id`).
  fn identity_column(&self) -> &str;

  /// Merge `batch` into `name` atomically. Returns the number of rows
  /// submitted. Never deletes.
  fn upsert(&mut self, name: &str, batch: &Batch) -> Result<usize, Self::Error>;
}

/// A backend providing the whole contract with one error type.
pub trait Storage:
  TableStore
  + SchemaInspector<Error = <Self as TableStore>::Error>
  + UpsertEngine<Error = <Self as TableStore>::Error>
{
}

impl<T> Storage for T where
  T: TableStore
    + SchemaInspector<Error = <T as TableStore>::Error>
    + UpsertEngine<Error = <T as TableStore>::Error>
{
}
