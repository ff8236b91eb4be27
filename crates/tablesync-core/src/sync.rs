//! The sync driver: land one source batch in a store.
//!
//! `Replace` rewrites the destination wholesale through
//! [`TableStore::write_table`]. `Merge` creates the table if needed (with the
//! identity column as primary key), reconciles columns, then upserts.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info;

use crate::{
  Batch, ColumnType,
  migrate::reconcile,
  store::{ConflictPolicy, Storage, TableStore, UpsertEngine},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SyncMode {
  /// Drop and rewrite the destination table from the batch.
  Replace,
  /// Insert new identifiers and update existing ones in place.
  #[default]
  Merge,
}

/// Outcome of syncing one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
  pub table:          String,
  pub mode:           SyncMode,
  /// True if the destination did not exist before this run.
  pub created:        bool,
  pub added_columns:  Vec<String>,
  pub rows:           usize,
}

/// One type per batch column: the declared type where `declared` names the
/// column, otherwise the type inferred from the data.
pub fn resolve_types(batch: &Batch, declared: &[(String, ColumnType)]) -> Vec<(String, ColumnType)> {
  batch
    .columns()
    .iter()
    .zip(batch.inferred_types())
    .map(|(column, inferred)| {
      let ty = declared
        .iter()
        .find(|(name, _)| name == column)
        .map_or(inferred, |(_, ty)| *ty);
      (column.clone(), ty)
    })
    .collect()
}

/// Land `batch` in `table` according to `mode`.
pub fn sync_batch<S: Storage>(
  store: &mut S,
  table: &str,
  batch: &Batch,
  declared: &[(String, ColumnType)],
  mode: SyncMode,
) -> Result<SyncReport, <S as TableStore>::Error> {
  let created = !store.table_exists(table)?;
  let mut report = SyncReport {
    table: table.to_owned(),
    mode,
    created,
    ..SyncReport::default()
  };

  match mode {
    SyncMode::Replace => {
      store.write_table(table, batch, ConflictPolicy::Replace)?;
    }
    SyncMode::Merge => {
      let wanted = resolve_types(batch, declared);
      if created {
        let identity = store.identity_column().to_owned();
        store.create_table(table, &wanted, Some(&identity))?;
      } else {
        report.added_columns = reconcile(store, table, &wanted)?;
      }
      store.upsert(table, batch)?;
    }
  }

  report.rows = batch.len();
  info!(
    table,
    %mode,
    created = report.created,
    added_columns = report.added_columns.len(),
    rows = report.rows,
    "synced table"
  );
  Ok(report)
}
