//! Bulk load of a whole [`Batch`] under a [`ConflictPolicy`].
//!
//! Every policy runs inside one transaction: a failure part-way through rolls
//! back the drop, the create and every inserted row.

use rusqlite::{Connection, Transaction};
use tracing::{debug, info};

use tablesync_core::{Batch, ColumnType, store::ConflictPolicy};

use crate::{
  Result,
  encode::params,
  schema::{create_table_sql, insert_sql, quote_ident, table_columns, table_exists},
};

pub fn write_table(
  conn: &mut Connection,
  name: &str,
  data: &Batch,
  policy: ConflictPolicy,
) -> Result<()> {
  if data.columns().is_empty() {
    return Err(
      tablesync_core::Error::Validation(format!(
        "cannot write a batch with no columns to table {name:?}"
      ))
      .into(),
    );
  }

  let exists = table_exists(conn, name)?;
  if exists && policy == ConflictPolicy::Fail {
    return Err(tablesync_core::Error::TableExists(name.to_owned()).into());
  }

  let tx = conn.transaction()?;
  match (policy, exists) {
    (ConflictPolicy::Replace, true) => {
      tx.execute_batch(&format!("DROP TABLE {}", quote_ident(name)))?;
      info!(table = name, "dropped table for replace");
      create_from_batch(&tx, name, data)?;
    }
    (ConflictPolicy::Append, true) => {
      let existing = table_columns(&tx, name)?;
      ensure_known_columns(name, &existing, data.columns())?;
    }
    _ => create_from_batch(&tx, name, data)?,
  }
  insert_rows(&tx, name, data)?;
  tx.commit()?;

  debug!(table = name, %policy, rows = data.len(), "wrote table");
  Ok(())
}

fn create_from_batch(tx: &Transaction<'_>, name: &str, data: &Batch) -> Result<()> {
  let columns: Vec<(String, ColumnType)> = data
    .columns()
    .iter()
    .cloned()
    .zip(data.inferred_types())
    .collect();
  tx.execute_batch(&create_table_sql(name, &columns, None))?;
  info!(table = name, columns = columns.len(), "created table");
  Ok(())
}

fn insert_rows(tx: &Transaction<'_>, name: &str, data: &Batch) -> Result<()> {
  let mut stmt = tx.prepare(&insert_sql("INSERT", name, data.columns()))?;
  for row in data.rows() {
    stmt.execute(params(row))?;
  }
  Ok(())
}

/// Every column in `wanted` must already be part of the table. Names compare
/// ignoring ASCII case, as SQLite resolves them.
pub fn ensure_known_columns<S: AsRef<str>>(
  table: &str,
  existing: &[String],
  wanted: &[S],
) -> Result<()> {
  match wanted
    .iter()
    .map(|w| w.as_ref())
    .find(|w| !existing.iter().any(|e| e.eq_ignore_ascii_case(w)))
  {
    Some(column) => Err(
      tablesync_core::Error::UnknownColumn {
        table:  table.to_owned(),
        column: column.to_owned(),
      }
      .into(),
    ),
    None => Ok(()),
  }
}
