//! Identity-keyed merge of a [`Batch`] into an existing table.
//!
//! One statement is prepared for the batch and executed once per row, in
//! batch order, inside a single transaction. A later row with the same
//! identity as an earlier one overwrites it. The statement only names the
//! batch's columns, so any other column of the table is left as it was.

use rusqlite::{Connection, ErrorCode};
use tracing::debug;

use tablesync_core::Batch;

use crate::{
  Error, Result,
  encode::params,
  schema::{insert_sql, quote_ident, table_columns, table_exists},
  writer::ensure_known_columns,
};

pub fn upsert(
  conn: &mut Connection,
  table: &str,
  identity: &str,
  batch: &Batch,
) -> Result<usize> {
  if !table_exists(conn, table)? {
    return Err(tablesync_core::Error::TableNotFound(table.to_owned()).into());
  }
  if batch.is_empty() {
    return Ok(0);
  }
  if batch.column_index(identity).is_none() {
    return Err(
      tablesync_core::Error::MissingIdentity {
        table:  table.to_owned(),
        column: identity.to_owned(),
      }
      .into(),
    );
  }
  let existing = table_columns(conn, table)?;
  ensure_known_columns(table, &existing, batch.columns())?;

  let sql = upsert_sql(table, identity, batch.columns());
  let tx = conn.transaction()?;
  {
    let mut stmt = tx.prepare(&sql).map_err(|e| classify(table, e))?;
    for row in batch.rows() {
      stmt.execute(params(row)).map_err(|e| classify(table, e))?;
    }
  }
  tx.commit()?;

  debug!(table, rows = batch.len(), "upserted batch");
  Ok(batch.len())
}

/// `INSERT … ON CONFLICT(identity) DO UPDATE SET c = excluded.c, …` for every
/// non-identity column, or `… ON CONFLICT(identity) DO NOTHING` when the
/// identity is the only column. Both forms are rejected by SQLite unless the
/// identity column carries a PRIMARY KEY or UNIQUE constraint.
pub fn upsert_sql(table: &str, identity: &str, columns: &[String]) -> String {
  let updates = columns
    .iter()
    .filter(|c| !c.eq_ignore_ascii_case(identity))
    .map(|c| {
      let q = quote_ident(c);
      format!("{q} = excluded.{q}")
    })
    .collect::<Vec<_>>();

  if updates.is_empty() {
    return format!(
      "{} ON CONFLICT({}) DO NOTHING",
      insert_sql("INSERT", table, columns),
      quote_ident(identity)
    );
  }
  format!(
    "{} ON CONFLICT({}) DO UPDATE SET {}",
    insert_sql("INSERT", table, columns),
    quote_ident(identity),
    updates.join(", ")
  )
}

/// Engine refusals tied to the table's constraints become
/// [`Error::Constraint`]; everything else stays a plain database error.
fn classify(table: &str, e: rusqlite::Error) -> Error {
  let constraint = match &e {
    rusqlite::Error::SqliteFailure(_, Some(msg))
      if msg.contains("does not match any PRIMARY KEY or UNIQUE constraint") =>
    {
      true
    }
    other => other.sqlite_error_code() == Some(ErrorCode::ConstraintViolation),
  };
  if constraint {
    Error::Constraint { table: table.to_owned(), source: e }
  } else {
    Error::Database(e)
  }
}
