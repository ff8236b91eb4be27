//! [`SqliteStore`], the SQLite implementation of the storage contract.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use tablesync_core::{
  Batch, ColumnType, Row,
  store::{ConflictPolicy, SchemaInspector, TableStore, UpsertEngine},
};

use crate::{
  Error, Result,
  encode::{Param, decode_value},
  schema::{
    PRAGMAS, add_column_sql, create_table_sql, insert_sql, quote_ident, table_columns,
    table_exists,
  },
  upsert, writer,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A table store backed by a single SQLite file.
///
/// The connection is opened on construction and closed on drop. The store is
/// `Send` but not `Sync`: move it to the worker that uses it, or guard it
/// externally.
pub struct SqliteStore {
  pub(crate) conn: Connection,
  path:            Option<PathBuf>,
  identity:        String,
}

impl SqliteStore {
  /// Open the store at `path`.
  ///
  /// When the file is absent and `create_if_missing` is set, missing parent
  /// directories and the file itself are created; otherwise the call fails
  /// with [`Error::DatabaseMissing`].
  pub fn open(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
    let path = path.as_ref();
    if !path.is_file() {
      if !create_if_missing {
        return Err(Error::DatabaseMissing(path.to_owned()));
      }
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| Error::Io {
          path: parent.to_owned(),
          source,
        })?;
      }
      info!(path = %path.display(), "creating database file");
    }

    let conn = Connection::open(path)?;
    Self::init(conn, Some(path.to_owned()))
  }

  /// Open an in-memory store, for tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?, None)
  }

  fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
    conn.execute_batch(PRAGMAS)?;
    Ok(Self { conn, path, identity: "id".to_owned() })
  }

  /// Match upserts on `column` instead of `id`.
  pub fn with_identity_column(mut self, column: impl Into<String>) -> Self {
    self.identity = column.into();
    self
  }

  /// Backing file, or `None` for an in-memory store.
  pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

  fn require_table(&self, name: &str) -> Result<()> {
    if table_exists(&self.conn, name)? {
      Ok(())
    } else {
      Err(tablesync_core::Error::TableNotFound(name.to_owned()).into())
    }
  }
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  fn table_exists(&mut self, name: &str) -> Result<bool> {
    table_exists(&self.conn, name)
  }

  fn read_table(&mut self, name: &str) -> Result<Batch> {
    self.require_table(name)?;

    let mut stmt = self
      .conn
      .prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
    let columns: Vec<String> = stmt
      .column_names()
      .into_iter()
      .map(str::to_owned)
      .collect();
    let width = columns.len();

    let rows = stmt
      .query_map([], |row| {
        (0..width)
          .map(|i| row.get_ref(i).map(decode_value))
          .collect::<rusqlite::Result<Vec<_>>>()
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Batch::new(columns, rows)?)
  }

  fn write_table(
    &mut self,
    name: &str,
    data: &Batch,
    policy: ConflictPolicy,
  ) -> Result<()> {
    writer::write_table(&mut self.conn, name, data, policy)
  }

  fn add_row(&mut self, name: &str, row: &Row) -> Result<()> {
    self.require_table(name)?;
    let existing = table_columns(&self.conn, name)?;
    let columns: Vec<&str> = row.keys().map(String::as_str).collect();
    writer::ensure_known_columns(name, &existing, &columns)?;

    self.conn.execute(
      &insert_sql("INSERT", name, &columns),
      rusqlite::params_from_iter(row.values().map(Param)),
    )?;
    debug!(table = name, columns = columns.len(), "added row");
    Ok(())
  }

  fn add_column(
    &mut self,
    name: &str,
    column: &str,
    column_type: ColumnType,
  ) -> Result<()> {
    self.require_table(name)?;
    self.conn.execute_batch(&add_column_sql(name, column, column_type))?;
    debug!(table = name, column, %column_type, "altered table");
    Ok(())
  }

  fn create_table(
    &mut self,
    name: &str,
    columns: &[(String, ColumnType)],
    identity: Option<&str>,
  ) -> Result<()> {
    if table_exists(&self.conn, name)? {
      return Err(tablesync_core::Error::TableExists(name.to_owned()).into());
    }
    if columns.is_empty() {
      return Err(
        tablesync_core::Error::Validation(format!(
          "cannot create table {name:?} with no columns"
        ))
        .into(),
      );
    }
    if let Some(id) = identity
      && !columns.iter().any(|(c, _)| c == id)
    {
      return Err(
        tablesync_core::Error::UnknownColumn {
          table:  name.to_owned(),
          column: id.to_owned(),
        }
        .into(),
      );
    }

    self
      .conn
      .execute_batch(&create_table_sql(name, columns, identity))?;
    info!(table = name, columns = columns.len(), ?identity, "created table");
    Ok(())
  }
}

// ─── SchemaInspector impl ────────────────────────────────────────────────────

impl SchemaInspector for SqliteStore {
  type Error = Error;

  fn existing_columns(&mut self, name: &str) -> Result<Vec<String>> {
    self.require_table(name)?;
    table_columns(&self.conn, name)
  }
}

// ─── UpsertEngine impl ───────────────────────────────────────────────────────

impl UpsertEngine for SqliteStore {
  type Error = Error;

  fn identity_column(&self) -> &str { &self.identity }

  fn upsert(&mut self, name: &str, batch: &Batch) -> Result<usize> {
    upsert::upsert(&mut self.conn, name, &self.identity, batch)
  }
}
