//! Catalog queries and SQL text builders.
//!
//! Values are always bound as parameters. Identifiers cannot be, so they are
//! quoted here; table names are only interpolated after the catalog has
//! confirmed they exist (or when creating them), and column names are checked
//! against `pragma_table_info` before any insert or merge uses them.

use rusqlite::{Connection, OptionalExtension as _};

use tablesync_core::ColumnType;

use crate::Result;

/// Applied once per connection.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Table names are matched ignoring ASCII case, as SQLite resolves them.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
  let found = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
      rusqlite::params![name],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  Ok(found)
}

/// Column names of `name` in declaration order. Empty for a missing table;
/// callers check existence first.
pub fn table_columns(conn: &Connection, name: &str) -> Result<Vec<String>> {
  let mut stmt =
    conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
  let columns = stmt
    .query_map(rusqlite::params![name], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(columns)
}

// ─── SQL text ────────────────────────────────────────────────────────────────

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
  columns
    .iter()
    .map(|c| quote_ident(c.as_ref()))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `?1, ?2, …, ?n`
pub fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// `<verb> INTO "table" ("a", "b") VALUES (?1, ?2)`; `DEFAULT VALUES` when
/// `columns` is empty.
pub fn insert_sql<S: AsRef<str>>(verb: &str, table: &str, columns: &[S]) -> String {
  if columns.is_empty() {
    return format!("{verb} INTO {} DEFAULT VALUES", quote_ident(table));
  }
  format!(
    "{verb} INTO {} ({}) VALUES ({})",
    quote_ident(table),
    column_list(columns),
    placeholders(columns.len())
  )
}

pub fn create_table_sql(
  table: &str,
  columns: &[(String, ColumnType)],
  primary_key: Option<&str>,
) -> String {
  let defs = columns
    .iter()
    .map(|(name, ty)| {
      if primary_key == Some(name.as_str()) {
        format!("{} {ty} PRIMARY KEY", quote_ident(name))
      } else {
        format!("{} {ty}", quote_ident(name))
      }
    })
    .collect::<Vec<_>>()
    .join(", ");
  format!("CREATE TABLE {} ({defs})", quote_ident(table))
}

pub fn add_column_sql(table: &str, column: &str, ty: ColumnType) -> String {
  format!(
    "ALTER TABLE {} ADD COLUMN {} {ty}",
    quote_ident(table),
    quote_ident(column)
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quote_ident_escapes_quotes() {
    assert_eq!(quote_ident("plain"), "\"plain\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    assert_eq!(quote_ident("Last Modified"), "\"Last Modified\"");
  }

  #[test]
  fn insert_sql_numbers_placeholders() {
    assert_eq!(
      insert_sql("INSERT", "t", &["id", "name"]),
      "INSERT INTO \"t\" (\"id\", \"name\") VALUES (?1, ?2)"
    );
    assert_eq!(
      insert_sql::<&str>("INSERT", "t", &[]),
      "INSERT INTO \"t\" DEFAULT VALUES"
    );
  }

  #[test]
  fn create_table_sql_marks_primary_key() {
    let sql = create_table_sql(
      "users",
      &[("id".into(), ColumnType::Integer), ("name".into(), ColumnType::Text)],
      Some("id"),
    );
    assert_eq!(
      sql,
      "CREATE TABLE \"users\" (\"id\" INTEGER PRIMARY KEY, \"name\" TEXT)"
    );
  }
}
