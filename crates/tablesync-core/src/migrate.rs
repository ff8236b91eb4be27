//! Column reconciliation: bring a table's column set up to a desired
//! superset, additively.
//!
//! Each missing column is added with its own [`TableStore::add_column`] call
//! and commits on its own. A reconcile interrupted after column *k* leaves
//! columns `1..=k` in place; running it again picks up where it stopped,
//! because present columns are skipped. Column names compare ignoring ASCII
//! case, so `name` counts as present on a table that has `Name`.

use tracing::{debug, info};

use crate::{
  ColumnType, Error,
  store::{SchemaInspector, TableStore},
};

/// Add every column in `wanted` that `name` does not already have. Returns
/// the columns actually added, in order.
///
/// Fails with [`Error::TableNotFound`] before touching anything if the table
/// is absent.
pub fn reconcile<S>(
  store: &mut S,
  name: &str,
  wanted: &[(String, ColumnType)],
) -> Result<Vec<String>, <S as TableStore>::Error>
where
  S: TableStore + SchemaInspector<Error = <S as TableStore>::Error>,
{
  if !store.table_exists(name)? {
    return Err(Error::TableNotFound(name.to_owned()).into());
  }

  let mut existing = store.existing_columns(name)?;
  let mut added = Vec::new();

  for (column, column_type) in wanted {
    if existing.iter().any(|e| e.eq_ignore_ascii_case(column)) {
      debug!(table = name, column = %column, "column present, skipping");
      continue;
    }
    store.add_column(name, column, *column_type)?;
    info!(table = name, column = %column, %column_type, "added column");
    existing.push(column.clone());
    added.push(column.clone());
  }

  Ok(added)
}

/// [`reconcile`] over parallel name and type slices.
pub fn reconcile_columns<S, C>(
  store: &mut S,
  name: &str,
  columns: &[C],
  types: &[ColumnType],
) -> Result<Vec<String>, <S as TableStore>::Error>
where
  S: TableStore + SchemaInspector<Error = <S as TableStore>::Error>,
  C: AsRef<str>,
{
  if columns.len() != types.len() {
    return Err(
      Error::Validation(format!(
        "{} column names but {} column types",
        columns.len(),
        types.len()
      ))
      .into(),
    );
  }
  let wanted: Vec<(String, ColumnType)> = columns
    .iter()
    .map(|c| c.as_ref().to_owned())
    .zip(types.iter().copied())
    .collect();
  reconcile(store, name, &wanted)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Batch, memory::MemoryStore, store::ConflictPolicy};

  fn seeded() -> MemoryStore {
    let mut store = MemoryStore::new();
    let batch = Batch::new(
      vec!["id".into(), "name".into()],
      vec![vec![1.into(), "Alice".into()]],
    )
    .unwrap();
    store.write_table("users", &batch, ConflictPolicy::Fail).unwrap();
    store
  }

  #[test]
  fn adds_only_missing_columns() {
    let mut store = seeded();
    let added = reconcile_columns(
      &mut store,
      "users",
      &["id", "salary", "department"],
      &[ColumnType::Integer, ColumnType::Integer, ColumnType::Text],
    )
    .unwrap();

    assert_eq!(added, vec!["salary", "department"]);
    assert_eq!(
      store.existing_columns("users").unwrap(),
      vec!["id", "name", "salary", "department"]
    );
  }

  #[test]
  fn second_run_is_a_no_op() {
    let mut store = seeded();
    let wanted = vec![("email".to_string(), ColumnType::Text)];

    reconcile(&mut store, "users", &wanted).unwrap();
    let after_first = store.existing_columns("users").unwrap();

    let added = reconcile(&mut store, "users", &wanted).unwrap();
    assert!(added.is_empty());
    assert_eq!(store.existing_columns("users").unwrap(), after_first);
  }

  #[test]
  fn case_variant_of_present_column_is_skipped() {
    let mut store = seeded();
    let added = reconcile_columns(
      &mut store,
      "users",
      &["NAME", "Email", "email"],
      &[ColumnType::Text, ColumnType::Text, ColumnType::Text],
    )
    .unwrap();

    assert_eq!(added, vec!["Email"]);
    assert_eq!(store.existing_columns("users").unwrap(), vec!["id", "name", "Email"]);
  }

  #[test]
  fn repeated_names_are_added_once() {
    let mut store = seeded();
    let added = reconcile_columns(
      &mut store,
      "users",
      &["email", "email"],
      &[ColumnType::Text, ColumnType::Text],
    )
    .unwrap();
    assert_eq!(added, vec!["email"]);
  }

  #[test]
  fn missing_table_fails_up_front() {
    let mut store = MemoryStore::new();
    let err = reconcile_columns(&mut store, "nope", &["a"], &[ColumnType::Text])
      .unwrap_err();
    assert!(matches!(err, Error::TableNotFound(t) if t == "nope"));
  }

  #[test]
  fn mismatched_lengths_are_rejected() {
    let mut store = seeded();
    let err = reconcile_columns(&mut store, "users", &["a", "b"], &[ColumnType::Text])
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.existing_columns("users").unwrap(), vec!["id", "name"]);
  }
}
