//! [`MemoryStore`]: an in-process backend with the same contract as the
//! relational store, for exercising backend-agnostic code in tests.

use std::collections::BTreeMap;

use crate::{
  Batch, ColumnType, Error, Result, Row, Value,
  store::{ConflictPolicy, SchemaInspector, TableStore, UpsertEngine},
};

#[derive(Debug, Clone)]
struct MemTable {
  columns: Vec<(String, ColumnType)>,
  rows:    Vec<Vec<Value>>,
  /// Column carrying a uniqueness guarantee, if any.
  unique:  Option<String>,
}

impl MemTable {
  /// Column names match ignoring ASCII case, as in SQLite.
  fn index_of(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|(c, _)| c.eq_ignore_ascii_case(column))
  }

  fn column_indexes(&self, table: &str, columns: &[String]) -> Result<Vec<usize>> {
    columns
      .iter()
      .map(|c| {
        self.index_of(c).ok_or_else(|| Error::UnknownColumn {
          table:  table.to_owned(),
          column: c.clone(),
        })
      })
      .collect()
  }

  fn insert(&mut self, positions: &[usize], values: &[Value]) {
    let mut row = vec![Value::Null; self.columns.len()];
    for (&pos, value) in positions.iter().zip(values) {
      row[pos] = value.clone();
    }
    self.rows.push(row);
  }
}

fn table_key(name: &str) -> String { name.to_ascii_lowercase() }

#[derive(Debug, Clone)]
pub struct MemoryStore {
  /// Keyed by lower-cased name; table names are case-insensitive.
  tables:   BTreeMap<String, MemTable>,
  identity: String,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  pub fn new() -> Self { Self::with_identity("id") }

  pub fn with_identity(identity: impl Into<String>) -> Self {
    Self { tables: BTreeMap::new(), identity: identity.into() }
  }

  fn table(&self, name: &str) -> Result<&MemTable> {
    self
      .tables
      .get(&table_key(name))
      .ok_or_else(|| Error::TableNotFound(name.to_owned()))
  }

  fn table_mut(&mut self, name: &str) -> Result<&mut MemTable> {
    self
      .tables
      .get_mut(&table_key(name))
      .ok_or_else(|| Error::TableNotFound(name.to_owned()))
  }

  fn table_from_batch(data: &Batch) -> Result<MemTable> {
    if data.columns().is_empty() {
      return Err(Error::Validation("cannot create a table with no columns".into()));
    }
    Ok(MemTable {
      columns: data
        .columns()
        .iter()
        .cloned()
        .zip(data.inferred_types())
        .collect(),
      rows:    data.rows().to_vec(),
      unique:  None,
    })
  }
}

impl TableStore for MemoryStore {
  type Error = Error;

  fn table_exists(&mut self, name: &str) -> Result<bool> {
    Ok(self.tables.contains_key(&table_key(name)))
  }

  fn read_table(&mut self, name: &str) -> Result<Batch> {
    let table = self.table(name)?;
    Batch::new(
      table.columns.iter().map(|(c, _)| c.clone()).collect(),
      table.rows.clone(),
    )
  }

  fn write_table(&mut self, name: &str, data: &Batch, policy: ConflictPolicy) -> Result<()> {
    let exists = self.tables.contains_key(&table_key(name));
    match (policy, exists) {
      (ConflictPolicy::Fail, true) => Err(Error::TableExists(name.to_owned())),
      (ConflictPolicy::Append, true) => {
        let table = self.table_mut(name)?;
        let positions = table.column_indexes(name, data.columns())?;
        for row in data.rows() {
          table.insert(&positions, row);
        }
        Ok(())
      }
      _ => {
        let table = Self::table_from_batch(data)?;
        self.tables.insert(table_key(name), table);
        Ok(())
      }
    }
  }

  fn add_row(&mut self, name: &str, row: &Row) -> Result<()> {
    let table = self.table_mut(name)?;
    let columns: Vec<String> = row.keys().cloned().collect();
    let values: Vec<Value> = row.values().cloned().collect();
    let positions = table.column_indexes(name, &columns)?;
    table.insert(&positions, &values);
    Ok(())
  }

  fn add_column(&mut self, name: &str, column: &str, column_type: ColumnType) -> Result<()> {
    let table = self.table_mut(name)?;
    if table.index_of(column).is_some() {
      return Err(Error::Validation(format!(
        "duplicate column name {column:?} in table {name:?}"
      )));
    }
    table.columns.push((column.to_owned(), column_type));
    for row in &mut table.rows {
      row.push(Value::Null);
    }
    Ok(())
  }

  fn create_table(
    &mut self,
    name: &str,
    columns: &[(String, ColumnType)],
    identity: Option<&str>,
  ) -> Result<()> {
    if self.tables.contains_key(&table_key(name)) {
      return Err(Error::TableExists(name.to_owned()));
    }
    if columns.is_empty() {
      return Err(Error::Validation("cannot create a table with no columns".into()));
    }
    if let Some(id) = identity
      && !columns.iter().any(|(c, _)| c.eq_ignore_ascii_case(id))
    {
      return Err(Error::UnknownColumn { table: name.to_owned(), column: id.to_owned() });
    }
    self.tables.insert(
      table_key(name),
      MemTable {
        columns: columns.to_vec(),
        rows:    Vec::new(),
        unique:  identity.map(str::to_owned),
      },
    );
    Ok(())
  }
}

impl SchemaInspector for MemoryStore {
  type Error = Error;

  fn existing_columns(&mut self, name: &str) -> Result<Vec<String>> {
    Ok(self.table(name)?.columns.iter().map(|(c, _)| c.clone()).collect())
  }
}

impl UpsertEngine for MemoryStore {
  type Error = Error;

  fn identity_column(&self) -> &str { &self.identity }

  fn upsert(&mut self, name: &str, batch: &Batch) -> Result<usize> {
    let identity = self.identity.clone();
    let table = self.table_mut(name)?;
    if batch.is_empty() {
      return Ok(0);
    }

    let Some(batch_id) = batch.column_index(&identity) else {
      return Err(Error::MissingIdentity { table: name.to_owned(), column: identity });
    };
    let positions = table.column_indexes(name, batch.columns())?;
    if !table.unique.as_deref().is_some_and(|u| u.eq_ignore_ascii_case(&identity)) {
      return Err(Error::MissingUniqueConstraint { table: name.to_owned(), column: identity });
    }
    let Some(table_id) = table.index_of(&identity) else {
      return Err(Error::UnknownColumn { table: name.to_owned(), column: identity });
    };

    // Work on a copy so a failure part-way leaves the table untouched.
    let mut rows = table.rows.clone();
    for incoming in batch.rows() {
      let key = &incoming[batch_id];
      match rows.iter_mut().find(|r| &r[table_id] == key) {
        Some(existing) => {
          for (&pos, value) in positions.iter().zip(incoming) {
            existing[pos] = value.clone();
          }
        }
        None => {
          let mut row = vec![Value::Null; table.columns.len()];
          for (&pos, value) in positions.iter().zip(incoming) {
            row[pos] = value.clone();
          }
          rows.push(row);
        }
      }
    }
    table.rows = rows;
    Ok(batch.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn users() -> Batch {
    Batch::new(
      vec!["id".into(), "name".into()],
      vec![vec![1.into(), "Alice".into()], vec![2.into(), "Bob".into()]],
    )
    .unwrap()
  }

  fn keyed_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
      .create_table(
        "users",
        &[("id".into(), ColumnType::Integer), ("name".into(), ColumnType::Text)],
        Some("id"),
      )
      .unwrap();
    store.write_table("users", &users(), ConflictPolicy::Append).unwrap();
    store
  }

  #[test]
  fn every_operation_on_a_missing_table_is_not_found() {
    let mut s = MemoryStore::new();
    let row: Row = [("id".to_string(), Value::from(1))].into();

    assert!(s.read_table("t").unwrap_err().is_not_found());
    assert!(s.add_row("t", &row).unwrap_err().is_not_found());
    assert!(s.add_column("t", "c", ColumnType::Text).unwrap_err().is_not_found());
    assert!(s.existing_columns("t").unwrap_err().is_not_found());
    assert!(s.has_columns("t", &["c"]).unwrap_err().is_not_found());
    assert!(s.upsert("t", &users()).unwrap_err().is_not_found());
  }

  #[test]
  fn fail_policy_keeps_first_write() {
    let mut s = MemoryStore::new();
    s.write_table("users", &users(), ConflictPolicy::Fail).unwrap();

    let other = Batch::new(vec!["id".into()], vec![vec![9.into()]]).unwrap();
    let err = s.write_table("users", &other, ConflictPolicy::Fail).unwrap_err();

    assert!(matches!(err, Error::TableExists(_)));
    assert_eq!(s.read_table("users").unwrap(), users());
  }

  #[test]
  fn upsert_merges_by_identity() {
    let mut s = keyed_store();
    let incoming = Batch::new(
      vec!["id".into(), "name".into()],
      vec![vec![2.into(), "Bob2".into()], vec![3.into(), "Carol".into()]],
    )
    .unwrap();

    s.upsert("users", &incoming).unwrap();

    let names: Vec<_> = s.read_table("users").unwrap().column("name").unwrap().cloned().collect();
    assert_eq!(names, vec!["Alice".into(), "Bob2".into(), Value::from("Carol")]);
  }

  #[test]
  fn upsert_without_constraint_fails_and_changes_nothing() {
    let mut s = MemoryStore::new();
    s.write_table("users", &users(), ConflictPolicy::Fail).unwrap();

    let err = s.upsert("users", &users()).unwrap_err();
    assert!(matches!(err, Error::MissingUniqueConstraint { .. }));
    assert_eq!(s.read_table("users").unwrap(), users());
  }

  #[test]
  fn has_columns_is_positional() {
    let mut s = MemoryStore::new();
    let batch = Batch::new(vec!["a".into()], vec![]).unwrap();
    s.write_table("t", &batch, ConflictPolicy::Fail).unwrap();
    assert_eq!(s.has_columns("t", &["a", "missing"]).unwrap(), vec![true, false]);
  }

  #[test]
  fn names_match_ignoring_case() {
    let mut s = MemoryStore::new();
    s.write_table("users", &users(), ConflictPolicy::Fail).unwrap();

    let err = s.write_table("USERS", &users(), ConflictPolicy::Fail).unwrap_err();
    assert!(matches!(err, Error::TableExists(_)));
    assert_eq!(s.has_columns("Users", &["NAME", "age"]).unwrap(), vec![true, false]);

    let shouty = Batch::new(vec!["ID".into(), "NAME".into()], vec![vec![3.into(), "Carol".into()]])
      .unwrap();
    s.write_table("users", &shouty, ConflictPolicy::Append).unwrap();
    assert_eq!(s.read_table("users").unwrap().len(), 3);
  }
}
