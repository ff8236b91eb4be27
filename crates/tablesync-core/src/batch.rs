//! [`Batch`]: an ordered set of rows sharing one column list.
//!
//! This is both what a store returns from a whole-table read and what callers
//! submit for a write or merge.

use std::{cmp::Ordering, collections::HashSet};

use serde::Serialize;

use crate::{ColumnType, Error, Result, Row, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Batch {
  columns: Vec<String>,
  rows:    Vec<Vec<Value>>,
}

impl Batch {
  /// Build a batch from positional rows. Every row must be exactly as wide as
  /// `columns`, and column names must be unique.
  pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
    let mut seen = HashSet::with_capacity(columns.len());
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
      return Err(Error::Validation(format!("duplicate column {dup:?}")));
    }
    if let Some((i, row)) = rows
      .iter()
      .enumerate()
      .find(|(_, row)| row.len() != columns.len())
    {
      return Err(Error::Validation(format!(
        "row {i} has {} values, expected {}",
        row.len(),
        columns.len()
      )));
    }
    Ok(Self { columns, rows })
  }

  /// An empty batch with the given columns.
  pub fn empty(columns: Vec<String>) -> Result<Self> { Self::new(columns, Vec::new()) }

  /// Build a batch from sparse rows. The column list is the union of all
  /// keys in first-seen order; cells a row lacks are `Null`.
  pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
    Self::from_rows_leading(rows, None)
  }

  /// Like [`Batch::from_rows`], but `leading` (if any row carries it) is
  /// placed first in the column list.
  pub fn from_rows_leading(
    rows: impl IntoIterator<Item = Row>,
    leading: Option<&str>,
  ) -> Self {
    let rows: Vec<Row> = rows.into_iter().collect();

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    if let Some(lead) = leading
      && rows.iter().any(|r| r.contains_key(lead))
    {
      columns.push(lead.to_owned());
      seen.insert(lead);
    }
    for row in &rows {
      for key in row.keys() {
        if seen.insert(key.as_str()) {
          columns.push(key.clone());
        }
      }
    }

    let cells = rows
      .iter()
      .map(|row| {
        columns
          .iter()
          .map(|c| row.get(c).cloned().unwrap_or_default())
          .collect()
      })
      .collect();

    Self { columns, rows: cells }
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Vec<Value>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }

  /// All values of one column, top to bottom.
  pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
    let idx = self.column_index(name)?;
    Some(self.rows.iter().map(move |row| &row[idx]))
  }

  /// Rows as column-keyed maps.
  pub fn to_rows(&self) -> Vec<Row> {
    self
      .rows
      .iter()
      .map(|cells| self.columns.iter().cloned().zip(cells.iter().cloned()).collect())
      .collect()
  }

  /// Append one positional row.
  pub fn push(&mut self, row: Vec<Value>) -> Result<()> {
    if row.len() != self.columns.len() {
      return Err(Error::Validation(format!(
        "row has {} values, expected {}",
        row.len(),
        self.columns.len()
      )));
    }
    self.rows.push(row);
    Ok(())
  }

  /// One type per column, taken from the column's first non-null value.
  /// Columns holding only nulls default to `Text`.
  pub fn inferred_types(&self) -> Vec<ColumnType> {
    (0..self.columns.len())
      .map(|i| {
        self
          .rows
          .iter()
          .find_map(|row| ColumnType::of(&row[i]))
          .unwrap_or(ColumnType::Text)
      })
      .collect()
  }

  /// Rows sorted by the value of `column`, for comparing snapshots whose
  /// storage order is not guaranteed. Nulls sort first, then numbers, text
  /// and blobs, as SQLite orders storage classes.
  pub fn sorted_by(&self, column: &str) -> Option<Self> {
    let idx = self.column_index(column)?;
    let mut rows = self.rows.clone();
    rows.sort_by(|a, b| compare_values(&a[idx], &b[idx]));
    Some(Self { columns: self.columns.clone(), rows })
  }
}

fn class_rank(v: &Value) -> u8 {
  match v {
    Value::Null => 0,
    Value::Integer(_) | Value::Real(_) => 1,
    Value::Text(_) => 2,
    Value::Blob(_) => 3,
  }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
  match (a, b) {
    (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
    (Value::Integer(x), Value::Real(y)) => (*x as f64).total_cmp(y),
    (Value::Real(x), Value::Integer(y)) => x.total_cmp(&(*y as f64)),
    (Value::Real(x), Value::Real(y)) => x.total_cmp(y),
    (Value::Text(x), Value::Text(y)) => x.cmp(y),
    (Value::Blob(x), Value::Blob(y)) => x.cmp(y),
    _ => class_rank(a).cmp(&class_rank(b)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(pairs: &[(&str, Value)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  #[test]
  fn new_rejects_ragged_rows() {
    let err = Batch::new(
      vec!["id".into(), "name".into()],
      vec![vec![1.into(), "a".into()], vec![2.into()]],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(m) if m.contains("row 1")));
  }

  #[test]
  fn new_rejects_duplicate_columns() {
    let err = Batch::new(vec!["id".into(), "id".into()], vec![]).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn from_rows_unions_columns_and_fills_nulls() {
    let batch = Batch::from_rows_leading(
      vec![
        row(&[("name", "Alice".into()), ("id", "rec1".into())]),
        row(&[("id", "rec2".into()), ("email", "b@example.com".into())]),
      ],
      Some("id"),
    );

    assert_eq!(batch.columns(), &["id", "name", "email"]);
    assert_eq!(batch.rows()[0][2], Value::Null);
    assert_eq!(batch.rows()[1][1], Value::Null);
    assert_eq!(batch.rows()[1][2], Value::from("b@example.com"));
  }

  #[test]
  fn inferred_types_skip_nulls() {
    let batch = Batch::new(
      vec!["a".into(), "b".into(), "c".into()],
      vec![
        vec![Value::Null, 1.5.into(), Value::Null],
        vec![3.into(), Value::Null, Value::Null],
      ],
    )
    .unwrap();

    assert_eq!(
      batch.inferred_types(),
      vec![ColumnType::Integer, ColumnType::Real, ColumnType::Text]
    );
  }

  #[test]
  fn to_rows_keys_by_column() {
    let batch = Batch::new(
      vec!["id".into(), "name".into()],
      vec![vec![1.into(), "Alice".into()]],
    )
    .unwrap();
    let rows = batch.to_rows();
    assert_eq!(rows[0]["name"], Value::from("Alice"));
    assert_eq!(rows[0]["id"], Value::Integer(1));
  }

  #[test]
  fn sorted_by_orders_reals_within_the_same_integer_part() {
    let batch = Batch::new(
      vec!["score".into()],
      vec![
        vec![1.9.into()],
        vec![Value::from("text")],
        vec![1.2.into()],
        vec![Value::Null],
        vec![1.into()],
        vec![1.5.into()],
      ],
    )
    .unwrap();

    let sorted = batch.sorted_by("score").unwrap();
    let scores: Vec<_> = sorted.column("score").unwrap().cloned().collect();
    assert_eq!(
      scores,
      vec![
        Value::Null,
        Value::Integer(1),
        Value::Real(1.2),
        Value::Real(1.5),
        Value::Real(1.9),
        Value::from("text"),
      ]
    );
    assert!(batch.sorted_by("missing").is_none());
  }
}
