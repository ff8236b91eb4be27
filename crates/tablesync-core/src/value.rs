//! Cell values, column type tags and rows.
//!
//! [`Value`] mirrors the five storage classes of an embedded relational
//! engine. Anything richer (booleans, JSON arrays, timestamps) is folded into
//! one of them at the edge where it enters the system.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A single row: column name → value.
pub type Row = BTreeMap<String, Value>;

// ─── Value ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Blob(Vec<u8>),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Integer(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<i32> for Value {
  fn from(v: i32) -> Self { Self::Integer(v.into()) }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self { Self::Integer(v.into()) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<Vec<u8>> for Value {
  fn from(v: Vec<u8>) -> Self { Self::Blob(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

/// Arrays and objects have no column equivalent; they are kept as compact
/// JSON text.
impl From<serde_json::Value> for Value {
  fn from(v: serde_json::Value) -> Self {
    use serde_json::Value as Json;
    match v {
      Json::Null => Self::Null,
      Json::Bool(b) => b.into(),
      Json::Number(n) => match n.as_i64() {
        Some(i) => Self::Integer(i),
        None => n.as_f64().map_or(Self::Null, Self::Real),
      },
      Json::String(s) => Self::Text(s),
      other @ (Json::Array(_) | Json::Object(_)) => Self::Text(other.to_string()),
    }
  }
}

// ─── ColumnType ──────────────────────────────────────────────────────────────

/// Semantic type tag for a column. The backend decides what it means; the
/// SQLite store renders it as the matching type affinity.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ColumnType {
  Integer,
  Real,
  Text,
  Blob,
  Numeric,
}

impl ColumnType {
  /// The type a value would be stored as; `None` for `Null`.
  pub fn of(value: &Value) -> Option<Self> {
    match value {
      Value::Null => None,
      Value::Integer(_) => Some(Self::Integer),
      Value::Real(_) => Some(Self::Real),
      Value::Text(_) => Some(Self::Text),
      Value::Blob(_) => Some(Self::Blob),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn json_scalars_map_to_storage_classes() {
    assert_eq!(Value::from(serde_json::json!(null)), Value::Null);
    assert_eq!(Value::from(serde_json::json!(true)), Value::Integer(1));
    assert_eq!(Value::from(serde_json::json!(42)), Value::Integer(42));
    assert_eq!(Value::from(serde_json::json!(1.5)), Value::Real(1.5));
    assert_eq!(Value::from(serde_json::json!("x")), Value::from("x"));
  }

  #[test]
  fn json_collections_become_text() {
    let v = Value::from(serde_json::json!(["a", "b"]));
    assert_eq!(v, Value::Text(r#"["a","b"]"#.into()));
  }

  #[test]
  fn column_type_parses_case_insensitively() {
    assert_eq!(ColumnType::from_str("integer").unwrap(), ColumnType::Integer);
    assert_eq!(ColumnType::from_str("TEXT").unwrap(), ColumnType::Text);
    assert!(ColumnType::from_str("varchar").is_err());
    assert_eq!(ColumnType::Real.to_string(), "REAL");
  }
}
