//! Conversion between [`Value`] and SQLite's value types.
//!
//! Values map one-to-one onto SQLite storage classes. Text that is not valid
//! UTF-8 is decoded lossily.

use rusqlite::{
  ToSql,
  types::{ToSqlOutput, ValueRef},
};
use tablesync_core::Value;

/// Borrowing bind parameter for a [`Value`].
pub struct Param<'a>(pub &'a Value);

impl ToSql for Param<'_> {
  fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
    let v = match self.0 {
      Value::Null => ValueRef::Null,
      Value::Integer(i) => ValueRef::Integer(*i),
      Value::Real(f) => ValueRef::Real(*f),
      Value::Text(s) => ValueRef::Text(s.as_bytes()),
      Value::Blob(b) => ValueRef::Blob(b),
    };
    Ok(ToSqlOutput::Borrowed(v))
  }
}

/// Parameters for one positional row.
pub fn params(row: &[Value]) -> impl rusqlite::Params + '_ {
  rusqlite::params_from_iter(row.iter().map(Param))
}

pub fn decode_value(v: ValueRef<'_>) -> Value {
  match v {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(f) => Value::Real(f),
    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::Blob(b.to_vec()),
  }
}
