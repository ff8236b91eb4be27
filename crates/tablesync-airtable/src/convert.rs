//! Flattening Airtable records into rows.

use chrono::{NaiveDateTime, SecondsFormat};
use tablesync_core::{
  Batch, ColumnType, Result, Row, Value, source::RECORD_ID_COLUMN,
};

use crate::{FieldMeta, Record};

/// Timestamp layout Airtable uses for date-time cells.
const AIRTABLE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

const TIMESTAMP_FIELDS: &[&str] = &["dateTime", "createdTime", "lastModifiedTime"];

/// Column type for an Airtable field type.
pub fn column_type(field_type: &str) -> ColumnType {
  match field_type {
    "number" | "currency" | "percent" | "duration" => ColumnType::Real,
    "checkbox" | "count" | "autoNumber" | "rating" => ColumnType::Integer,
    _ => ColumnType::Text,
  }
}

/// Re-render an Airtable timestamp as RFC 3339 UTC with millisecond
/// precision. `None` if `raw` is not in Airtable's layout.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
  NaiveDateTime::parse_from_str(raw, AIRTABLE_TIMESTAMP)
    .ok()
    .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn convert_cell(field: Option<&FieldMeta>, json: serde_json::Value) -> Value {
  let is_timestamp =
    field.is_some_and(|f| TIMESTAMP_FIELDS.contains(&f.field_type.as_str()));
  match json {
    serde_json::Value::String(s) if is_timestamp => {
      Value::Text(normalize_timestamp(&s).unwrap_or(s))
    }
    other => other.into(),
  }
}

/// True for a field SQLite would treat as the same column as `id`.
fn is_record_id(name: &str) -> bool { name.eq_ignore_ascii_case(RECORD_ID_COLUMN) }

/// One row per record. The record id is stored under `id`, replacing any
/// field named `id` in any letter case.
pub fn record_to_row(record: Record, fields: &[FieldMeta]) -> Row {
  let mut row: Row = record
    .fields
    .into_iter()
    .filter(|(name, _)| !is_record_id(name))
    .map(|(name, json)| {
      let field = fields.iter().find(|f| f.name == name);
      let value = convert_cell(field, json);
      (name, value)
    })
    .collect();
  row.insert(RECORD_ID_COLUMN.to_owned(), Value::Text(record.id));
  row
}

/// Columns are `id`, then every declared field in metadata order, then any
/// undeclared field seen in the records. Airtable omits empty cells, so they
/// come back as `Null`.
pub fn records_to_batch(records: Vec<Record>, fields: &[FieldMeta]) -> Result<Batch> {
  let mut columns = vec![RECORD_ID_COLUMN.to_owned()];
  columns.extend(
    fields
      .iter()
      .map(|f| f.name.clone())
      .filter(|n| !is_record_id(n)),
  );

  let rows: Vec<Row> = records
    .into_iter()
    .map(|r| record_to_row(r, fields))
    .collect();
  for row in &rows {
    for key in row.keys() {
      if !columns.contains(key) {
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
  Batch::new(columns, cells)
}

/// Declared column types: `id` as text, then each field.
pub fn declared_types(fields: &[FieldMeta]) -> Vec<(String, ColumnType)> {
  std::iter::once((RECORD_ID_COLUMN.to_owned(), ColumnType::Text))
    .chain(
      fields
        .iter()
        .filter(|f| !is_record_id(&f.name))
        .map(|f| (f.name.clone(), column_type(&f.field_type))),
    )
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn field(name: &str, ty: &str) -> FieldMeta {
    FieldMeta { name: name.into(), field_type: ty.into() }
  }

  fn record(id: &str, fields: serde_json::Value) -> Record {
    Record {
      id:     id.into(),
      fields: fields.as_object().cloned().unwrap_or_default(),
    }
  }

  #[test]
  fn timestamps_normalize_to_rfc3339() {
    assert_eq!(
      normalize_timestamp("2024-03-05T14:07:09.123Z").as_deref(),
      Some("2024-03-05T14:07:09.123Z")
    );
    assert_eq!(
      normalize_timestamp("2024-03-05T14:07:09Z").as_deref(),
      Some("2024-03-05T14:07:09.000Z")
    );
    assert_eq!(normalize_timestamp("yesterday"), None);
  }

  #[test]
  fn field_types_map_to_column_types() {
    assert_eq!(column_type("number"), ColumnType::Real);
    assert_eq!(column_type("checkbox"), ColumnType::Integer);
    assert_eq!(column_type("singleLineText"), ColumnType::Text);
    assert_eq!(column_type("multipleSelects"), ColumnType::Text);
  }

  #[test]
  fn record_id_is_merged_in() {
    let fields = [field("Name", "singleLineText"), field("id", "number")];
    let row = record_to_row(
      record("recABC", serde_json::json!({"Name": "Alice", "id": 99})),
      &fields,
    );
    assert_eq!(row["id"], Value::from("recABC"));
    assert_eq!(row["Name"], Value::from("Alice"));
  }

  #[test]
  fn record_id_replaces_fields_named_id_in_any_case() {
    let fields = [field("ID", "autoNumber"), field("Name", "singleLineText")];
    let batch = records_to_batch(
      vec![record("recABC", serde_json::json!({"ID": 7, "Name": "Alice"}))],
      &fields,
    )
    .unwrap();

    assert_eq!(batch.columns(), &["id", "Name"]);
    assert_eq!(batch.rows()[0], vec![Value::from("recABC"), Value::from("Alice")]);
    assert_eq!(
      declared_types(&fields),
      vec![("id".to_string(), ColumnType::Text), ("Name".to_string(), ColumnType::Text)]
    );
  }

  #[test]
  fn batch_follows_metadata_order_and_fills_gaps() {
    let fields = [
      field("Name", "singleLineText"),
      field("Done", "checkbox"),
      field("Last Modified", "lastModifiedTime"),
    ];
    let batch = records_to_batch(
      vec![
        record(
          "rec1",
          serde_json::json!({"Last Modified": "2024-01-02T03:04:05.000Z", "Name": "A", "Done": true}),
        ),
        record("rec2", serde_json::json!({"Tags": ["x"]})),
      ],
      &fields,
    )
    .unwrap();

    assert_eq!(batch.columns(), &["id", "Name", "Done", "Last Modified", "Tags"]);
    assert_eq!(
      batch.rows()[0],
      vec![
        Value::from("rec1"),
        Value::from("A"),
        Value::Integer(1),
        Value::from("2024-01-02T03:04:05.000Z"),
        Value::Null,
      ]
    );
    assert_eq!(batch.rows()[1][1], Value::Null);
    assert_eq!(batch.rows()[1][4], Value::from(r#"["x"]"#));
  }

  #[test]
  fn declared_types_lead_with_id() {
    let types = declared_types(&[field("Age", "number"), field("id", "number")]);
    assert_eq!(
      types,
      vec![("id".to_string(), ColumnType::Text), ("Age".to_string(), ColumnType::Real)]
    );
  }
}
