//! Async HTTP client for the Airtable REST and metadata APIs.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{Error, Result};

fn default_api_url() -> String { "https://api.airtable.com".to_owned() }

/// Connection settings for one Airtable base.
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableConfig {
  /// Personal access token, sent as a bearer token.
  pub api_token: String,
  /// Human-readable base name, resolved to an id on connect.
  pub base_name: String,
  #[serde(default = "default_api_url")]
  pub api_url:   String,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BaseMeta {
  pub id:   String,
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableMeta {
  pub id:     String,
  pub name:   String,
  #[serde(default)]
  pub fields: Vec<FieldMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldMeta {
  pub name:       String,
  #[serde(rename = "type")]
  pub field_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Record {
  pub id:     String,
  #[serde(default)]
  pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BasesPage {
  bases:  Vec<BaseMeta>,
  #[serde(default)]
  offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TablesResponse {
  tables: Vec<TableMeta>,
}

#[derive(Debug, Deserialize)]
struct RecordsPage {
  records: Vec<Record>,
  #[serde(default)]
  offset:  Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct AirtableClient {
  client:  Client,
  api_url: String,
  token:   String,
}

impl AirtableClient {
  pub fn new(config: &AirtableConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      api_url: config.api_url.trim_end_matches('/').to_owned(),
      token: config.api_token.clone(),
    })
  }

  fn url(&self, path: &str) -> String { format!("{}/v0{}", self.api_url, path) }

  async fn get<T: DeserializeOwned>(&self, path: &str, offset: Option<&str>) -> Result<T> {
    let mut req = self.client.get(self.url(path)).bearer_auth(&self.token);
    if let Some(offset) = offset {
      req = req.query(&[("offset", offset)]);
    }

    let resp = req.send().await?;
    if !resp.status().is_success() {
      return Err(Error::Status {
        request: format!("GET {path}"),
        status:  resp.status(),
      });
    }
    Ok(resp.json().await?)
  }

  /// `GET /v0/meta/bases`, following `offset` until exhausted.
  pub async fn list_bases(&self) -> Result<Vec<BaseMeta>> {
    let mut bases = Vec::new();
    let mut offset: Option<String> = None;
    loop {
      let page: BasesPage = self.get("/meta/bases", offset.as_deref()).await?;
      bases.extend(page.bases);
      match page.offset {
        Some(next) => offset = Some(next),
        None => break,
      }
    }
    Ok(bases)
  }

  /// `GET /v0/meta/bases/{base_id}/tables`
  pub async fn list_tables(&self, base_id: &str) -> Result<Vec<TableMeta>> {
    let resp: TablesResponse = self
      .get(&format!("/meta/bases/{base_id}/tables"), None)
      .await?;
    Ok(resp.tables)
  }

  /// `GET /v0/{base_id}/{table_id}`, following `offset` until exhausted.
  pub async fn list_records(&self, base_id: &str, table_id: &str) -> Result<Vec<Record>> {
    let path = format!("/{base_id}/{table_id}");
    let mut records = Vec::new();
    let mut offset: Option<String> = None;
    loop {
      let page: RecordsPage = self.get(&path, offset.as_deref()).await?;
      debug!(table = table_id, records = page.records.len(), "fetched page");
      records.extend(page.records);
      match page.offset {
        Some(next) => offset = Some(next),
        None => break,
      }
    }
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn records_page_parses_offset_and_fields() {
    let page: RecordsPage = serde_json::from_str(
      r#"{
        "records": [
          {"id": "rec1", "createdTime": "2024-01-02T03:04:05.000Z",
           "fields": {"Name": "Alice", "Tags": ["a", "b"]}},
          {"id": "rec2", "createdTime": "2024-01-02T03:04:05.000Z"}
        ],
        "offset": "itr123/rec2"
      }"#,
    )
    .unwrap();

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].fields["Name"], "Alice");
    assert!(page.records[1].fields.is_empty());
    assert_eq!(page.offset.as_deref(), Some("itr123/rec2"));
  }

  #[test]
  fn tables_response_parses_field_types() {
    let resp: TablesResponse = serde_json::from_str(
      r#"{"tables": [{"id": "tbl1", "name": "Contacts", "primaryFieldId": "fld1",
          "fields": [{"id": "fld1", "name": "Name", "type": "singleLineText"},
                     {"id": "fld2", "name": "Age", "type": "number"}]}]}"#,
    )
    .unwrap();

    let table = &resp.tables[0];
    assert_eq!(table.name, "Contacts");
    assert_eq!(table.fields[1].field_type, "number");
  }

  #[test]
  fn config_defaults_api_url() {
    let cfg: AirtableConfig =
      serde_json::from_str(r#"{"api_token": "pat", "base_name": "CRM"}"#).unwrap();
    assert_eq!(cfg.api_url, "https://api.airtable.com");

    let client = AirtableClient::new(&AirtableConfig {
      api_url: "http://localhost:9000/".into(),
      ..cfg
    })
    .unwrap();
    assert_eq!(client.url("/meta/bases"), "http://localhost:9000/v0/meta/bases");
  }
}
