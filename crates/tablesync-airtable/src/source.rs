//! [`AirtableSource`], the Airtable implementation of [`TableSource`].

use std::{collections::BTreeMap, future::Future};

use tablesync_core::{Batch, ColumnType, source::TableSource};
use tracing::info;

use crate::{
  AirtableClient, AirtableConfig, BaseMeta, Error, Result, TableMeta,
  convert::{declared_types, records_to_batch},
};

/// One Airtable base with its table metadata resolved.
pub struct AirtableSource {
  client: AirtableClient,
  base:   BaseMeta,
  tables: BTreeMap<String, TableMeta>,
}

impl AirtableSource {
  /// Resolve `config.base_name` and load the base's table metadata.
  ///
  /// Fails with [`tablesync_core::Error::BaseNotFound`] if no accessible
  /// base has that name.
  pub async fn connect(config: &AirtableConfig) -> Result<Self> {
    let client = AirtableClient::new(config)?;

    let base = client
      .list_bases()
      .await?
      .into_iter()
      .find(|b| b.name == config.base_name)
      .ok_or_else(|| tablesync_core::Error::BaseNotFound(config.base_name.clone()))?;

    let tables = client.list_tables(&base.id).await?;
    info!(base = %base.name, tables = tables.len(), "connected to base");

    Ok(Self::from_parts(client, base, tables))
  }

  pub(crate) fn from_parts(
    client: AirtableClient,
    base: BaseMeta,
    tables: Vec<TableMeta>,
  ) -> Self {
    let tables = tables.into_iter().map(|t| (t.name.clone(), t)).collect();
    Self { client, base, tables }
  }

  pub fn base(&self) -> &BaseMeta { &self.base }

  fn table(&self, name: &str) -> Result<&TableMeta> {
    self
      .tables
      .get(name)
      .ok_or_else(|| tablesync_core::Error::UnknownSourceTable(name.to_owned()).into())
  }
}

impl TableSource for AirtableSource {
  type Error = Error;

  fn table_names(&self) -> Vec<String> { self.tables.keys().cloned().collect() }

  fn column_types(&self, name: &str) -> Result<Vec<(String, ColumnType)>> {
    Ok(declared_types(&self.table(name)?.fields))
  }

  fn read_table<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Batch>> + Send + 'a {
    async move {
      let table = self.table(name)?;
      let records = self.client.list_records(&self.base.id, &table.id).await?;
      info!(table = name, records = records.len(), "read table");
      Ok(records_to_batch(records, &table.fields)?)
    }
  }
}
