//! The `TableSource` trait: read-only access to an upstream container of
//! tables (e.g. an Airtable base).
//!
//! Every batch a source returns carries an `id` column holding the source's
//! own record identifier, which is what a merge sync matches on.

use std::{collections::BTreeMap, future::Future};

use crate::{Batch, ColumnType};

/// Column name under which sources expose their record identifier.
pub const RECORD_ID_COLUMN: &str = "id";

pub trait TableSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + From<crate::Error> + 'static;

  /// Names of every table in the container.
  fn table_names(&self) -> Vec<String>;

  /// Declared column types of `name`, for schema reconciliation. Fails with
  /// [`crate::Error::UnknownSourceTable`] for a name the container lacks.
  fn column_types(&self, name: &str) -> Result<Vec<(String, ColumnType)>, Self::Error>;

  /// All rows of `name`, in source order.
  fn read_table<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Batch, Self::Error>> + Send + 'a;

  /// Read several tables. `None` means every table. Every requested name is
  /// validated before anything is fetched.
  fn read_all_tables<'a>(
    &'a self,
    names: Option<&'a [String]>,
  ) -> impl Future<Output = Result<BTreeMap<String, Batch>, Self::Error>> + Send + 'a {
    async move {
      let known = self.table_names();
      let wanted: Vec<String> = match names {
        Some(names) => names.to_vec(),
        None => known.clone(),
      };
      if let Some(missing) = wanted.iter().find(|n| !known.contains(n)) {
        return Err(crate::Error::UnknownSourceTable(missing.clone()).into());
      }

      let mut out = BTreeMap::new();
      for name in wanted {
        let batch = self.read_table(&name).await?;
        out.insert(name, batch);
      }
      Ok(out)
    }
  }
}
