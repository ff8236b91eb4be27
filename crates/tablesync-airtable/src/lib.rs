//! Airtable implementation of [`tablesync_core::source::TableSource`].
//!
//! [`AirtableSource::connect`] resolves a base by name and caches its table
//! metadata; reads page through every record of a table and flatten each one
//! into a row keyed by the record id.

mod client;
mod convert;
mod source;

pub mod error;

pub use client::{AirtableClient, AirtableConfig, BaseMeta, FieldMeta, Record, TableMeta};
pub use convert::{column_type, normalize_timestamp, records_to_batch};
pub use error::{Error, Result};
pub use source::AirtableSource;
