//! SQLite backend for tablesync.
//!
//! [`SqliteStore`] owns one [`rusqlite::Connection`] for its whole lifetime
//! and implements the storage contract from `tablesync-core`: whole-table
//! reads and writes, single-row inserts, additive column migration and
//! identity-keyed upsert.

mod encode;
mod schema;
mod store;
mod upsert;
mod writer;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
