//! Core types and trait definitions for tablesync.
//!
//! This crate has no HTTP or database dependencies. Storage
//! backends implement the traits in [`store`]; remote sources implement
//! [`source::TableSource`]. Schema reconciliation and the sync driver are
//! written only against those traits.

pub mod batch;
pub mod error;
pub mod memory;
pub mod migrate;
pub mod source;
pub mod store;
pub mod sync;
pub mod value;

pub use batch::Batch;
pub use error::{Error, Result};
pub use value::{ColumnType, Row, Value};
