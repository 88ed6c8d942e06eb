//! SQLite-backed storage for the glycan catalog.
//!
//! Every function takes an explicit [`rusqlite::Connection`]; callers own the
//! connection and its lifetime.

pub mod composition;
pub mod error;
pub mod fragment;
pub mod glycan;
pub mod literature;
pub mod schema;
pub mod taxonomy;

pub use error::{StoreError, StoreResult};
pub use schema::{init_db, open, open_in_memory};
