//! CSV dump and restore of catalog tables.

pub mod export;
pub mod purge;
pub mod resolve;
pub mod restore;
pub mod tables;

use std::path::PathBuf;

use thiserror::Error;

pub use export::{export_tables, ExportReport, ExportedTable};
pub use purge::purge_glycans;
pub use resolve::{camel_to_snake, resolve_table_name, MatchRule, TableMatch};
pub use restore::{restore_files, restore_tables, RestoreReport, RestoredTable};
pub use tables::{existing_tables, quote_ident, table_is_empty};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("CSV directory not found: {0}")]
    MissingDirectory(PathBuf),
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),
    #[error("Column '{column}' in {file} does not exist in table '{table}'")]
    UnknownColumn {
        table: String,
        column: String,
        file: PathBuf,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type TransferResult<T> = Result<T, TransferError>;
