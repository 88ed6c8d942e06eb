use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::tables::{existing_tables, quote_ident};
use crate::{TransferError, TransferResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedTable {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<ExportedTable>,
}

/// Write every table to `<dir>/<table>.csv` with a header row.
///
/// The directory is created if missing; existing files are overwritten.
pub fn export_tables(conn: &Connection, dir: &Path) -> TransferResult<ExportReport> {
    fs::create_dir_all(dir)?;

    let mut tables = Vec::new();
    for table in existing_tables(conn)? {
        let path = dir.join(format!("{}.csv", table));
        let rows = export_table(conn, &table, &path)?;
        info!(table = %table, rows, path = %path.display(), "exported table");
        tables.push(ExportedTable { table, path, rows });
    }

    Ok(ExportReport {
        finished_at: Utc::now(),
        tables,
    })
}

fn export_table(conn: &Connection, table: &str, path: &Path) -> TransferResult<usize> {
    let csv_err = |source| TransferError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    writer.write_record(&columns).map_err(csv_err)?;

    let mut rows = stmt.query([])?;
    let mut count = 0usize;
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            record.push(value_to_field(row.get_ref(i)?));
        }
        writer.write_record(&record).map_err(csv_err)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Render a stored value as a CSV cell. NULL becomes an empty cell.
fn value_to_field(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}
