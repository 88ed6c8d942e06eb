//! Restore catalog tables from CSV dumps.
//!
//! All loads of one run share a single transaction: either every table is
//! loaded, or nothing is.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use glycodb_store::composition::refresh_composition_strings;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::resolve::resolve_table_name;
use crate::tables::{existing_tables, quote_ident, table_columns, table_is_empty, ColumnInfo};
use crate::{TransferError, TransferResult};

const COMPOSITION_TABLE: &str = "monosaccharide_composition";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoredTable {
    pub table: String,
    pub file: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub started_at: DateTime<Utc>,
    pub restored: Vec<RestoredTable>,
    /// Tables left alone because they already held rows.
    pub skipped_populated: Vec<String>,
    /// CSV files with no matching table.
    pub unmatched: Vec<PathBuf>,
    /// Composition rows whose cached string was re-derived after loading.
    pub compositions_refreshed: usize,
}

impl RestoreReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            restored: Vec::new(),
            skipped_populated: Vec::new(),
            unmatched: Vec::new(),
            compositions_refreshed: 0,
        }
    }
}

/// Restore every `*.csv` file in `dir` into its matching, empty table.
///
/// Files are processed in name order. Files without a matching table and
/// tables that already hold rows are skipped. Any other failure rolls back
/// the whole run.
pub fn restore_tables(conn: &mut Connection, dir: &Path) -> TransferResult<RestoreReport> {
    if !dir.is_dir() {
        return Err(TransferError::MissingDirectory(dir.to_path_buf()));
    }
    let files = csv_files(dir)?;
    in_transaction(conn, |tx| {
        let tables = existing_tables(tx)?;
        restore_dir(tx, &tables, &files)
    })
}

/// Load an explicit list of `(table, file)` pairs, whether or not the
/// tables already hold rows.
pub fn restore_files(
    conn: &mut Connection,
    files: &[(String, PathBuf)],
) -> TransferResult<RestoreReport> {
    in_transaction(conn, |tx| {
        let tables = existing_tables(tx)?;
        let mut report = RestoreReport::new();
        for (table, path) in files {
            if !tables.contains(table) {
                return Err(TransferError::UnknownTable(table.clone()));
            }
            let rows = load_csv(tx, table, path)?;
            info!(table = %table, rows, file = %path.display(), "restored table");
            report.restored.push(RestoredTable {
                table: table.clone(),
                file: path.clone(),
                rows,
            });
        }
        finish(tx, &mut report)?;
        Ok(report)
    })
}

fn in_transaction<F>(conn: &mut Connection, work: F) -> TransferResult<RestoreReport>
where
    F: FnOnce(&Transaction<'_>) -> TransferResult<RestoreReport>,
{
    let tx = conn.transaction()?;
    let outcome = match work(&tx) {
        // Deferred foreign keys are checked here; a failed commit rolls back on drop
        Ok(report) => tx.commit().map(|_| report).map_err(TransferError::from),
        Err(e) => {
            tx.rollback()?;
            Err(e)
        }
    };
    if let Err(e) = &outcome {
        error!("restore failed, all tables rolled back: {}", e);
    }
    outcome
}

fn csv_files(dir: &Path) -> TransferResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn restore_dir(
    tx: &Connection,
    tables: &BTreeSet<String>,
    files: &[PathBuf],
) -> TransferResult<RestoreReport> {
    let mut report = RestoreReport::new();

    for path in files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let resolved = resolve_table_name(&stem, tables);
        info!(
            file = %path.display(),
            table = resolved.as_ref().map(|m| m.table.as_str()).unwrap_or("-"),
            "checking CSV"
        );

        let Some(found) = resolved else {
            warn!("no matching table found for '{}', skipping", stem);
            report.unmatched.push(path.clone());
            continue;
        };

        if !table_is_empty(tx, &found.table)? {
            info!("skipping {} (already contains data)", found.table);
            report.skipped_populated.push(found.table);
            continue;
        }

        let rows = load_csv(tx, &found.table, path)?;
        info!(table = %found.table, rows, rule = ?found.rule, "restored table");
        report.restored.push(RestoredTable {
            table: found.table,
            file: path.clone(),
            rows,
        });
    }

    finish(tx, &mut report)?;
    Ok(report)
}

/// Re-derive composition strings when compositions were part of the load.
fn finish(tx: &Connection, report: &mut RestoreReport) -> TransferResult<()> {
    if report.restored.iter().any(|r| r.table == COMPOSITION_TABLE) {
        report.compositions_refreshed = refresh_composition_strings(tx)?;
    }
    Ok(())
}

/// Insert every record of `path` into `table`, matching columns by header name.
fn load_csv(tx: &Connection, table: &str, path: &Path) -> TransferResult<usize> {
    let csv_err = |source| TransferError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let columns = table_columns(tx, table)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let mut targets = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let column = columns
            .iter()
            .find(|c| c.name == header)
            .ok_or_else(|| TransferError::UnknownColumn {
                table: table.to_string(),
                column: header.to_string(),
                file: path.to_path_buf(),
            })?;
        targets.push(column);
    }

    let column_list = headers
        .iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=headers.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        column_list,
        placeholders
    );

    let mut stmt = tx.prepare(&sql)?;
    let mut inserted = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let values = record
            .iter()
            .zip(&targets)
            .map(|(field, column)| field_to_value(field, column));
        inserted += stmt.execute(params_from_iter(values))?;
    }
    Ok(inserted)
}

/// Empty cells load as NULL, except in NOT NULL text columns where they are
/// the empty string. Boolean spellings from other databases' dumps
/// (`t`/`f`, `true`/`false`) are mapped to 1/0 in integer columns.
fn field_to_value(field: &str, column: &ColumnInfo) -> Value {
    let integer_column = column.is_integer();
    if field.is_empty() {
        return if column.not_null && column.is_text() {
            Value::Text(String::new())
        } else {
            Value::Null
        };
    }
    if integer_column {
        match field.to_ascii_lowercase().as_str() {
            "t" | "true" => return Value::Integer(1),
            "f" | "false" => return Value::Integer(0),
            _ => {}
        }
    }
    Value::Text(field.to_string())
}
