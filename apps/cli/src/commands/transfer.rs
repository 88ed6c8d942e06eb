use anyhow::{bail, Result};
use rusqlite::Connection;
use serde_json::Value;
use tracing::{info, warn};

use super::to_json;
use crate::cli::{ExportArgs, ImportFilesArgs, PurgeArgs, RestoreArgs};
use crate::config::CatalogConfig;

pub fn export(conn: &Connection, config: &CatalogConfig, args: ExportArgs) -> Result<Value> {
    let dir = args.dir.unwrap_or_else(|| config.csv_dir.clone());
    let report = glycodb_transfer::export_tables(conn, &dir)?;
    info!("Exported {} tables to {}", report.tables.len(), dir.display());
    to_json(&report)
}

pub fn restore(conn: &mut Connection, config: &CatalogConfig, args: RestoreArgs) -> Result<Value> {
    let dir = args.dir.unwrap_or_else(|| config.csv_dir.clone());
    let report = glycodb_transfer::restore_tables(conn, &dir)?;
    for file in &report.unmatched {
        warn!("No table for {}", file.display());
    }
    to_json(&report)
}

pub fn import_files(conn: &mut Connection, args: ImportFilesArgs) -> Result<Value> {
    let report = glycodb_transfer::restore_files(conn, &args.files)?;
    to_json(&report)
}

pub fn purge(conn: &mut Connection, args: PurgeArgs) -> Result<Value> {
    if !args.yes {
        bail!("purge-glycans deletes every glycan; pass --yes to confirm");
    }
    let removed = glycodb_transfer::purge_glycans(conn)?;
    to_json(&serde_json::json!({ "glycans_deleted": removed }))
}
