use rusqlite::Connection;
use tracing::info;

use crate::TransferResult;

const GLYCAN_LINK_TABLES: [&str; 3] = [
    "glycan_model_species",
    "glycan_studies",
    "glycan_diagnostic_fragments",
];

/// Remove every glycan and its link rows, resetting the link tables'
/// identity counters. Returns the number of glycans removed.
pub fn purge_glycans(conn: &mut Connection) -> TransferResult<usize> {
    let tx = conn.transaction()?;
    for table in GLYCAN_LINK_TABLES {
        tx.execute(&format!("DELETE FROM {}", table), [])?;
    }
    let removed = tx.execute("DELETE FROM glycan", [])?;
    // sqlite_sequence only exists once an AUTOINCREMENT table has taken a row
    let has_sequence: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE name = 'sqlite_sequence')",
        [],
        |row| row.get(0),
    )?;
    if has_sequence {
        for table in GLYCAN_LINK_TABLES {
            tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [table])?;
        }
    }
    tx.commit()?;
    info!(removed, "purged glycans");
    Ok(removed)
}
