use std::collections::BTreeSet;

use rusqlite::{Connection, Result as SqlResult};

/// Quote an SQL identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Names of all user tables in the database.
pub fn existing_tables(conn: &Connection) -> SqlResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

pub fn table_is_empty(conn: &Connection, table: &str) -> SqlResult<bool> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {})", quote_ident(table));
    let any: bool = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(!any)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
}

impl ColumnInfo {
    pub fn is_integer(&self) -> bool {
        self.declared_type.to_uppercase().contains("INT")
    }

    /// SQLite TEXT affinity: the declared type mentions CHAR, CLOB or TEXT.
    pub fn is_text(&self) -> bool {
        let ty = self.declared_type.to_uppercase();
        !self.is_integer() && ["CHAR", "CLOB", "TEXT"].iter().any(|t| ty.contains(t))
    }
}

/// Columns of `table`, in table order.
pub(crate) fn table_columns(conn: &Connection, table: &str) -> SqlResult<Vec<ColumnInfo>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(ColumnInfo {
            name: row.get(1)?,
            declared_type: row.get(2)?,
            not_null: row.get(3)?,
        })
    })?;
    rows.collect()
}
