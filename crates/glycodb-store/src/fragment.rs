use glycodb_core::{DiagnosticFragment, ValidationError};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};

use crate::error::StoreResult;
use crate::schema::like_pattern;

pub fn add_fragment(conn: &Connection, motif_name: &str, mass: f64) -> StoreResult<i64> {
    let motif_name = motif_name.trim();
    if motif_name.is_empty() {
        return Err(ValidationError::Empty { field: "motif_name" }.into());
    }
    if !mass.is_finite() {
        return Err(ValidationError::NotFinite { field: "mass" }.into());
    }
    conn.execute(
        "INSERT INTO diagnostic_fragment (motif_name, mass) VALUES (?1, ?2)",
        params![motif_name, mass],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_fragment(conn: &Connection, id: i64) -> SqlResult<Option<DiagnosticFragment>> {
    conn.query_row(
        "SELECT id, motif_name, mass FROM diagnostic_fragment WHERE id = ?1",
        params![id],
        row_to_fragment,
    )
    .optional()
}

pub fn list_fragments(conn: &Connection) -> SqlResult<Vec<DiagnosticFragment>> {
    let mut stmt =
        conn.prepare("SELECT id, motif_name, mass FROM diagnostic_fragment ORDER BY id")?;
    let rows = stmt.query_map([], row_to_fragment)?;
    rows.collect()
}

/// Search by motif name, or by the textual form of the mass (e.g. "366").
pub fn search_fragments(conn: &Connection, query: &str) -> SqlResult<Vec<DiagnosticFragment>> {
    let pattern = like_pattern(query);
    let mut stmt = conn.prepare(
        "SELECT id, motif_name, mass FROM diagnostic_fragment
         WHERE motif_name LIKE ?1 ESCAPE '\\'
            OR CAST(mass AS TEXT) LIKE ?1 ESCAPE '\\'
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![pattern], row_to_fragment)?;
    rows.collect()
}

pub fn delete_fragment(conn: &Connection, id: i64) -> SqlResult<bool> {
    let changed = conn.execute("DELETE FROM diagnostic_fragment WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

fn row_to_fragment(row: &rusqlite::Row) -> SqlResult<DiagnosticFragment> {
    Ok(DiagnosticFragment {
        id: row.get(0)?,
        motif_name: row.get(1)?,
        mass: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::open_in_memory;
    use crate::StoreError;

    #[test]
    fn test_fragment_crud_and_search() {
        let conn = open_in_memory().unwrap();
        let id = add_fragment(&conn, "HexHexNAc", 366.14).unwrap();
        add_fragment(&conn, "NeuAc", 292.10).unwrap();

        assert_eq!(get_fragment(&conn, id).unwrap().unwrap().motif_name, "HexHexNAc");
        assert_eq!(search_fragments(&conn, "neu").unwrap().len(), 1);
        assert_eq!(search_fragments(&conn, "366").unwrap().len(), 1);
        assert!(search_fragments(&conn, "_").unwrap().is_empty());

        assert!(delete_fragment(&conn, id).unwrap());
        assert_eq!(list_fragments(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_fragment_validation() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            add_fragment(&conn, "", 1.0),
            Err(StoreError::Invalid(ValidationError::Empty { .. }))
        ));
        assert!(matches!(
            add_fragment(&conn, "X", f64::INFINITY),
            Err(StoreError::Invalid(ValidationError::NotFinite { .. }))
        ));
    }
}
