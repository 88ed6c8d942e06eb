//! Monosaccharide compositions. The composition string column is derived from
//! the ten counts on every write and is never taken from the caller.

use glycodb_core::{Composition, CompositionRecord};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::schema::like_pattern;

const COMPOSITION_COLUMNS: &str = "id, h_num, n_num, f_num, p_num, t_num, a_num, g_num, \
                                   s_num, e_num, m_num, composition_string";

/// Insert a composition and return its row ID.
pub fn save_composition(conn: &Connection, composition: &Composition) -> SqlResult<i64> {
    let c = composition;
    conn.execute(
        "INSERT INTO monosaccharide_composition
            (h_num, n_num, f_num, p_num, t_num, a_num, g_num, s_num, e_num, m_num,
             composition_string)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![c.h, c.n, c.f, c.p, c.t, c.a, c.g, c.s, c.e, c.m, c.encode()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the counts of an existing composition, re-deriving its string.
pub fn update_composition(
    conn: &Connection,
    id: i64,
    composition: &Composition,
) -> StoreResult<CompositionRecord> {
    let c = composition;
    let changed = conn.execute(
        "UPDATE monosaccharide_composition
         SET h_num = ?1, n_num = ?2, f_num = ?3, p_num = ?4, t_num = ?5,
             a_num = ?6, g_num = ?7, s_num = ?8, e_num = ?9, m_num = ?10,
             composition_string = ?11
         WHERE id = ?12",
        params![c.h, c.n, c.f, c.p, c.t, c.a, c.g, c.s, c.e, c.m, c.encode(), id],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("MonosaccharideComposition", id));
    }
    Ok(CompositionRecord::new(id, *composition))
}

pub fn get_composition(conn: &Connection, id: i64) -> SqlResult<Option<CompositionRecord>> {
    let sql = format!(
        "SELECT {} FROM monosaccharide_composition WHERE id = ?1",
        COMPOSITION_COLUMNS
    );
    conn.query_row(&sql, params![id], row_to_record).optional()
}

pub fn list_compositions(conn: &Connection) -> SqlResult<Vec<CompositionRecord>> {
    let sql = format!(
        "SELECT {} FROM monosaccharide_composition ORDER BY id",
        COMPOSITION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_record)?;
    rows.collect()
}

/// Search by composition string fragment (case-insensitive LIKE).
pub fn search_compositions(conn: &Connection, query: &str) -> SqlResult<Vec<CompositionRecord>> {
    let pattern = like_pattern(query);
    let sql = format!(
        "SELECT {} FROM monosaccharide_composition
         WHERE composition_string LIKE ?1 ESCAPE '\\' ORDER BY id",
        COMPOSITION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], row_to_record)?;
    rows.collect()
}

/// Return the first stored composition with exactly these counts, inserting
/// one if none exists.
pub fn find_or_create_composition(
    conn: &Connection,
    composition: &Composition,
) -> SqlResult<CompositionRecord> {
    let c = composition;
    let sql = format!(
        "SELECT {} FROM monosaccharide_composition
         WHERE h_num = ?1 AND n_num = ?2 AND f_num = ?3 AND p_num = ?4 AND t_num = ?5
           AND a_num = ?6 AND g_num = ?7 AND s_num = ?8 AND e_num = ?9 AND m_num = ?10
         ORDER BY id LIMIT 1",
        COMPOSITION_COLUMNS
    );
    let existing = conn
        .query_row(
            &sql,
            params![c.h, c.n, c.f, c.p, c.t, c.a, c.g, c.s, c.e, c.m],
            row_to_record,
        )
        .optional()?;
    match existing {
        Some(record) => Ok(record),
        None => {
            let id = save_composition(conn, composition)?;
            Ok(CompositionRecord::new(id, *composition))
        }
    }
}

/// Re-derive every stored composition string from its counts.
/// Returns the number of rows whose string changed.
pub fn refresh_composition_strings(conn: &Connection) -> SqlResult<usize> {
    let records = list_compositions(conn)?;
    let mut stmt = conn.prepare(
        "UPDATE monosaccharide_composition SET composition_string = ?1 WHERE id = ?2",
    )?;
    let mut changed = 0usize;
    for record in records {
        let expected = record.composition.encode();
        if record.composition_string != expected {
            stmt.execute(params![expected, record.id])?;
            changed += 1;
        }
    }
    debug!(changed, "refreshed composition strings");
    Ok(changed)
}

fn row_to_record(row: &rusqlite::Row) -> SqlResult<CompositionRecord> {
    let composition = Composition::from_counts([
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ]);
    Ok(CompositionRecord {
        id: row.get(0)?,
        composition,
        composition_string: row.get(11)?,
    })
}
