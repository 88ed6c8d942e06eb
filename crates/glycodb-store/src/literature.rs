//! Studies and their last authors.

use glycodb_core::{LastAuthor, Study, ValidationError};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use serde::{Deserialize, Serialize};

use crate::error::{map_unique, StoreError, StoreResult};
use crate::schema::{like_pattern, row_exists};

/// Insert payload for a study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudy {
    pub title: String,
    pub journal: String,
    pub year: i32,
    pub doi: String,
    #[serde(default)]
    pub last_author_ids: Vec<i64>,
}

pub fn add_author(conn: &Connection, full_name: &str, affiliation: &str) -> StoreResult<i64> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(ValidationError::Empty { field: "full_name" }.into());
    }
    conn.execute(
        "INSERT INTO last_author (full_name, affiliation) VALUES (?1, ?2)",
        params![full_name, affiliation.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_authors(conn: &Connection) -> SqlResult<Vec<LastAuthor>> {
    let mut stmt =
        conn.prepare("SELECT id, full_name, affiliation FROM last_author ORDER BY full_name")?;
    let rows = stmt.query_map([], row_to_author)?;
    rows.collect()
}

/// Search authors by name or affiliation.
pub fn search_authors(conn: &Connection, query: &str) -> SqlResult<Vec<LastAuthor>> {
    let pattern = like_pattern(query);
    let mut stmt = conn.prepare(
        "SELECT id, full_name, affiliation FROM last_author
         WHERE full_name LIKE ?1 ESCAPE '\\' OR affiliation LIKE ?1 ESCAPE '\\'
         ORDER BY full_name",
    )?;
    let rows = stmt.query_map(params![pattern], row_to_author)?;
    rows.collect()
}

/// Insert a study and its author links atomically. DOIs are unique.
pub fn add_study(conn: &Connection, study: &NewStudy) -> StoreResult<i64> {
    let doi = study.doi.trim();
    if doi.is_empty() {
        return Err(ValidationError::Empty { field: "doi" }.into());
    }
    if study.title.trim().is_empty() {
        return Err(ValidationError::Empty { field: "title" }.into());
    }
    for &author_id in &study.last_author_ids {
        if !row_exists(conn, "last_author", author_id)? {
            return Err(StoreError::not_found("LastAuthor", author_id));
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO study (title, journal, year, doi) VALUES (?1, ?2, ?3, ?4)",
        params![study.title.trim(), study.journal.trim(), study.year, doi],
    )
    .map_err(|e| map_unique(e, "Study", "doi", doi))?;
    let id = tx.last_insert_rowid();
    for &author_id in &study.last_author_ids {
        tx.execute(
            "INSERT OR IGNORE INTO study_last_authors (study_id, last_author_id)
             VALUES (?1, ?2)",
            params![id, author_id],
        )?;
    }
    tx.commit()?;
    Ok(id)
}

pub fn authors_for_study(conn: &Connection, study_id: i64) -> SqlResult<Vec<LastAuthor>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.full_name, a.affiliation
         FROM last_author a
         JOIN study_last_authors sla ON sla.last_author_id = a.id
         WHERE sla.study_id = ?1
         ORDER BY a.full_name",
    )?;
    let rows = stmt.query_map(params![study_id], row_to_author)?;
    rows.collect()
}

pub fn get_study(conn: &Connection, id: i64) -> SqlResult<Option<Study>> {
    let study = conn
        .query_row(
            "SELECT id, title, journal, year, doi FROM study WHERE id = ?1",
            params![id],
            row_to_study,
        )
        .optional()?;
    match study {
        Some(mut study) => {
            study.last_authors = authors_for_study(conn, study.id)?;
            Ok(Some(study))
        }
        None => Ok(None),
    }
}

/// List studies, optionally narrowed to a publication year and/or journal.
pub fn list_studies(
    conn: &Connection,
    year: Option<i32>,
    journal: Option<&str>,
) -> SqlResult<Vec<Study>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, journal, year, doi FROM study
         WHERE (?1 IS NULL OR year = ?1) AND (?2 IS NULL OR journal = ?2)
         ORDER BY year DESC, title",
    )?;
    let rows = stmt.query_map(params![year, journal], row_to_study)?;
    with_authors(conn, rows.collect::<SqlResult<Vec<_>>>()?)
}

/// Search studies by title, journal, DOI or author name.
pub fn search_studies(conn: &Connection, query: &str) -> SqlResult<Vec<Study>> {
    let pattern = like_pattern(query);
    let mut stmt = conn.prepare(
        "SELECT DISTINCT s.id, s.title, s.journal, s.year, s.doi
         FROM study s
         LEFT JOIN study_last_authors sla ON sla.study_id = s.id
         LEFT JOIN last_author a ON a.id = sla.last_author_id
         WHERE s.title LIKE ?1 ESCAPE '\\'
            OR s.journal LIKE ?1 ESCAPE '\\'
            OR s.doi LIKE ?1 ESCAPE '\\'
            OR a.full_name LIKE ?1 ESCAPE '\\'
         ORDER BY s.year DESC, s.title",
    )?;
    let rows = stmt.query_map(params![pattern], row_to_study)?;
    with_authors(conn, rows.collect::<SqlResult<Vec<_>>>()?)
}

pub fn delete_study(conn: &Connection, id: i64) -> SqlResult<bool> {
    let changed = conn.execute("DELETE FROM study WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

fn with_authors(conn: &Connection, mut studies: Vec<Study>) -> SqlResult<Vec<Study>> {
    for study in &mut studies {
        study.last_authors = authors_for_study(conn, study.id)?;
    }
    Ok(studies)
}

fn row_to_author(row: &rusqlite::Row) -> SqlResult<LastAuthor> {
    Ok(LastAuthor {
        id: row.get(0)?,
        full_name: row.get(1)?,
        affiliation: row.get(2)?,
    })
}

fn row_to_study(row: &rusqlite::Row) -> SqlResult<Study> {
    Ok(Study {
        id: row.get(0)?,
        title: row.get(1)?,
        journal: row.get(2)?,
        year: row.get(3)?,
        doi: row.get(4)?,
        last_authors: Vec::new(),
    })
}
