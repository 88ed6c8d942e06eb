use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};

/// Create every catalog table if it does not exist.
///
/// Foreign keys are deferred to commit so bulk loads may arrive in any table
/// order within one transaction.
pub fn init_db(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS species (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS stage_of_life (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            stage   TEXT NOT NULL,
            age     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sublocation (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            organ       TEXT NOT NULL,
            structure   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS model_species (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            species_id          INTEGER NOT NULL REFERENCES species(id)
                                    ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            sublocation_id      INTEGER NOT NULL REFERENCES sublocation(id)
                                    ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            stage_of_life_id    INTEGER NOT NULL REFERENCES stage_of_life(id)
                                    ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED
        );

        CREATE TABLE IF NOT EXISTS monosaccharide_composition (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            h_num               INTEGER NOT NULL DEFAULT 0 CHECK (h_num >= 0),
            n_num               INTEGER NOT NULL DEFAULT 0 CHECK (n_num >= 0),
            f_num               INTEGER NOT NULL DEFAULT 0 CHECK (f_num >= 0),
            p_num               INTEGER NOT NULL DEFAULT 0 CHECK (p_num >= 0),
            t_num               INTEGER NOT NULL DEFAULT 0 CHECK (t_num >= 0),
            a_num               INTEGER NOT NULL DEFAULT 0 CHECK (a_num >= 0),
            g_num               INTEGER NOT NULL DEFAULT 0 CHECK (g_num >= 0),
            s_num               INTEGER NOT NULL DEFAULT 0 CHECK (s_num >= 0),
            e_num               INTEGER NOT NULL DEFAULT 0 CHECK (e_num >= 0),
            m_num               INTEGER NOT NULL DEFAULT 0 CHECK (m_num >= 0),
            composition_string  TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS diagnostic_fragment (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            motif_name  TEXT NOT NULL,
            mass        REAL NOT NULL DEFAULT 0.0
        );

        CREATE TABLE IF NOT EXISTS last_author (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name   TEXT NOT NULL,
            affiliation TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS study (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            title   TEXT NOT NULL,
            journal TEXT NOT NULL,
            year    INTEGER NOT NULL,
            doi     TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS study_last_authors (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            study_id        INTEGER NOT NULL REFERENCES study(id)
                                ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            last_author_id  INTEGER NOT NULL REFERENCES last_author(id)
                                ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            UNIQUE(study_id, last_author_id)
        );

        CREATE TABLE IF NOT EXISTS glycan (
            id                      TEXT PRIMARY KEY NOT NULL,
            structural_resolution   TEXT,
            composition_id          INTEGER NOT NULL REFERENCES monosaccharide_composition(id)
                                        ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            mass                    REAL NOT NULL,
            sialic_derivatization   INTEGER NOT NULL DEFAULT 0,
            gu_mean                 REAL NOT NULL,
            gu_max                  REAL NOT NULL,
            gu_min                  REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS glycan_model_species (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            glycan_id           TEXT NOT NULL REFERENCES glycan(id)
                                    ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            model_species_id    INTEGER NOT NULL REFERENCES model_species(id)
                                    ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            UNIQUE(glycan_id, model_species_id)
        );

        CREATE TABLE IF NOT EXISTS glycan_studies (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            glycan_id   TEXT NOT NULL REFERENCES glycan(id)
                            ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            study_id    INTEGER NOT NULL REFERENCES study(id)
                            ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            UNIQUE(glycan_id, study_id)
        );

        CREATE TABLE IF NOT EXISTS glycan_diagnostic_fragments (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            glycan_id               TEXT NOT NULL REFERENCES glycan(id)
                                        ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            diagnostic_fragment_id  INTEGER NOT NULL REFERENCES diagnostic_fragment(id)
                                        ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            UNIQUE(glycan_id, diagnostic_fragment_id)
        );

        CREATE INDEX IF NOT EXISTS idx_composition_string
            ON monosaccharide_composition(composition_string);
        CREATE INDEX IF NOT EXISTS idx_glycan_gu_mean ON glycan(gu_mean);
        CREATE INDEX IF NOT EXISTS idx_glycan_mass ON glycan(mass);
        CREATE INDEX IF NOT EXISTS idx_study_year ON study(year);",
    )
}

/// Open (creating if needed) a catalog database file and ensure the schema.
pub fn open(path: impl AsRef<Path>) -> SqlResult<Connection> {
    let conn = Connection::open(path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// In-memory catalog, mostly for tests.
pub fn open_in_memory() -> SqlResult<Connection> {
    let conn = Connection::open_in_memory()?;
    init_db(&conn)?;
    Ok(conn)
}

/// `%query%` for a `LIKE ... ESCAPE '\'` substring match, with the query's
/// own `%`, `_` and `\` matched literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Whether a row with integer primary key `id` exists in `table`.
///
/// `table` must be one of the fixed catalog table names.
pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> SqlResult<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    let found: Option<i64> = conn
        .query_row(&sql, params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}
