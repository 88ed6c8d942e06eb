//! Species, life stages, sublocations and the model species combining them.

use glycodb_core::{ModelSpecies, Species, StageOfLife, Sublocation, ValidationError};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};

use crate::error::{map_unique, StoreError, StoreResult};
use crate::schema::{like_pattern, row_exists};

fn require_text(field: &'static str, value: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field }.into());
    }
    Ok(trimmed.to_string())
}

/// Insert a species. Names are unique; a repeat is reported as a duplicate.
pub fn add_species(conn: &Connection, name: &str) -> StoreResult<i64> {
    let name = require_text("name", name)?;
    conn.execute("INSERT INTO species (name) VALUES (?1)", params![name])
        .map_err(|e| map_unique(e, "Species", "name", &name))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_species(conn: &Connection, id: i64) -> SqlResult<Option<Species>> {
    conn.query_row(
        "SELECT id, name FROM species WHERE id = ?1",
        params![id],
        row_to_species,
    )
    .optional()
}

pub fn find_species_by_name(conn: &Connection, name: &str) -> SqlResult<Option<Species>> {
    conn.query_row(
        "SELECT id, name FROM species WHERE name = ?1",
        params![name.trim()],
        row_to_species,
    )
    .optional()
}

pub fn list_species(conn: &Connection) -> SqlResult<Vec<Species>> {
    let mut stmt = conn.prepare("SELECT id, name FROM species ORDER BY name")?;
    let rows = stmt.query_map([], row_to_species)?;
    rows.collect()
}

/// Search species by name (case-insensitive LIKE).
pub fn search_species(conn: &Connection, query: &str) -> SqlResult<Vec<Species>> {
    let pattern = like_pattern(query);
    let mut stmt =
        conn.prepare("SELECT id, name FROM species WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name")?;
    let rows = stmt.query_map(params![pattern], row_to_species)?;
    rows.collect()
}

/// Delete a species and, by cascade, its model species. Returns true if a row went.
pub fn delete_species(conn: &Connection, id: i64) -> SqlResult<bool> {
    let changed = conn.execute("DELETE FROM species WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn add_stage_of_life(conn: &Connection, stage: &str, age: &str) -> StoreResult<i64> {
    let stage = require_text("stage", stage)?;
    let age = require_text("age", age)?;
    conn.execute(
        "INSERT INTO stage_of_life (stage, age) VALUES (?1, ?2)",
        params![stage, age],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_stages_of_life(conn: &Connection) -> SqlResult<Vec<StageOfLife>> {
    let mut stmt = conn.prepare("SELECT id, stage, age FROM stage_of_life ORDER BY id")?;
    let rows = stmt.query_map([], row_to_stage)?;
    rows.collect()
}

/// Search stages by stage or age text.
pub fn search_stages_of_life(conn: &Connection, query: &str) -> SqlResult<Vec<StageOfLife>> {
    let pattern = like_pattern(query);
    let mut stmt = conn.prepare(
        "SELECT id, stage, age FROM stage_of_life
         WHERE stage LIKE ?1 ESCAPE '\\' OR age LIKE ?1 ESCAPE '\\' ORDER BY id",
    )?;
    let rows = stmt.query_map(params![pattern], row_to_stage)?;
    rows.collect()
}

pub fn add_sublocation(conn: &Connection, organ: &str, structure: &str) -> StoreResult<i64> {
    let organ = require_text("organ", organ)?;
    let structure = require_text("structure", structure)?;
    conn.execute(
        "INSERT INTO sublocation (organ, structure) VALUES (?1, ?2)",
        params![organ, structure],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_sublocations(conn: &Connection) -> SqlResult<Vec<Sublocation>> {
    let mut stmt = conn.prepare("SELECT id, organ, structure FROM sublocation ORDER BY id")?;
    let rows = stmt.query_map([], row_to_sublocation)?;
    rows.collect()
}

/// Search sublocations by organ or structure.
pub fn search_sublocations(conn: &Connection, query: &str) -> SqlResult<Vec<Sublocation>> {
    let pattern = like_pattern(query);
    let mut stmt = conn.prepare(
        "SELECT id, organ, structure FROM sublocation
         WHERE organ LIKE ?1 ESCAPE '\\' OR structure LIKE ?1 ESCAPE '\\' ORDER BY id",
    )?;
    let rows = stmt.query_map(params![pattern], row_to_sublocation)?;
    rows.collect()
}

/// Link a species to a sublocation and stage of life. All three must exist.
pub fn add_model_species(
    conn: &Connection,
    species_id: i64,
    sublocation_id: i64,
    stage_of_life_id: i64,
) -> StoreResult<i64> {
    if !row_exists(conn, "species", species_id)? {
        return Err(StoreError::not_found("Species", species_id));
    }
    if !row_exists(conn, "sublocation", sublocation_id)? {
        return Err(StoreError::not_found("Sublocation", sublocation_id));
    }
    if !row_exists(conn, "stage_of_life", stage_of_life_id)? {
        return Err(StoreError::not_found("StageOfLife", stage_of_life_id));
    }
    conn.execute(
        "INSERT INTO model_species (species_id, sublocation_id, stage_of_life_id)
         VALUES (?1, ?2, ?3)",
        params![species_id, sublocation_id, stage_of_life_id],
    )?;
    Ok(conn.last_insert_rowid())
}

const MODEL_SPECIES_SELECT: &str = "
    SELECT ms.id, sp.id, sp.name, sl.id, sl.organ, sl.structure, st.id, st.stage, st.age
    FROM model_species ms
    JOIN species sp ON sp.id = ms.species_id
    JOIN sublocation sl ON sl.id = ms.sublocation_id
    JOIN stage_of_life st ON st.id = ms.stage_of_life_id";

pub fn get_model_species(conn: &Connection, id: i64) -> SqlResult<Option<ModelSpecies>> {
    let sql = format!("{} WHERE ms.id = ?1", MODEL_SPECIES_SELECT);
    conn.query_row(&sql, params![id], row_to_model_species)
        .optional()
}

/// List model species, optionally narrowed to one species and/or stage of life.
pub fn list_model_species(
    conn: &Connection,
    species_id: Option<i64>,
    stage_of_life_id: Option<i64>,
) -> SqlResult<Vec<ModelSpecies>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR ms.species_id = ?1)
           AND (?2 IS NULL OR ms.stage_of_life_id = ?2)
         ORDER BY ms.id",
        MODEL_SPECIES_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![species_id, stage_of_life_id], row_to_model_species)?;
    rows.collect()
}

/// Search model species by species name, organ or stage.
pub fn search_model_species(conn: &Connection, query: &str) -> SqlResult<Vec<ModelSpecies>> {
    let pattern = like_pattern(query);
    let sql = format!(
        "{} WHERE sp.name LIKE ?1 ESCAPE '\\'
              OR sl.organ LIKE ?1 ESCAPE '\\'
              OR st.stage LIKE ?1 ESCAPE '\\'
         ORDER BY ms.id",
        MODEL_SPECIES_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], row_to_model_species)?;
    rows.collect()
}

fn row_to_species(row: &rusqlite::Row) -> SqlResult<Species> {
    Ok(Species {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn row_to_stage(row: &rusqlite::Row) -> SqlResult<StageOfLife> {
    Ok(StageOfLife {
        id: row.get(0)?,
        stage: row.get(1)?,
        age: row.get(2)?,
    })
}

fn row_to_sublocation(row: &rusqlite::Row) -> SqlResult<Sublocation> {
    Ok(Sublocation {
        id: row.get(0)?,
        organ: row.get(1)?,
        structure: row.get(2)?,
    })
}

fn row_to_model_species(row: &rusqlite::Row) -> SqlResult<ModelSpecies> {
    Ok(ModelSpecies {
        id: row.get(0)?,
        species: Species {
            id: row.get(1)?,
            name: row.get(2)?,
        },
        sublocation: Sublocation {
            id: row.get(3)?,
            organ: row.get(4)?,
            structure: row.get(5)?,
        },
        stage_of_life: StageOfLife {
            id: row.get(6)?,
            stage: row.get(7)?,
            age: row.get(8)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::open_in_memory;

    #[test]
    fn test_species_unique_name() {
        let conn = open_in_memory().unwrap();
        add_species(&conn, "Mus musculus").unwrap();
        let err = add_species(&conn, "Mus musculus").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Duplicate { entity: "Species", field: "name", .. }
        ));
    }

    #[test]
    fn test_species_rejects_blank_name() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            add_species(&conn, "   "),
            Err(StoreError::Invalid(ValidationError::Empty { field: "name" }))
        ));
    }

    #[test]
    fn test_species_search_and_delete() {
        let conn = open_in_memory().unwrap();
        let mouse = add_species(&conn, "Mus musculus").unwrap();
        add_species(&conn, "Homo sapiens").unwrap();

        let hits = search_species(&conn, "mus").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, mouse);

        assert!(delete_species(&conn, mouse).unwrap());
        assert!(get_species(&conn, mouse).unwrap().is_none());
        assert_eq!(list_species(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let conn = open_in_memory().unwrap();
        add_species(&conn, "Mus musculus").unwrap();
        let odd = add_species(&conn, "strain_B6 100%").unwrap();

        let hits = search_species(&conn, "_").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, odd);
        assert_eq!(search_species(&conn, "%").unwrap().len(), 1);
        assert!(search_species(&conn, "s_m").unwrap().is_empty());

        let brain = add_sublocation(&conn, "Brain", "Cortex").unwrap();
        let adult = add_stage_of_life(&conn, "Adult", "P60").unwrap();
        add_model_species(&conn, odd, brain, adult).unwrap();
        assert_eq!(search_model_species(&conn, "_B6").unwrap().len(), 1);
        assert!(search_model_species(&conn, "B_6").unwrap().is_empty());
    }

    #[test]
    fn test_model_species_join_and_filters() {
        let conn = open_in_memory().unwrap();
        let mouse = add_species(&conn, "Mus musculus").unwrap();
        let rat = add_species(&conn, "Rattus norvegicus").unwrap();
        let cortex = add_sublocation(&conn, "Brain", "Cortex").unwrap();
        let adult = add_stage_of_life(&conn, "Adult", "12 weeks").unwrap();
        let pup = add_stage_of_life(&conn, "Juvenile", "P7").unwrap();

        let ms1 = add_model_species(&conn, mouse, cortex, adult).unwrap();
        add_model_species(&conn, mouse, cortex, pup).unwrap();
        add_model_species(&conn, rat, cortex, adult).unwrap();

        let fetched = get_model_species(&conn, ms1).unwrap().unwrap();
        assert_eq!(fetched.to_string(), "Mus musculus - Brain - Cortex - Adult - 12 weeks");

        assert_eq!(list_model_species(&conn, None, None).unwrap().len(), 3);
        assert_eq!(list_model_species(&conn, Some(mouse), None).unwrap().len(), 2);
        assert_eq!(list_model_species(&conn, Some(mouse), Some(pup)).unwrap().len(), 1);
        assert_eq!(search_model_species(&conn, "Rattus").unwrap().len(), 1);
        assert_eq!(search_model_species(&conn, "Juven").unwrap().len(), 1);
    }

    #[test]
    fn test_model_species_requires_parents() {
        let conn = open_in_memory().unwrap();
        let mouse = add_species(&conn, "Mus musculus").unwrap();
        let err = add_model_species(&conn, mouse, 99, 99).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Sublocation", .. }));
    }

    #[test]
    fn test_stage_and_sublocation_search() {
        let conn = open_in_memory().unwrap();
        add_stage_of_life(&conn, "Adult", "12 weeks").unwrap();
        add_sublocation(&conn, "Brain", "Hippocampus").unwrap();
        assert_eq!(search_stages_of_life(&conn, "weeks").unwrap().len(), 1);
        assert_eq!(search_sublocations(&conn, "hippo").unwrap().len(), 1);
        assert_eq!(list_sublocations(&conn).unwrap().len(), 1);
        assert_eq!(list_stages_of_life(&conn).unwrap().len(), 1);
    }
}
