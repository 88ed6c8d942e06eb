//! Glycan records, their links, and the list filters over them.

use glycodb_core::{
    generate_unique_id, Glycan, GlycanId, GuRange, IdRegistry, MassRange, NewGlycan, RangeBucket,
};
use rand::Rng;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqlResult};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::schema::{like_pattern, row_exists};

/// The glycan table viewed as an identifier registry.
pub struct GlycanTable<'a>(pub &'a Connection);

impl IdRegistry for GlycanTable<'_> {
    type Error = StoreError;

    fn contains(&self, id: &GlycanId) -> Result<bool, Self::Error> {
        let found: Option<i64> = self
            .0
            .query_row(
                "SELECT 1 FROM glycan WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// List filters. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlycanFilter {
    /// Glycans linked to any model species of this species.
    pub species_id: Option<i64>,
    pub sialic_derivatization: Option<bool>,
    pub gu_range: Option<GuRange>,
    pub mass_range: Option<MassRange>,
    /// Substring of the composition string.
    pub composition_query: Option<String>,
}

/// Store a new glycan under a freshly generated `LBG-XXXXX` identifier.
pub fn add_glycan(conn: &Connection, glycan: &NewGlycan) -> StoreResult<GlycanId> {
    add_glycan_with_rng(conn, glycan, &mut rand::thread_rng())
}

/// As [`add_glycan`], drawing identifier candidates from `rng`.
pub fn add_glycan_with_rng<R: Rng>(
    conn: &Connection,
    glycan: &NewGlycan,
    rng: &mut R,
) -> StoreResult<GlycanId> {
    glycan.validate()?;
    check_links(conn, glycan)?;

    let tx = conn.unchecked_transaction()?;
    let id = generate_unique_id(&GlycanTable(&tx), rng)?;
    tx.execute(
        "INSERT INTO glycan
            (id, structural_resolution, composition_id, mass, sialic_derivatization,
             gu_mean, gu_max, gu_min)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id.as_str(),
            glycan.structural_resolution,
            glycan.composition_id,
            glycan.mass,
            glycan.sialic_derivatization,
            glycan.gu_mean,
            glycan.gu_max,
            glycan.gu_min,
        ],
    )?;
    insert_links(&tx, &id, glycan)?;
    tx.commit()?;

    debug!(glycan_id = %id, "stored glycan");
    Ok(id)
}

/// Replace measurements and links of an existing glycan. The identifier is kept.
pub fn update_glycan(conn: &Connection, id: &GlycanId, glycan: &NewGlycan) -> StoreResult<()> {
    glycan.validate()?;
    check_links(conn, glycan)?;

    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE glycan
         SET structural_resolution = ?1, composition_id = ?2, mass = ?3,
             sialic_derivatization = ?4, gu_mean = ?5, gu_max = ?6, gu_min = ?7
         WHERE id = ?8",
        params![
            glycan.structural_resolution,
            glycan.composition_id,
            glycan.mass,
            glycan.sialic_derivatization,
            glycan.gu_mean,
            glycan.gu_max,
            glycan.gu_min,
            id.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("Glycan", id));
    }
    for table in LINK_TABLES {
        tx.execute(
            &format!("DELETE FROM {} WHERE glycan_id = ?1", table),
            params![id.as_str()],
        )?;
    }
    insert_links(&tx, id, glycan)?;
    tx.commit()?;
    Ok(())
}

pub fn get_glycan(conn: &Connection, id: &GlycanId) -> SqlResult<Option<Glycan>> {
    let sql = format!("{} WHERE g.id = ?1", GLYCAN_SELECT);
    let glycan = conn
        .query_row(&sql, params![id.as_str()], row_to_glycan)
        .optional()?;
    match glycan {
        Some(mut glycan) => {
            load_links(conn, &mut glycan)?;
            Ok(Some(glycan))
        }
        None => Ok(None),
    }
}

/// Delete a glycan and its link rows. Returns true if it existed.
pub fn delete_glycan(conn: &Connection, id: &GlycanId) -> SqlResult<bool> {
    let changed = conn.execute("DELETE FROM glycan WHERE id = ?1", params![id.as_str()])?;
    Ok(changed > 0)
}

/// List glycans matching every set field of `filter`, ordered by identifier.
pub fn filter_glycans(conn: &Connection, filter: &GlycanFilter) -> SqlResult<Vec<Glycan>> {
    let mut clauses: Vec<&'static str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(species_id) = filter.species_id {
        clauses.push(
            "EXISTS (SELECT 1 FROM glycan_model_species gms
                     JOIN model_species ms ON ms.id = gms.model_species_id
                     WHERE gms.glycan_id = g.id AND ms.species_id = ?)",
        );
        values.push(Value::Integer(species_id));
    }
    if let Some(flag) = filter.sialic_derivatization {
        clauses.push("g.sialic_derivatization = ?");
        values.push(Value::Integer(i64::from(flag)));
    }
    if let Some(range) = filter.gu_range {
        push_bounds(
            &mut clauses,
            &mut values,
            ("g.gu_mean >= ?", "g.gu_mean < ?"),
            range.bounds(),
        );
    }
    if let Some(range) = filter.mass_range {
        push_bounds(
            &mut clauses,
            &mut values,
            ("g.mass >= ?", "g.mass < ?"),
            range.bounds(),
        );
    }
    if let Some(query) = &filter.composition_query {
        clauses.push("c.composition_string LIKE ? ESCAPE '\\'");
        values.push(Value::Text(like_pattern(query)));
    }

    let mut sql = GLYCAN_SELECT.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY g.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), row_to_glycan)?;
    let mut glycans = rows.collect::<SqlResult<Vec<_>>>()?;
    for glycan in &mut glycans {
        load_links(conn, glycan)?;
    }
    Ok(glycans)
}

pub fn count_glycans(conn: &Connection) -> SqlResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM glycan", [], |row| row.get(0))
}

const GLYCAN_SELECT: &str = "
    SELECT g.id, g.structural_resolution, g.composition_id, c.composition_string,
           g.mass, g.sialic_derivatization, g.gu_mean, g.gu_min, g.gu_max
    FROM glycan g
    JOIN monosaccharide_composition c ON c.id = g.composition_id";

const LINK_TABLES: [&str; 3] = [
    "glycan_model_species",
    "glycan_studies",
    "glycan_diagnostic_fragments",
];

/// Half-open `[min, max)` constraint; the upper clause is dropped when unbounded.
fn push_bounds(
    clauses: &mut Vec<&'static str>,
    values: &mut Vec<Value>,
    (lower, upper): (&'static str, &'static str),
    (min, max): (f64, Option<f64>),
) {
    clauses.push(lower);
    values.push(Value::Real(min));
    if let Some(max) = max {
        clauses.push(upper);
        values.push(Value::Real(max));
    }
}

fn check_links(conn: &Connection, glycan: &NewGlycan) -> StoreResult<()> {
    if !row_exists(conn, "monosaccharide_composition", glycan.composition_id)? {
        return Err(StoreError::not_found(
            "MonosaccharideComposition",
            glycan.composition_id,
        ));
    }
    for &id in &glycan.model_species_ids {
        if !row_exists(conn, "model_species", id)? {
            return Err(StoreError::not_found("ModelSpecies", id));
        }
    }
    for &id in &glycan.study_ids {
        if !row_exists(conn, "study", id)? {
            return Err(StoreError::not_found("Study", id));
        }
    }
    for &id in &glycan.diagnostic_fragment_ids {
        if !row_exists(conn, "diagnostic_fragment", id)? {
            return Err(StoreError::not_found("DiagnosticFragment", id));
        }
    }
    Ok(())
}

fn insert_links(conn: &Connection, id: &GlycanId, glycan: &NewGlycan) -> SqlResult<()> {
    for &ms in &glycan.model_species_ids {
        conn.execute(
            "INSERT OR IGNORE INTO glycan_model_species (glycan_id, model_species_id)
             VALUES (?1, ?2)",
            params![id.as_str(), ms],
        )?;
    }
    for &study in &glycan.study_ids {
        conn.execute(
            "INSERT OR IGNORE INTO glycan_studies (glycan_id, study_id) VALUES (?1, ?2)",
            params![id.as_str(), study],
        )?;
    }
    for &fragment in &glycan.diagnostic_fragment_ids {
        conn.execute(
            "INSERT OR IGNORE INTO glycan_diagnostic_fragments (glycan_id, diagnostic_fragment_id)
             VALUES (?1, ?2)",
            params![id.as_str(), fragment],
        )?;
    }
    Ok(())
}

fn linked_ids(conn: &Connection, sql: &str, id: &GlycanId) -> SqlResult<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![id.as_str()], |row| row.get(0))?;
    rows.collect()
}

fn load_links(conn: &Connection, glycan: &mut Glycan) -> SqlResult<()> {
    glycan.model_species_ids = linked_ids(
        conn,
        "SELECT model_species_id FROM glycan_model_species WHERE glycan_id = ?1 ORDER BY model_species_id",
        &glycan.id,
    )?;
    glycan.study_ids = linked_ids(
        conn,
        "SELECT study_id FROM glycan_studies WHERE glycan_id = ?1 ORDER BY study_id",
        &glycan.id,
    )?;
    glycan.diagnostic_fragment_ids = linked_ids(
        conn,
        "SELECT diagnostic_fragment_id FROM glycan_diagnostic_fragments
         WHERE glycan_id = ?1 ORDER BY diagnostic_fragment_id",
        &glycan.id,
    )?;
    Ok(())
}

fn row_to_glycan(row: &rusqlite::Row) -> SqlResult<Glycan> {
    let raw_id: String = row.get(0)?;
    let id = raw_id
        .parse::<GlycanId>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    Ok(Glycan {
        id,
        structural_resolution: row.get(1)?,
        composition_id: row.get(2)?,
        composition_string: row.get(3)?,
        mass: row.get(4)?,
        sialic_derivatization: row.get::<_, i32>(5)? != 0,
        gu_mean: row.get(6)?,
        gu_min: row.get(7)?,
        gu_max: row.get(8)?,
        model_species_ids: Vec::new(),
        study_ids: Vec::new(),
        diagnostic_fragment_ids: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::save_composition;
    use crate::fragment::add_fragment;
    use crate::literature::{add_study, NewStudy};
    use crate::schema::open_in_memory;
    use crate::taxonomy::{add_model_species, add_species, add_stage_of_life, add_sublocation};
    use glycodb_core::Composition;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn new_glycan(composition_id: i64, mass: f64, gu_mean: f64) -> NewGlycan {
        NewGlycan {
            structural_resolution: None,
            composition_id,
            mass,
            sialic_derivatization: false,
            gu_mean,
            gu_min: gu_mean - 0.5,
            gu_max: gu_mean + 0.5,
            model_species_ids: Vec::new(),
            study_ids: Vec::new(),
            diagnostic_fragment_ids: Vec::new(),
        }
    }

    fn composition(conn: &Connection) -> i64 {
        save_composition(conn, &"H2".parse::<Composition>().unwrap()).unwrap()
    }

    #[test]
    fn test_add_assigns_well_formed_id() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);
        let id = add_glycan(&conn, &new_glycan(comp, 1000.0, 3.0)).unwrap();
        assert!(GlycanId::is_valid(id.as_str()));

        let stored = get_glycan(&conn, &id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.composition_string, "H2");
        assert_eq!(stored.to_string(), format!("Glycan {}", id));
    }

    #[test]
    fn test_add_regenerates_on_collision() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);

        // Occupy the first identifier this seed will produce
        let first = GlycanId::random(&mut StdRng::seed_from_u64(9));
        conn.execute(
            "INSERT INTO glycan (id, composition_id, mass, gu_mean, gu_max, gu_min)
             VALUES (?1, ?2, 1.0, 1.0, 1.0, 1.0)",
            params![first.as_str(), comp],
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let id = add_glycan_with_rng(&conn, &new_glycan(comp, 1000.0, 3.0), &mut rng).unwrap();
        assert_ne!(id, first);
        assert_eq!(count_glycans(&conn).unwrap(), 2);
    }

    #[test]
    fn test_links_round_trip_and_update_keeps_id() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);
        let species = add_species(&conn, "Mus musculus").unwrap();
        let sub = add_sublocation(&conn, "Brain", "Cortex").unwrap();
        let stage = add_stage_of_life(&conn, "Adult", "8 weeks").unwrap();
        let ms = add_model_species(&conn, species, sub, stage).unwrap();
        let study = add_study(
            &conn,
            &NewStudy {
                title: "T".to_string(),
                journal: "J".to_string(),
                year: 2022,
                doi: "10.1/t".to_string(),
                last_author_ids: Vec::new(),
            },
        )
        .unwrap();
        let frag = add_fragment(&conn, "HexNAc", 204.09).unwrap();

        let mut payload = new_glycan(comp, 1500.0, 6.0);
        payload.model_species_ids = vec![ms];
        payload.study_ids = vec![study];
        payload.diagnostic_fragment_ids = vec![frag];
        let id = add_glycan(&conn, &payload).unwrap();

        let stored = get_glycan(&conn, &id).unwrap().unwrap();
        assert_eq!(stored.model_species_ids, vec![ms]);
        assert_eq!(stored.study_ids, vec![study]);
        assert_eq!(stored.diagnostic_fragment_ids, vec![frag]);

        payload.mass = 1600.0;
        payload.diagnostic_fragment_ids.clear();
        update_glycan(&conn, &id, &payload).unwrap();
        let updated = get_glycan(&conn, &id).unwrap().unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.mass, 1600.0);
        assert!(updated.diagnostic_fragment_ids.is_empty());
    }

    #[test]
    fn test_add_rejects_unknown_links() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);
        let mut payload = new_glycan(comp, 1000.0, 3.0);
        payload.study_ids = vec![77];
        assert!(matches!(
            add_glycan(&conn, &payload),
            Err(StoreError::NotFound { entity: "Study", .. })
        ));
        assert!(matches!(
            add_glycan(&conn, &new_glycan(999, 1000.0, 3.0)),
            Err(StoreError::NotFound { entity: "MonosaccharideComposition", .. })
        ));
        assert_eq!(count_glycans(&conn).unwrap(), 0);
    }

    #[test]
    fn test_gu_range_filter_edges() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);
        for gu in [1.5, 2.0, 3.0, 5.0, 8.0, 10.0] {
            add_glycan(&conn, &new_glycan(comp, 1000.0, gu)).unwrap();
        }

        let gu_of = |range: GuRange| -> Vec<f64> {
            let filter = GlycanFilter {
                gu_range: Some(range),
                ..Default::default()
            };
            let mut values: Vec<f64> = filter_glycans(&conn, &filter)
                .unwrap()
                .iter()
                .map(|g| g.gu_mean)
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            values
        };

        assert_eq!(gu_of(GuRange::ZeroToTwo), vec![1.5]);
        assert_eq!(gu_of(GuRange::TwoToFive), vec![2.0, 3.0]);
        assert_eq!(gu_of(GuRange::FiveToSeven), vec![5.0]);
        assert_eq!(gu_of(GuRange::SevenToTen), vec![8.0]);
        assert_eq!(gu_of(GuRange::AboveTen), vec![10.0]);
    }

    #[test]
    fn test_mass_species_and_flag_filters() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);
        let sialylated = save_composition(&conn, &"H5N4S2".parse().unwrap()).unwrap();
        let mouse = add_species(&conn, "Mus musculus").unwrap();
        let rat = add_species(&conn, "Rattus norvegicus").unwrap();
        let sub = add_sublocation(&conn, "Brain", "Cortex").unwrap();
        let stage = add_stage_of_life(&conn, "Adult", "8 weeks").unwrap();
        let ms_mouse = add_model_species(&conn, mouse, sub, stage).unwrap();
        let ms_rat = add_model_species(&conn, rat, sub, stage).unwrap();

        let mut a = new_glycan(comp, 500.0, 3.0);
        a.model_species_ids = vec![ms_mouse];
        let mut b = new_glycan(sialylated, 2000.0, 3.0);
        b.model_species_ids = vec![ms_rat];
        b.sialic_derivatization = true;
        let id_a = add_glycan(&conn, &a).unwrap();
        let id_b = add_glycan(&conn, &b).unwrap();

        let by_mass = filter_glycans(
            &conn,
            &GlycanFilter {
                mass_range: Some(MassRange::From500To1000),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_mass.len(), 1);
        assert_eq!(by_mass[0].id, id_a);

        let by_species = filter_glycans(
            &conn,
            &GlycanFilter {
                species_id: Some(rat),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_species.len(), 1);
        assert_eq!(by_species[0].id, id_b);

        let by_flag = filter_glycans(
            &conn,
            &GlycanFilter {
                sialic_derivatization: Some(true),
                composition_query: Some("S2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_flag.len(), 1);
        assert_eq!(by_flag[0].id, id_b);

        assert_eq!(filter_glycans(&conn, &GlycanFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_cascades_links() {
        let conn = open_in_memory().unwrap();
        let comp = composition(&conn);
        let frag = add_fragment(&conn, "HexNAc", 204.09).unwrap();
        let mut payload = new_glycan(comp, 1000.0, 3.0);
        payload.diagnostic_fragment_ids = vec![frag];
        let id = add_glycan(&conn, &payload).unwrap();

        assert!(delete_glycan(&conn, &id).unwrap());
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM glycan_diagnostic_fragments", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(links, 0);
    }
}
