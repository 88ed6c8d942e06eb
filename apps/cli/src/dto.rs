//! Flat, JSON-friendly DTOs for command output.

use glycodb_core::{
    CompositionRecord, DiagnosticFragment, Glycan, GuRange, LastAuthor, MassRange, ModelSpecies,
    Monosaccharide, RangeBucket, Study,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ModelSpeciesDto {
    pub id: i64,
    pub label: String,
    pub species: String,
    pub organ: String,
    pub structure: String,
    pub stage: String,
    pub age: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitCountDto {
    pub letter: char,
    pub name: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositionDto {
    pub id: i64,
    pub composition_string: String,
    /// Non-zero units in canonical order.
    pub units: Vec<UnitCountDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FragmentDto {
    pub id: i64,
    pub motif_name: String,
    pub mass: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyDto {
    pub id: i64,
    pub label: String,
    pub title: String,
    pub journal: String,
    pub year: i32,
    pub doi: String,
    pub authors: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorDto {
    pub id: i64,
    pub full_name: String,
    pub affiliation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlycanDto {
    pub id: String,
    pub composition: String,
    pub mass: f64,
    pub mass_range: Option<&'static str>,
    pub sialic_derivatization: bool,
    pub gu_mean: f64,
    pub gu_min: f64,
    pub gu_max: f64,
    pub gu_range: Option<&'static str>,
    pub structural_resolution: Option<String>,
    pub model_species_ids: Vec<i64>,
    pub study_ids: Vec<i64>,
    pub diagnostic_fragment_ids: Vec<i64>,
}

impl From<&ModelSpecies> for ModelSpeciesDto {
    fn from(ms: &ModelSpecies) -> Self {
        ModelSpeciesDto {
            id: ms.id,
            label: ms.to_string(),
            species: ms.species.name.clone(),
            organ: ms.sublocation.organ.clone(),
            structure: ms.sublocation.structure.clone(),
            stage: ms.stage_of_life.stage.clone(),
            age: ms.stage_of_life.age.clone(),
        }
    }
}

impl From<&CompositionRecord> for CompositionDto {
    fn from(record: &CompositionRecord) -> Self {
        let units = Monosaccharide::ALL
            .iter()
            .map(|&unit| (unit, record.composition.count(unit)))
            .filter(|&(_, count)| count > 0)
            .map(|(unit, count)| UnitCountDto {
                letter: unit.letter(),
                name: unit.description(),
                count,
            })
            .collect();
        CompositionDto {
            id: record.id,
            composition_string: record.composition_string.clone(),
            units,
        }
    }
}

impl From<&DiagnosticFragment> for FragmentDto {
    fn from(f: &DiagnosticFragment) -> Self {
        FragmentDto {
            id: f.id,
            motif_name: f.motif_name.clone(),
            mass: f.mass,
        }
    }
}

impl From<&Study> for StudyDto {
    fn from(s: &Study) -> Self {
        StudyDto {
            id: s.id,
            label: s.to_string(),
            title: s.title.clone(),
            journal: s.journal.clone(),
            year: s.year,
            doi: s.doi.clone(),
            authors: s.authors_list(),
        }
    }
}

impl From<&LastAuthor> for AuthorDto {
    fn from(a: &LastAuthor) -> Self {
        AuthorDto {
            id: a.id,
            full_name: a.full_name.clone(),
            affiliation: a.affiliation.clone(),
        }
    }
}

impl From<&Glycan> for GlycanDto {
    fn from(g: &Glycan) -> Self {
        GlycanDto {
            id: g.id.to_string(),
            composition: g.composition_string.clone(),
            mass: g.mass,
            mass_range: MassRange::classify(g.mass).map(|b| b.label()),
            sialic_derivatization: g.sialic_derivatization,
            gu_mean: g.gu_mean,
            gu_min: g.gu_min,
            gu_max: g.gu_max,
            gu_range: GuRange::classify(g.gu_mean).map(|b| b.label()),
            structural_resolution: g.structural_resolution.clone(),
            model_species_ids: g.model_species_ids.clone(),
            study_ids: g.study_ids.clone(),
            diagnostic_fragment_ids: g.diagnostic_fragment_ids.clone(),
        }
    }
}
