use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::glycan_id::GlycanId;

/// A species studied in the catalog (names are unique).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOfLife {
    pub id: i64,
    pub stage: String,
    pub age: String,
}

impl fmt::Display for StageOfLife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.stage, self.age)
    }
}

/// Anatomical sublocation, e.g. organ "Brain", structure "Cortex".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sublocation {
    pub id: i64,
    pub organ: String,
    pub structure: String,
}

impl fmt::Display for Sublocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.organ, self.structure)
    }
}

/// A species sampled at a given sublocation and stage of life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpecies {
    pub id: i64,
    pub species: Species,
    pub sublocation: Sublocation,
    pub stage_of_life: StageOfLife,
}

impl fmt::Display for ModelSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.species.name, self.sublocation, self.stage_of_life
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticFragment {
    pub id: i64,
    pub motif_name: String,
    pub mass: f64,
}

impl fmt::Display for DiagnosticFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.motif_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastAuthor {
    pub id: i64,
    pub full_name: String,
    pub affiliation: String,
}

impl fmt::Display for LastAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A publication. DOIs are unique across studies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: i64,
    pub title: String,
    pub journal: String,
    pub year: i32,
    pub doi: String,
    #[serde(default)]
    pub last_authors: Vec<LastAuthor>,
}

impl Study {
    /// Comma-separated author names, as shown in list views.
    pub fn authors_list(&self) -> String {
        self.last_authors
            .iter()
            .map(|a| a.full_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | DOI: {}",
            self.title, self.journal, self.year, self.doi
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("GU statistics out of order: expected gu_min <= gu_mean <= gu_max")]
    GuOrder,
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Measurements and links for a glycan that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGlycan {
    /// Path or URL of the structure image, if any.
    #[serde(default)]
    pub structural_resolution: Option<String>,
    pub composition_id: i64,
    pub mass: f64,
    #[serde(default)]
    pub sialic_derivatization: bool,
    pub gu_mean: f64,
    pub gu_min: f64,
    pub gu_max: f64,
    #[serde(default)]
    pub model_species_ids: Vec<i64>,
    #[serde(default)]
    pub study_ids: Vec<i64>,
    #[serde(default)]
    pub diagnostic_fragment_ids: Vec<i64>,
}

impl NewGlycan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_measurements(self.mass, self.gu_mean, self.gu_min, self.gu_max)
    }
}

/// Check mass and GU statistics for a glycan record.
pub fn validate_measurements(
    mass: f64,
    gu_mean: f64,
    gu_min: f64,
    gu_max: f64,
) -> Result<(), ValidationError> {
    for (field, value) in [
        ("mass", mass),
        ("gu_mean", gu_mean),
        ("gu_min", gu_min),
        ("gu_max", gu_max),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
    }
    if mass < 0.0 {
        return Err(ValidationError::Negative { field: "mass" });
    }
    if !(gu_min <= gu_mean && gu_mean <= gu_max) {
        return Err(ValidationError::GuOrder);
    }
    Ok(())
}

/// A stored glycan with its composition string resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glycan {
    pub id: GlycanId,
    pub structural_resolution: Option<String>,
    pub composition_id: i64,
    pub composition_string: String,
    pub mass: f64,
    pub sialic_derivatization: bool,
    pub gu_mean: f64,
    pub gu_min: f64,
    pub gu_max: f64,
    #[serde(default)]
    pub model_species_ids: Vec<i64>,
    #[serde(default)]
    pub study_ids: Vec<i64>,
    #[serde(default)]
    pub diagnostic_fragment_ids: Vec<i64>,
}

impl fmt::Display for Glycan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Glycan {}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_glycan(mass: f64, gu: (f64, f64, f64)) -> NewGlycan {
        NewGlycan {
            structural_resolution: None,
            composition_id: 1,
            mass,
            sialic_derivatization: false,
            gu_mean: gu.0,
            gu_min: gu.1,
            gu_max: gu.2,
            model_species_ids: Vec::new(),
            study_ids: Vec::new(),
            diagnostic_fragment_ids: Vec::new(),
        }
    }

    #[test]
    fn test_display_strings() {
        let species = Species { id: 1, name: "Mus musculus".to_string() };
        let model = ModelSpecies {
            id: 1,
            species: species.clone(),
            sublocation: Sublocation {
                id: 2,
                organ: "Brain".to_string(),
                structure: "Cortex".to_string(),
            },
            stage_of_life: StageOfLife {
                id: 3,
                stage: "Adult".to_string(),
                age: "12 weeks".to_string(),
            },
        };
        assert_eq!(model.to_string(), "Mus musculus - Brain - Cortex - Adult - 12 weeks");

        let study = Study {
            id: 1,
            title: "Brain N-glycome".to_string(),
            journal: "Glycobiology".to_string(),
            year: 2021,
            doi: "10.1000/xyz".to_string(),
            last_authors: vec![
                LastAuthor { id: 1, full_name: "A. Author".to_string(), affiliation: "X".to_string() },
                LastAuthor { id: 2, full_name: "B. Author".to_string(), affiliation: "Y".to_string() },
            ],
        };
        assert_eq!(study.to_string(), "Brain N-glycome | Glycobiology | 2021 | DOI: 10.1000/xyz");
        assert_eq!(study.authors_list(), "A. Author, B. Author");
    }

    #[test]
    fn test_validate_measurements() {
        assert!(new_glycan(1200.0, (5.0, 4.5, 5.5)).validate().is_ok());
        assert_eq!(
            new_glycan(1200.0, (3.0, 4.5, 5.5)).validate(),
            Err(ValidationError::GuOrder)
        );
        assert_eq!(
            new_glycan(-1.0, (5.0, 5.0, 5.0)).validate(),
            Err(ValidationError::Negative { field: "mass" })
        );
        assert_eq!(
            new_glycan(f64::NAN, (5.0, 5.0, 5.0)).validate(),
            Err(ValidationError::NotFinite { field: "mass" })
        );
    }
}
