use anyhow::{Context, Result};
use glycodb_core::Species;
use glycodb_store::literature::NewStudy;
use glycodb_store::{composition, fragment, literature, taxonomy};
use rusqlite::Connection;
use serde_json::Value;
use tracing::info;

use super::to_json;
use crate::cli::{
    CompositionCommand, FragmentCommand, ModelSpeciesCommand, SpeciesCommand, StudyCommand,
};
use crate::dto::{AuthorDto, CompositionDto, FragmentDto, ModelSpeciesDto, StudyDto};

pub fn species(conn: &Connection, command: SpeciesCommand) -> Result<Value> {
    match command {
        SpeciesCommand::Add { name } => {
            let id = taxonomy::add_species(conn, &name)?;
            let species = taxonomy::get_species(conn, id)?.context("Species vanished after insert")?;
            to_json(&species)
        }
        SpeciesCommand::List => to_json(&taxonomy::list_species(conn)?),
        SpeciesCommand::Search { query } => to_json(&taxonomy::search_species(conn, &query)?),
    }
}

pub fn model_species(conn: &Connection, command: ModelSpeciesCommand) -> Result<Value> {
    let dtos = |rows: Vec<glycodb_core::ModelSpecies>| -> Vec<ModelSpeciesDto> {
        rows.iter().map(ModelSpeciesDto::from).collect()
    };
    match command {
        ModelSpeciesCommand::Add {
            species,
            organ,
            structure,
            stage,
            age,
        } => {
            let species = find_or_add_species(conn, &species)?;
            let sublocation_id = match taxonomy::list_sublocations(conn)?
                .into_iter()
                .find(|s| s.organ == organ && s.structure == structure)
            {
                Some(existing) => existing.id,
                None => taxonomy::add_sublocation(conn, &organ, &structure)?,
            };
            let stage_id = match taxonomy::list_stages_of_life(conn)?
                .into_iter()
                .find(|s| s.stage == stage && s.age == age)
            {
                Some(existing) => existing.id,
                None => taxonomy::add_stage_of_life(conn, &stage, &age)?,
            };
            let id = taxonomy::add_model_species(conn, species.id, sublocation_id, stage_id)?;
            let created = taxonomy::get_model_species(conn, id)?
                .context("Model species vanished after insert")?;
            info!("Added model species {}", created);
            to_json(&ModelSpeciesDto::from(&created))
        }
        ModelSpeciesCommand::List {
            species_id,
            stage_id,
        } => to_json(&dtos(taxonomy::list_model_species(conn, species_id, stage_id)?)),
        ModelSpeciesCommand::Search { query } => {
            to_json(&dtos(taxonomy::search_model_species(conn, &query)?))
        }
    }
}

fn find_or_add_species(conn: &Connection, name: &str) -> Result<Species> {
    if let Some(species) = taxonomy::find_species_by_name(conn, name)? {
        return Ok(species);
    }
    let id = taxonomy::add_species(conn, name)?;
    taxonomy::get_species(conn, id)?.context("Species vanished after insert")
}

pub fn composition(conn: &Connection, command: CompositionCommand) -> Result<Value> {
    let dtos = |rows: Vec<glycodb_core::CompositionRecord>| -> Vec<CompositionDto> {
        rows.iter().map(CompositionDto::from).collect()
    };
    match command {
        CompositionCommand::Add { composition: parsed } => {
            let record = composition::find_or_create_composition(conn, &parsed)?;
            to_json(&CompositionDto::from(&record))
        }
        CompositionCommand::List => to_json(&dtos(composition::list_compositions(conn)?)),
        CompositionCommand::Search { query } => {
            to_json(&dtos(composition::search_compositions(conn, &query)?))
        }
        CompositionCommand::Refresh => {
            let refreshed = composition::refresh_composition_strings(conn)?;
            to_json(&serde_json::json!({ "refreshed": refreshed }))
        }
    }
}

pub fn fragment(conn: &Connection, command: FragmentCommand) -> Result<Value> {
    let dtos = |rows: Vec<glycodb_core::DiagnosticFragment>| -> Vec<FragmentDto> {
        rows.iter().map(FragmentDto::from).collect()
    };
    match command {
        FragmentCommand::Add { motif_name, mass } => {
            let id = fragment::add_fragment(conn, &motif_name, mass)?;
            let created =
                fragment::get_fragment(conn, id)?.context("Fragment vanished after insert")?;
            to_json(&FragmentDto::from(&created))
        }
        FragmentCommand::List => to_json(&dtos(fragment::list_fragments(conn)?)),
        FragmentCommand::Search { query } => {
            to_json(&dtos(fragment::search_fragments(conn, &query)?))
        }
    }
}

pub fn study(conn: &Connection, command: StudyCommand) -> Result<Value> {
    let dtos = |rows: Vec<glycodb_core::Study>| -> Vec<StudyDto> {
        rows.iter().map(StudyDto::from).collect()
    };
    match command {
        StudyCommand::AddAuthor {
            full_name,
            affiliation,
        } => {
            let id = literature::add_author(conn, &full_name, &affiliation)?;
            to_json(&AuthorDto::from(&glycodb_core::LastAuthor {
                id,
                full_name: full_name.trim().to_string(),
                affiliation: affiliation.trim().to_string(),
            }))
        }
        StudyCommand::Add {
            title,
            journal,
            year,
            doi,
            author_ids,
        } => {
            let id = literature::add_study(
                conn,
                &NewStudy {
                    title,
                    journal,
                    year,
                    doi,
                    last_author_ids: author_ids,
                },
            )?;
            let created = literature::get_study(conn, id)?.context("Study vanished after insert")?;
            to_json(&StudyDto::from(&created))
        }
        StudyCommand::List { year, journal } => {
            to_json(&dtos(literature::list_studies(conn, year, journal.as_deref())?))
        }
        StudyCommand::Search { query } => to_json(&dtos(literature::search_studies(conn, &query)?)),
    }
}
