use anyhow::Result;
use glycodb_core::NewGlycan;
use glycodb_store::composition::find_or_create_composition;
use glycodb_store::glycan::{self, GlycanFilter};
use glycodb_store::StoreError;
use rusqlite::Connection;
use serde_json::Value;
use tracing::info;

use super::to_json;
use crate::cli::{GlycanAddArgs, GlycanCommand, GlycanListArgs};
use crate::dto::GlycanDto;

pub fn run(conn: &Connection, command: GlycanCommand) -> Result<Value> {
    match command {
        GlycanCommand::Add(args) => add(conn, args),
        GlycanCommand::Show { id } => match glycan::get_glycan(conn, &id)? {
            Some(found) => to_json(&GlycanDto::from(&found)),
            None => Err(StoreError::NotFound {
                entity: "Glycan",
                id: id.to_string(),
            }
            .into()),
        },
        GlycanCommand::List(args) => list(conn, args),
        GlycanCommand::Delete { id } => {
            let deleted = glycan::delete_glycan(conn, &id)?;
            to_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
    }
}

fn add(conn: &Connection, args: GlycanAddArgs) -> Result<Value> {
    let new = NewGlycan {
        structural_resolution: args.image,
        composition_id: 0,
        mass: args.mass,
        sialic_derivatization: args.sialic_derivatization,
        gu_mean: args.gu_mean,
        gu_min: args.gu_min,
        gu_max: args.gu_max,
        model_species_ids: args.model_species_ids,
        study_ids: args.study_ids,
        diagnostic_fragment_ids: args.fragment_ids,
    };
    // Reject bad measurements before a composition row gets created for them
    new.validate()?;
    let record = find_or_create_composition(conn, &args.composition)?;
    let new = NewGlycan {
        composition_id: record.id,
        ..new
    };

    let id = glycan::add_glycan(conn, &new)?;
    info!("Added glycan {} ({})", id, record.composition_string);
    match glycan::get_glycan(conn, &id)? {
        Some(created) => to_json(&GlycanDto::from(&created)),
        None => Err(StoreError::NotFound {
            entity: "Glycan",
            id: id.to_string(),
        }
        .into()),
    }
}

fn list(conn: &Connection, args: GlycanListArgs) -> Result<Value> {
    let filter = GlycanFilter {
        species_id: args.species_id,
        sialic_derivatization: args.sialic,
        gu_range: args.gu_range,
        mass_range: args.mass_range,
        composition_query: args.composition,
    };
    let rows = glycan::filter_glycans(conn, &filter)?;
    to_json(&rows.iter().map(GlycanDto::from).collect::<Vec<_>>())
}
