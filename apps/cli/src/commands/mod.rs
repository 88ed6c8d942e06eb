use anyhow::{Context, Result};
use glycodb_core::{CompositionParseError, GlycanIdError, RangeParseError, ValidationError};
use glycodb_store::StoreError;
use glycodb_transfer::TransferError;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::config::CatalogConfig;

mod catalog;
mod glycan;
mod transfer;

/// Open the configured catalog, run one command and return its JSON output.
pub fn execute(cli: Cli) -> Result<Value> {
    let config = CatalogConfig::load(cli.config.as_deref())?.with_database(cli.database);
    debug!("Using database {}", config.database.display());

    let mut conn = glycodb_store::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;

    match cli.command {
        Commands::Init => {
            info!("Schema ready at {}", config.database.display());
            to_json(&serde_json::json!({ "database": config.database }))
        }
        Commands::Species { command } => catalog::species(&conn, command),
        Commands::ModelSpecies { command } => catalog::model_species(&conn, command),
        Commands::Composition { command } => catalog::composition(&conn, command),
        Commands::Fragment { command } => catalog::fragment(&conn, command),
        Commands::Study { command } => catalog::study(&conn, command),
        Commands::Glycan { command } => glycan::run(&conn, command),
        Commands::Export(args) => transfer::export(&conn, &config, args),
        Commands::Restore(args) => transfer::restore(&mut conn, &config, args),
        Commands::ImportFiles(args) => transfer::import_files(&mut conn, args),
        Commands::PurgeGlycans(args) => transfer::purge(&mut conn, args),
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Process exit code for a failed command.
///
/// 2 configuration, 3 file system, 4 unparseable input, 5 database or
/// constraint failure, 1 anything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return 2;
        }
        if cause.downcast_ref::<CompositionParseError>().is_some()
            || cause.downcast_ref::<RangeParseError>().is_some()
            || cause.downcast_ref::<GlycanIdError>().is_some()
            || cause.downcast_ref::<ValidationError>().is_some()
        {
            return 4;
        }
        if let Some(e) = cause.downcast_ref::<TransferError>() {
            return match e {
                TransferError::MissingDirectory(_) | TransferError::Io(_) => 3,
                TransferError::Csv { .. } => 4,
                _ => 5,
            };
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return match e {
                StoreError::Invalid(_) | StoreError::GlycanId(GlycanIdError::Malformed(_)) => 4,
                _ => 5,
            };
        }
        if cause.downcast_ref::<rusqlite::Error>().is_some() {
            return 5;
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 3;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    fn run_in(db: &Path, args: &[&str]) -> Result<Value> {
        let mut argv = vec!["glycodb", "--database", db.to_str().unwrap()];
        argv.extend_from_slice(args);
        execute(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn test_catalog_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("catalog.sqlite3");

        run_in(&db, &["init"]).unwrap();
        let species = run_in(&db, &["species", "add", "Mus musculus"]).unwrap();
        assert_eq!(species["name"], "Mus musculus");

        let ms = run_in(
            &db,
            &[
                "model-species", "add", "--species", "Mus musculus", "--organ", "Brain",
                "--structure", "Cortex", "--stage", "Adult", "--age", "P60",
            ],
        )
        .unwrap();
        assert_eq!(ms["label"], "Mus musculus - Brain - Cortex - Adult - P60");
        let ms_id = ms["id"].as_i64().unwrap().to_string();

        let glycan = run_in(
            &db,
            &[
                "glycan", "add", "--composition", "H5N4F1", "--mass", "1786.6",
                "--gu-mean", "6.1", "--gu-min", "6.0", "--gu-max", "6.3",
                "--model-species-id", &ms_id,
            ],
        )
        .unwrap();
        let id = glycan["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("LBG-"));
        assert_eq!(glycan["composition"], "H5N4F1");
        assert_eq!(glycan["gu_range"], "5.0 - 7.0");

        let listed = run_in(&db, &["glycan", "list", "--gu-range", "5-7"]).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        let listed = run_in(&db, &["glycan", "list", "--mass-range", "0-500"]).unwrap();
        assert!(listed.as_array().unwrap().is_empty());

        let shown = run_in(&db, &["glycan", "show", &id]).unwrap();
        assert_eq!(shown["model_species_ids"][0].as_i64().unwrap().to_string(), ms_id);

        // The composition was created once and is reused.
        let compositions = run_in(&db, &["composition", "list"]).unwrap();
        assert_eq!(compositions.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_export_purge_restore() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("catalog.sqlite3");
        let dump = dir.path().join("dump");
        let dump_arg = dump.to_str().unwrap();

        run_in(&db, &["composition", "add", "H3N2"]).unwrap();
        run_in(
            &db,
            &[
                "glycan", "add", "--composition", "H3N2", "--mass", "892.3",
                "--gu-mean", "3.0", "--gu-min", "2.9", "--gu-max", "3.1",
            ],
        )
        .unwrap();

        let report = run_in(&db, &["export", dump_arg]).unwrap();
        assert!(dump.join("glycan.csv").exists());
        assert!(!report["tables"].as_array().unwrap().is_empty());

        assert!(run_in(&db, &["purge-glycans"]).is_err());
        let purged = run_in(&db, &["purge-glycans", "--yes"]).unwrap();
        assert_eq!(purged["glycans_deleted"], 1);

        let restored = run_in(&db, &["restore", dump_arg]).unwrap();
        let tables: Vec<&str> = restored["restored"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["table"].as_str().unwrap())
            .collect();
        assert!(tables.contains(&"glycan"));
        assert!(restored["skipped_populated"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t == "monosaccharide_composition"));
    }

    #[test]
    fn test_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("catalog.sqlite3");

        let err = run_in(&db, &["restore", dir.path().join("missing").to_str().unwrap()])
            .unwrap_err();
        assert_eq!(exit_code(&err), 3);

        run_in(&db, &["species", "add", "Homo sapiens"]).unwrap();
        let err = run_in(&db, &["species", "add", "Homo sapiens"]).unwrap_err();
        assert_eq!(exit_code(&err), 5);

        let err = run_in(
            &db,
            &[
                "glycan", "add", "--composition", "H3", "--mass", "500",
                "--gu-mean", "1.0", "--gu-min", "2.0", "--gu-max", "3.0",
            ],
        )
        .unwrap_err();
        assert_eq!(exit_code(&err), 4);

        let config = dir.path().join("bad.toml");
        std::fs::write(&config, "database = [").unwrap();
        let err = execute(
            Cli::try_parse_from(["glycodb", "--config", config.to_str().unwrap(), "init"]).unwrap(),
        )
        .unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }
}
