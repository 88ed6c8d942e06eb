use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glycodb_core::{Composition, GlycanId, GuRange, MassRange};

#[derive(Parser, Debug)]
#[command(
    name = "glycodb",
    version,
    about = "Glycan / species research catalog",
    long_about = "Data entry, search and CSV dump/restore for a catalog of glycans, their \
                  monosaccharide compositions, the model species they were observed in and \
                  the studies that report them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML configuration file
    #[arg(long, global = true, env = "GLYCODB_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration file)
    #[arg(long, global = true, env = "GLYCODB_DATABASE", value_name = "PATH")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the catalog schema
    Init,

    /// Manage species
    Species {
        #[command(subcommand)]
        command: SpeciesCommand,
    },

    /// Manage model species (species + sublocation + stage of life)
    ModelSpecies {
        #[command(subcommand)]
        command: ModelSpeciesCommand,
    },

    /// Manage monosaccharide compositions
    Composition {
        #[command(subcommand)]
        command: CompositionCommand,
    },

    /// Manage diagnostic fragments
    Fragment {
        #[command(subcommand)]
        command: FragmentCommand,
    },

    /// Manage studies and their last authors
    Study {
        #[command(subcommand)]
        command: StudyCommand,
    },

    /// Manage glycans
    Glycan {
        #[command(subcommand)]
        command: GlycanCommand,
    },

    /// Dump every table to <dir>/<table>.csv
    Export(ExportArgs),

    /// Restore empty tables from the CSV files in a directory
    Restore(RestoreArgs),

    /// Load explicit table=file pairs in one transaction
    ImportFiles(ImportFilesArgs),

    /// Delete every glycan and its links
    PurgeGlycans(PurgeArgs),
}

#[derive(Subcommand, Debug)]
pub enum SpeciesCommand {
    Add { name: String },
    List,
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum ModelSpeciesCommand {
    /// Record a species at a sublocation and stage of life
    Add {
        #[arg(long)]
        species: String,
        #[arg(long)]
        organ: String,
        #[arg(long)]
        structure: String,
        #[arg(long)]
        stage: String,
        #[arg(long)]
        age: String,
    },
    List {
        #[arg(long)]
        species_id: Option<i64>,
        #[arg(long)]
        stage_id: Option<i64>,
    },
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum CompositionCommand {
    /// Store a composition given as a composition string, e.g. H5N4F1
    Add { composition: Composition },
    List,
    Search { query: String },
    /// Re-derive every stored composition string from its counts
    Refresh,
}

#[derive(Subcommand, Debug)]
pub enum FragmentCommand {
    Add {
        motif_name: String,
        mass: f64,
    },
    List,
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum StudyCommand {
    /// Add a last author
    AddAuthor {
        full_name: String,
        #[arg(long, default_value = "")]
        affiliation: String,
    },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        journal: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        doi: String,
        /// Last author ID (repeatable)
        #[arg(long = "author-id")]
        author_ids: Vec<i64>,
    },
    List {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        journal: Option<String>,
    },
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum GlycanCommand {
    Add(GlycanAddArgs),
    Show { id: GlycanId },
    List(GlycanListArgs),
    Delete { id: GlycanId },
}

#[derive(Args, Debug)]
pub struct GlycanAddArgs {
    /// Composition string; an existing matching composition is reused
    #[arg(long)]
    pub composition: Composition,
    #[arg(long)]
    pub mass: f64,
    #[arg(long)]
    pub gu_mean: f64,
    #[arg(long)]
    pub gu_min: f64,
    #[arg(long)]
    pub gu_max: f64,
    #[arg(long)]
    pub sialic_derivatization: bool,
    /// Path or URL of a structure image
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long = "model-species-id")]
    pub model_species_ids: Vec<i64>,
    #[arg(long = "study-id")]
    pub study_ids: Vec<i64>,
    #[arg(long = "fragment-id")]
    pub fragment_ids: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct GlycanListArgs {
    /// Species ID the glycan was observed in
    #[arg(long = "species")]
    pub species_id: Option<i64>,
    #[arg(long)]
    pub sialic: Option<bool>,
    /// One of 0-2, 2-5, 5-7, 7-10, 10+
    #[arg(long)]
    pub gu_range: Option<GuRange>,
    /// One of 0-500, 500-1000, 1000-1500, 1500-2000, 2000+
    #[arg(long)]
    pub mass_range: Option<MassRange>,
    /// Composition string fragment
    #[arg(long)]
    pub composition: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory (defaults to the configured CSV directory)
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Directory of CSV dumps (defaults to the configured CSV directory)
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportFilesArgs {
    /// table=path pairs
    #[arg(required = true, value_parser = parse_table_file)]
    pub files: Vec<(String, PathBuf)>,
}

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Confirm deletion
    #[arg(long)]
    pub yes: bool,
}

fn parse_table_file(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((table, path)) if !table.is_empty() && !path.is_empty() => {
            Ok((table.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected table=path, got '{}'", s)),
    }
}
