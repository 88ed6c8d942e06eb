use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Where the catalog lives on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub database: PathBuf,
    /// Default directory for `export` and `restore`.
    pub csv_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("glycodb.sqlite3"),
            csv_dir: PathBuf::from("./csv_exports"),
        }
    }
}

impl CatalogConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("Invalid config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_database(mut self, database: Option<PathBuf>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        self
    }
}
