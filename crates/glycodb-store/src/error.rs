use glycodb_core::{GlycanIdError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Invalid record: {0}")]
    Invalid(#[from] ValidationError),
    #[error("Glycan identifier error: {0}")]
    GlycanId(#[from] GlycanIdError),
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Turn a UNIQUE constraint failure into a [`StoreError::Duplicate`].
pub(crate) fn map_unique(
    err: rusqlite::Error,
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Duplicate {
                entity,
                field,
                value: value.to_string(),
            }
        }
        _ => StoreError::Sqlite(err),
    }
}
