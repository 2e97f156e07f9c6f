//! FILENAME: core/persistence/src/error.rs

use engine::TableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl PersistenceError {
    /// The underlying table error, if this is one.
    pub fn as_table_error(&self) -> Option<&TableError> {
        match self {
            PersistenceError::Table(err) => Some(err),
            _ => None,
        }
    }
}
