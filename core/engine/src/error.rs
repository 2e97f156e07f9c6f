//! FILENAME: core/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// Unknown column or factor name. Displays the quoted name.
    #[error("'{0}'")]
    KeyError(String),

    #[error("{0}")]
    TypeError(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("self and other must have the same columns")]
    SchemaMismatch,

    #[error("columns have unequal lengths")]
    ShapeError,

    #[error("{0}")]
    IllegalState(String),

    #[error("{0}")]
    InsufficientData(String),

    #[error("unknown aggregate '{0}'")]
    UnknownAggregate(String),
}

pub type TableResult<T> = Result<T, TableError>;
