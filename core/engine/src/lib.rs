//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the column store.
//! CONTEXT: Re-exports the cell, table, error and diagnostics types used by
//! the pivot engine and the persistence layer.

pub mod cell;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod table;

// Re-exported so the logging macros resolve `log` from any dependent crate.
pub use log;

// Re-export commonly used types at the crate root
pub use cell::{format_float, CellValue};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{TableError, TableResult};
pub use table::Table;
