//! FILENAME: core/persistence/src/lib.rs
//! Persistence Module
//!
//! Loads delimited text into tables and writes table and pivot dumps.

mod csv_reader;
mod csv_writer;
mod error;

pub use csv_reader::{load_dataset, load_table, read_table, CsvReadOptions};
pub use csv_writer::{
    default_pivot_file_name, default_table_file_name, save_pivot, save_table, write_pivot,
    write_table, PivotWriteOptions, TableWriteOptions,
};
pub use error::PersistenceError;
