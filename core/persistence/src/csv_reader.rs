//! FILENAME: core/persistence/src/csv_reader.rs
//! Delimited text ingestion into a `Table`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use engine::logging::log_info;
use engine::{CellValue, DiagnosticKind, Diagnostics, Table};
use pivot_engine::Dataset;
use serde::{Deserialize, Serialize};

use crate::PersistenceError;

/// How a delimited source is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvReadOptions {
    /// Raw lines dropped before parsing starts (blank lines count).
    pub skip: usize,
    /// Whether the first parsed row holds the column labels.
    pub has_header: bool,
    pub delimiter: u8,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        CsvReadOptions {
            skip: 0,
            has_header: true,
            delimiter: b',',
        }
    }
}

/// Reads a delimited source into a table.
///
/// Rows whose field count differs from the header are dropped with a
/// `MalformedRow` warning; repeated labels are renamed with a
/// `DuplicateLabel` warning. Empty fields stay as empty text.
pub fn read_table<R: Read>(
    reader: R,
    options: &CsvReadOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Table, PersistenceError> {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    for _ in 0..options.skip {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled here so labels can be disambiguated.
        .has_headers(false)
        // Ragged rows are reported, not fatal.
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let first = match records.next() {
        Some(record) => record?,
        None => return Ok(Table::new()),
    };

    let width = first.len();
    let labels: Vec<String> = if options.has_header {
        first.iter().map(str::to_string).collect()
    } else {
        (1..=width).map(|i| format!("COL_{}", i)).collect()
    };

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); width];
    if !options.has_header {
        push_record(&mut columns, &first);
    }

    let mut dropped = 0usize;
    for record in records {
        let record = record?;
        if record.len() != width {
            let line_number = record.position().map_or(0, |p| p.line()) as usize + options.skip;
            diagnostics.warn(
                DiagnosticKind::MalformedRow,
                format!(
                    "line {} has {} fields, expected {}; row dropped",
                    line_number,
                    record.len(),
                    width
                ),
            );
            dropped += 1;
            continue;
        }
        push_record(&mut columns, &record);
    }

    let mut table = Table::new();
    for (label, values) in labels.iter().zip(columns) {
        table.insert_unique(label, values, diagnostics);
    }

    log_info!(
        "CSV",
        "read {} columns x {} rows ({} dropped)",
        table.column_count(),
        table.row_count(),
        dropped
    );
    Ok(table)
}

fn push_record(columns: &mut [Vec<CellValue>], record: &StringRecord) {
    for (column, field) in columns.iter_mut().zip(record.iter()) {
        column.push(CellValue::parse(field));
    }
}

/// Reads a delimited file into a table.
pub fn load_table(
    path: &Path,
    options: &CsvReadOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Table, PersistenceError> {
    let file = File::open(path)?;
    read_table(file, options, diagnostics)
}

/// Reads a delimited file into a dataset that keeps the load warnings.
pub fn load_dataset(path: &Path, options: &CsvReadOptions) -> Result<Dataset, PersistenceError> {
    let mut diagnostics = Diagnostics::new();
    let table = load_table(path, options, &mut diagnostics)?;
    Ok(Dataset::with_diagnostics(table, diagnostics))
}
