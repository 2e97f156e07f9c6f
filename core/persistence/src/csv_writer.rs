//! FILENAME: core/persistence/src/csv_writer.rs
//! Table and pivot dumps as delimited text with CRLF line endings.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use engine::logging::log_info;
use engine::{Diagnostics, Table, TableError};
use pivot_engine::{build_filter_mask, Dataset, Exclusions, PivotResult};
use serde::{Deserialize, Serialize};

use crate::PersistenceError;

// ============================================================================
// OPTIONS
// ============================================================================

/// How a table dump is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableWriteOptions {
    /// Output file. Defaults to the lowercased labels joined by `X`.
    pub path: Option<PathBuf>,
    /// Directory for the default file name.
    pub dir: Option<PathBuf>,
    pub delimiter: u8,
    /// Rows removed before writing.
    pub exclude: Exclusions,
}

impl Default for TableWriteOptions {
    fn default() -> Self {
        TableWriteOptions {
            path: None,
            dir: None,
            delimiter: b',',
            exclude: Exclusions::new(),
        }
    }
}

/// How a pivot dump is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotWriteOptions {
    /// Output file. Defaults to `<target>~(<rows>)Z(<cols>).csv`.
    pub path: Option<PathBuf>,
    /// Directory for the default file name.
    pub dir: Option<PathBuf>,
    pub delimiter: u8,
}

impl Default for PivotWriteOptions {
    fn default() -> Self {
        PivotWriteOptions {
            path: None,
            dir: None,
            delimiter: b',',
        }
    }
}

fn extension(delimiter: u8) -> &'static str {
    if delimiter == b'\t' {
        "tsv"
    } else {
        "csv"
    }
}

/// `subjectXageXwords.csv` for a table labelled SUBJECT, AGE, WORDS.
pub fn default_table_file_name(table: &Table, delimiter: u8) -> String {
    format!("{}.{}", joined_lowercase(table.names()), extension(delimiter))
}

/// `words~(age)Z(condition).csv` for WORDS by AGE and CONDITION.
pub fn default_pivot_file_name(pivot: &PivotResult, delimiter: u8) -> String {
    format!(
        "{}~({})Z({}).{}",
        pivot.target.to_lowercase(),
        joined_lowercase(&pivot.row_factors),
        joined_lowercase(&pivot.col_factors),
        extension(delimiter)
    )
}

fn joined_lowercase(names: &[String]) -> String {
    names
        .iter()
        .map(|name| name.to_lowercase())
        .collect::<Vec<_>>()
        .join("X")
}

fn resolve_path(path: Option<&Path>, dir: Option<&Path>, default_name: String) -> Result<PathBuf, TableError> {
    match path {
        Some(path) if path.as_os_str().is_empty() => Err(TableError::InvalidArgument(
            "fname must be a non-empty string".to_string(),
        )),
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(match dir {
            Some(dir) => dir.join(default_name),
            None => PathBuf::from(default_name),
        }),
    }
}

fn csv_writer<W: Write>(writer: W, delimiter: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::CRLF)
        .flexible(true)
        .from_writer(writer)
}

// ============================================================================
// TABLE DUMP
// ============================================================================

/// Writes the header row of labels, then one row per record.
pub fn write_table<W: Write>(
    table: &Table,
    writer: W,
    options: &TableWriteOptions,
    diagnostics: &mut Diagnostics,
) -> Result<(), PersistenceError> {
    table.validate_rectangular()?;
    let mask = build_filter_mask(table, &options.exclude, table.row_count(), diagnostics)?;

    let mut out = csv_writer(writer, options.delimiter);
    out.write_record(table.names())?;

    let mut written = 0usize;
    for (row, keep) in mask.iter().enumerate() {
        if !keep {
            continue;
        }
        out.write_record(table.row(row).iter().map(|value| value.repr()))?;
        written += 1;
    }
    out.flush()?;

    log_info!("CSV", "wrote {} of {} rows", written, table.row_count());
    Ok(())
}

/// Writes a table dump to a file and returns the path used.
pub fn save_table(
    table: &Table,
    options: &TableWriteOptions,
    diagnostics: &mut Diagnostics,
) -> Result<PathBuf, PersistenceError> {
    let path = resolve_path(
        options.path.as_deref(),
        options.dir.as_deref(),
        default_table_file_name(table, options.delimiter),
    )?;
    let file = File::create(&path)?;
    write_table(table, file, options, diagnostics)?;
    Ok(path)
}

// ============================================================================
// PIVOT DUMP
// ============================================================================

/// First line of a pivot dump. Quoted when the output is not
/// comma-delimited and there are exclusions to describe.
fn description_line(pivot: &PivotResult, delimiter: u8) -> String {
    let description = pivot.description(delimiter);
    let needs_quotes = (delimiter != b',' && !pivot.exclusions.is_empty())
        || description.contains(|c: char| c == delimiter as char || c == '"' || c == '\n');

    if needs_quotes {
        format!("\"{}\"\r\n", description.replace('"', "\"\""))
    } else {
        format!("{}\r\n", description)
    }
}

/// Writes the exclusion description, the header and one line per row key.
pub fn write_pivot<W: Write>(pivot: &PivotResult, mut writer: W, delimiter: u8) -> Result<(), PersistenceError> {
    writer.write_all(description_line(pivot, delimiter).as_bytes())?;

    let mut out = csv_writer(writer, delimiter);
    let (rows, cols) = pivot.shape();

    let mut header: Vec<String> = pivot.row_factors.clone();
    header.extend((0..cols).map(|col| pivot.column_label(col)));
    out.write_record(&header)?;

    for row in 0..rows {
        let mut line: Vec<String> = pivot.row_keys[row].iter().map(|value| value.repr()).collect();
        line.extend(pivot.cells[row].iter().map(|value| value.render()));
        out.write_record(&line)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the dataset's last pivot to a file and returns the path used.
pub fn save_pivot(dataset: &Dataset, options: &PivotWriteOptions) -> Result<PathBuf, PersistenceError> {
    let pivot = dataset.last_pivot()?;
    let path = resolve_path(
        options.path.as_deref(),
        options.dir.as_deref(),
        default_pivot_file_name(pivot, options.delimiter),
    )?;

    let file = File::create(&path)?;
    write_pivot(pivot, file, options.delimiter)?;
    log_info!("CSV", "pivot written to {}", path.display());
    Ok(path)
}
