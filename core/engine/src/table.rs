//! FILENAME: core/engine/src/table.rs
//! PURPOSE: The column store (a labeled, column-oriented table).
//! CONTEXT: This file defines the `Table` struct, the source of truth for
//! every grouping and statistics operation. Columns are free-form: they may
//! be replaced with sequences of any length, and rectangularity is checked
//! lazily by the entry points that need it (`validate_rectangular`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{TableError, TableResult};
use crate::logging::log_debug;

/// An ordered mapping from label to column values.
/// Labels are case-sensitive and unique within a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "TableColumns")]
pub struct Table {
    /// Labels in insertion order.
    labels: Vec<String>,

    /// Column data, parallel to `labels`.
    columns: Vec<Vec<CellValue>>,

    /// Label -> position in `labels`/`columns`.
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Serialized form of a table; the index is rebuilt on load.
#[derive(Deserialize)]
struct TableColumns {
    labels: Vec<String>,
    columns: Vec<Vec<CellValue>>,
}

impl From<TableColumns> for Table {
    fn from(raw: TableColumns) -> Self {
        let mut table = Table {
            labels: raw.labels,
            columns: raw.columns,
            index: HashMap::new(),
        };
        table.rebuild_index();
        table
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels && self.columns == other.columns
    }
}

impl Table {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        Table {
            labels: Vec::new(),
            columns: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Builds a table from `(label, values)` pairs. A repeated label
    /// replaces the earlier column.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<CellValue>)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (label, values) in columns {
            table.set_column(label, values);
        }
        table
    }

    /// Column labels in insertion order.
    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn column_count(&self) -> usize {
        self.labels.len()
    }

    /// The row count `M`: the length of the first column.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Retrieves a column by label.
    pub fn get_column(&self, label: &str) -> TableResult<&[CellValue]> {
        self.position(label)
            .map(|pos| self.columns[pos].as_slice())
            .ok_or_else(|| TableError::KeyError(label.to_string()))
    }

    /// Mutable access to an existing column. Length changes are allowed.
    pub fn get_column_mut(&mut self, label: &str) -> TableResult<&mut Vec<CellValue>> {
        match self.position(label) {
            Some(pos) => Ok(&mut self.columns[pos]),
            None => Err(TableError::KeyError(label.to_string())),
        }
    }

    /// Replaces or appends a column. The length is not checked against the
    /// other columns.
    pub fn set_column(&mut self, label: impl Into<String>, values: Vec<CellValue>) {
        let label = label.into();
        match self.position(&label) {
            Some(pos) => self.columns[pos] = values,
            None => {
                self.index.insert(label.clone(), self.labels.len());
                self.labels.push(label);
                self.columns.push(values);
            }
        }
    }

    /// Appends a column under a label that is unique within the table.
    /// A colliding label is renamed `label_2`, `label_3`, ... and a
    /// `DuplicateLabel` warning is recorded. Returns the label used.
    pub fn insert_unique(
        &mut self,
        label: &str,
        values: Vec<CellValue>,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let mut unique = label.to_string();
        let mut suffix = 2;
        while self.contains(&unique) {
            unique = format!("{}_{}", label, suffix);
            suffix += 1;
        }
        if unique != label {
            diagnostics.warn(
                DiagnosticKind::DuplicateLabel,
                format!("duplicate label '{}' renamed to '{}'", label, unique),
            );
        }
        self.set_column(unique.clone(), values);
        unique
    }

    /// Removes a column, returning its values.
    pub fn remove_column(&mut self, label: &str) -> TableResult<Vec<CellValue>> {
        let pos = self
            .position(label)
            .ok_or_else(|| TableError::KeyError(label.to_string()))?;
        self.labels.remove(pos);
        let values = self.columns.remove(pos);
        self.rebuild_index();
        Ok(values)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .labels
            .iter()
            .enumerate()
            .map(|(pos, label)| (label.clone(), pos))
            .collect();
    }

    /// Appends the rows of `other` beneath the rows of this table.
    /// Both tables must carry the same set of labels; the check runs before
    /// any column is touched.
    pub fn attach(&mut self, other: &Table) -> TableResult<()> {
        if self.labels.len() != other.labels.len()
            || !self.labels.iter().all(|label| other.contains(label))
        {
            return Err(TableError::SchemaMismatch);
        }

        for (pos, label) in self.labels.iter().enumerate() {
            let incoming = other.get_column(label)?;
            self.columns[pos].extend_from_slice(incoming);
        }
        log_debug!("TABLE", "attached {} rows, now {}", other.row_count(), self.row_count());
        Ok(())
    }

    /// Checks that every column has the same length.
    pub fn validate_rectangular(&self) -> TableResult<()> {
        let mut lengths = self.columns.iter().map(Vec::len);
        match lengths.next() {
            Some(first) if lengths.any(|len| len != first) => Err(TableError::ShapeError),
            _ => Ok(()),
        }
    }

    /// Checks that the named columns exist and have the same length.
    /// Returns that common length.
    pub fn validate_columns<S: AsRef<str>>(&self, labels: &[S]) -> TableResult<usize> {
        let mut common: Option<usize> = None;
        for label in labels {
            let len = self.get_column(label.as_ref())?.len();
            match common {
                Some(expected) if expected != len => return Err(TableError::ShapeError),
                _ => common = Some(len),
            }
        }
        Ok(common.unwrap_or(0))
    }

    /// Returns the record at `row` across all columns. Cells past the end
    /// of a short column are `Missing`.
    pub fn row(&self, row: usize) -> Vec<CellValue> {
        self.columns
            .iter()
            .map(|column| column.get(row).cloned().unwrap_or(CellValue::Missing))
            .collect()
    }

    /// Builds a new table holding only the rows whose mask entry is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Table {
        let columns = self.labels.iter().zip(self.columns.iter()).map(|(label, column)| {
            let kept = column
                .iter()
                .zip(mask.iter())
                .filter_map(|(value, &keep)| if keep { Some(value.clone()) } else { None })
                .collect();
            (label.clone(), kept)
        });
        Table::from_columns(columns)
    }
}
