//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot Result - The dense tensor produced by one pivot call.
//!
//! The result keeps everything a later dump needs without re-passing the
//! request: the target, the factor names in order, the aggregate, the
//! exclusions and the ordered keys of both axes.

use engine::{CellValue, format_float};
use serde::{Deserialize, Serialize};

use crate::definition::{AggregationType, Exclusions};

/// The aggregate of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PivotValue {
    /// No data for the bucket (or the statistic is undefined for it).
    Missing,
    Number(f64),
    /// Result of the count aggregate. Empty buckets count 0.
    Count(usize),
    /// Result of group_concat: the bucket values in row order.
    List(Vec<CellValue>),
}

impl PivotValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, PivotValue::Missing)
    }

    /// Numeric view of the value. Counts convert to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PivotValue::Number(n) => Some(*n),
            PivotValue::Count(c) => Some(*c as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            PivotValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Text form used by the pivot dump.
    pub fn render(&self) -> String {
        match self {
            PivotValue::Missing => String::new(),
            PivotValue::Number(n) => format_float(*n),
            PivotValue::Count(c) => c.to_string(),
            PivotValue::List(values) => {
                let items: Vec<String> = values.iter().map(CellValue::repr).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

impl From<Option<f64>> for PivotValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(PivotValue::Missing, PivotValue::Number)
    }
}

/// The outcome of one pivot call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    /// The aggregated column.
    pub target: String,

    /// Row factor names, in request order.
    pub row_factors: Vec<String>,

    /// Column factor names, in request order.
    pub col_factors: Vec<String>,

    pub aggregate: AggregationType,

    /// Exclusions applied before grouping.
    pub exclusions: Exclusions,

    /// One entry per row of `cells`: the row factor values.
    pub row_keys: Vec<Vec<CellValue>>,

    /// One entry per column of `cells`: the column factor values.
    pub col_keys: Vec<Vec<CellValue>>,

    /// Row-major aggregates, `row_keys.len()` x `col_keys.len()`.
    pub cells: Vec<Vec<PivotValue>>,
}

impl PivotResult {
    /// (rows, columns) of the tensor.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_keys.len(), self.col_keys.len())
    }

    /// The tensor as numbers, missing cells as `None`.
    pub fn to_matrix(&self) -> Vec<Vec<Option<f64>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(PivotValue::as_f64).collect())
            .collect()
    }

    /// Header of a result column: `FACTOR=value_FACTOR2=value2`, or
    /// `Value` when there are no column factors.
    pub fn column_label(&self, col: usize) -> String {
        if self.col_factors.is_empty() {
            return "Value".to_string();
        }
        match self.col_keys.get(col) {
            Some(key) => factor_label(&self.col_factors, key),
            None => String::new(),
        }
    }

    /// Label of a result row in `FACTOR=value` form, empty without row factors.
    pub fn row_label(&self, row: usize) -> String {
        match self.row_keys.get(row) {
            Some(key) => factor_label(&self.row_factors, key),
            None => String::new(),
        }
    }

    /// Exclusion description for the first line of a dump.
    pub fn description(&self, delimiter: u8) -> String {
        self.exclusions.describe(&self.target, delimiter)
    }
}

fn factor_label(factors: &[String], key: &[CellValue]) -> String {
    factors
        .iter()
        .zip(key.iter())
        .map(|(factor, value)| format!("{}={}", factor, value.repr()))
        .collect::<Vec<_>>()
        .join("_")
}
