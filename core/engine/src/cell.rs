//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: Defines the value held by a single cell of the column store.
//! CONTEXT: A cell is a number, a piece of text, or the missing marker.
//! The empty string is a valid text cell and is never confused with
//! `Missing`, which only means "no data here".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Represents the typed content of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Missing,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Converts a raw delimited field into a cell.
    /// Numeric-looking fields become numbers, everything else is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Text(raw.to_string());
        }
        match trimmed.parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Missing, or text that is empty after trimming. Blank cells are not
    /// counted or aggregated.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Default floating-point text form: numbers always carry a decimal
    /// point (`3.0`), text is verbatim and missing renders empty.
    pub fn repr(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            CellValue::Number(n) => format_float(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Human-oriented rendering. Integral numbers drop the fraction.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format_float(*n)
                }
            }
            other => other.repr(),
        }
    }

    /// Total order used for factor levels: missing, then numbers ascending,
    /// then text lexicographically. NaN sorts after every other number.
    pub fn total_cmp(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Missing, CellValue::Missing) => Ordering::Equal,
            (CellValue::Missing, _) => Ordering::Less,
            (_, CellValue::Missing) => Ordering::Greater,

            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,

            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Missing
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Shortest round-trip rendering of a float that always shows a fraction
/// for finite integral values.
pub fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{:?}", n)
}
