//! FILENAME: core/pivot-engine/src/marginals.rs
//! Marginals & Descriptives - per-cell means with error terms, and the
//! summary statistics of a whole column.
//!
//! Marginals reuse the pivot grouping (same validation, same exclusion and
//! same level ordering) with every factor on the row axis, so the cells line
//! up with the rows of the equivalent pivot.

use engine::logging::log_debug;
use engine::{CellValue, Diagnostics, Table, TableError, TableResult};
use serde::{Deserialize, Serialize};

use crate::cache::build_filter_mask;
use crate::definition::{AggregationType, Exclusions, PivotRequest};
use crate::engine::{bucket_numbers, PivotCalculator};
use crate::stats;

// ============================================================================
// DESCRIPTIVES
// ============================================================================

/// Summary statistics of one column. Statistics that are undefined for the
/// sample size are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptives {
    pub count: usize,
    pub mean: Option<f64>,
    pub var: Option<f64>,
    pub stdev: Option<f64>,
    pub sem: Option<f64>,
    pub rms: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    pub median: Option<f64>,
    pub ci95_lower: Option<f64>,
    pub ci95_upper: Option<f64>,
}

impl Descriptives {
    pub fn from_values(values: &[f64]) -> Self {
        let mean = stats::mean(values);
        let sem = stats::sem(values);
        let ci = mean.zip(sem).map(|(m, s)| stats::ci95(m, s));

        Descriptives {
            count: stats::count(values),
            mean,
            var: stats::sample_variance(values),
            stdev: stats::sample_stdev(values),
            sem,
            rms: stats::rms(values),
            min: stats::min(values),
            max: stats::max(values),
            range: stats::range(values),
            median: stats::median(values),
            ci95_lower: ci.map(|(lower, _)| lower),
            ci95_upper: ci.map(|(_, upper)| upper),
        }
    }

    /// `(name, value)` pairs in report order.
    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("var", self.var),
            ("stdev", self.stdev),
            ("sem", self.sem),
            ("rms", self.rms),
            ("min", self.min),
            ("max", self.max),
            ("range", self.range),
            ("median", self.median),
            ("95ci_lower", self.ci95_lower),
            ("95ci_upper", self.ci95_upper),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value)
    }
}

/// Descriptive statistics of `column`, ignoring missing and empty cells.
pub fn descriptives(table: &Table, column: &str) -> TableResult<Descriptives> {
    let values = table.get_column(column)?;
    let numbers = bucket_numbers(AggregationType::Average, values)?;
    log_debug!("PIVOT", "descriptives of {} over {} values", column, numbers.len());
    Ok(Descriptives::from_values(&numbers))
}

// ============================================================================
// MARGINALS
// ============================================================================

/// Error bar sizing for plotted marginal means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ErrorBarStyle {
    /// The same half-width for every cell.
    Fixed(f64),
    /// One standard error of the mean.
    Sem,
    /// Half-width of the 95% confidence interval.
    Ci95,
}

/// Marginal means over the Cartesian product of a set of factors.
/// All vectors are parallel: entry `i` describes the cell `labels[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marginals {
    pub factors: Vec<String>,
    pub labels: Vec<Vec<CellValue>>,
    pub means: Vec<Option<f64>>,
    pub counts: Vec<usize>,
    pub sems: Vec<Option<f64>>,
    pub ci_lower: Vec<Option<f64>>,
    pub ci_upper: Vec<Option<f64>>,
}

impl Marginals {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Half-widths of the error bars, one per cell.
    pub fn error_bars(&self, style: ErrorBarStyle) -> TableResult<Vec<f64>> {
        let scale = match style {
            ErrorBarStyle::Fixed(width) => return Ok(vec![width; self.len()]),
            ErrorBarStyle::Sem => 1.0,
            ErrorBarStyle::Ci95 => stats::Z_95,
        };

        self.sems
            .iter()
            .zip(self.counts.iter())
            .map(|(sem, &count)| match sem {
                Some(sem) if count >= 2 => Ok(sem * scale),
                _ => Err(TableError::InsufficientData(match style {
                    ErrorBarStyle::Sem => "cell count too low to calculate sem".to_string(),
                    _ => "cell count too low to calculate ci".to_string(),
                })),
            })
            .collect()
    }
}

/// Means, counts, standard errors and 95% intervals of `column` for every
/// combination of `factors` after `exclude` is applied.
pub fn marginals(
    table: &Table,
    column: &str,
    factors: &[String],
    exclude: &Exclusions,
    diagnostics: &mut Diagnostics,
) -> TableResult<Marginals> {
    let request = PivotRequest::new(column)
        .rows(factors.iter().cloned())
        .excluding(exclude);
    let grouping = PivotCalculator::new(table, &request).group(diagnostics)?;

    let mut result = Marginals {
        factors: factors.to_vec(),
        labels: Vec::with_capacity(grouping.row_keys.len()),
        means: Vec::new(),
        counts: Vec::new(),
        sems: Vec::new(),
        ci_lower: Vec::new(),
        ci_upper: Vec::new(),
    };

    for (row, key) in grouping.row_keys.iter().enumerate() {
        let numbers = bucket_numbers(AggregationType::Average, grouping.bucket(row, 0))?;
        let mean = stats::mean(&numbers);
        let sem = stats::sem(&numbers);
        let ci = mean.zip(sem).map(|(m, s)| stats::ci95(m, s));

        result.labels.push(key.clone());
        result.means.push(mean);
        result.counts.push(numbers.len());
        result.sems.push(sem);
        result.ci_lower.push(ci.map(|(lower, _)| lower));
        result.ci_upper.push(ci.map(|(_, upper)| upper));
    }

    Ok(result)
}

// ============================================================================
// SELECTION
// ============================================================================

/// The values of `column` on the rows that survive `exclude`, in row order.
pub fn select_column(
    table: &Table,
    column: &str,
    exclude: &Exclusions,
    diagnostics: &mut Diagnostics,
) -> TableResult<Vec<CellValue>> {
    let values = table.get_column(column)?;

    let mut relevant = vec![column];
    relevant.extend(exclude.fields().map(|(field, _)| field));
    let row_count = table.validate_columns(&relevant)?;

    let mask = build_filter_mask(table, exclude, row_count, diagnostics)?;
    Ok(values
        .iter()
        .zip(mask)
        .filter_map(|(value, keep)| keep.then(|| value.clone()))
        .collect())
}
