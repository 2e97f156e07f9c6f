//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - The calculation core that turns a table into a pivot result.
//!
//! This module takes a PivotRequest (configuration) and a Table (data)
//! and produces a PivotResult (dense tensor plus metadata).
//!
//! Algorithm:
//! 1. Validate the target, the factors and the exclusion fields
//! 2. Apply exclusions to produce the filtered row set
//! 3. Build the row and column axes from the factor levels of that set
//! 4. Drop every filtered row's target value into its (row key, col key) bucket
//! 5. Aggregate every bucket of the dense grid, empty ones included

use engine::logging::{log_debug, log_info};
use engine::{CellValue, Diagnostics, Table, TableError, TableResult};

use crate::cache::{build_filter_mask, AxisCache};
use crate::definition::{AggregationType, PivotRequest};
use crate::stats;
use crate::view::{PivotResult, PivotValue};

// ============================================================================
// GROUPING
// ============================================================================

/// Target values partitioned by (row key, col key), before aggregation.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub row_keys: Vec<Vec<CellValue>>,
    pub col_keys: Vec<Vec<CellValue>>,

    /// Row-major buckets, `row_keys.len() * col_keys.len()` of them.
    /// Values keep their original row order.
    pub buckets: Vec<Vec<CellValue>>,
}

impl Grouping {
    pub fn bucket(&self, row: usize, col: usize) -> &[CellValue] {
        &self.buckets[row * self.col_keys.len() + col]
    }
}

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// The main calculation engine for pivots.
pub struct PivotCalculator<'a> {
    table: &'a Table,
    request: &'a PivotRequest,

    /// Rows that survive the exclusions.
    filter_mask: Vec<bool>,

    row_axis: AxisCache,
    col_axis: AxisCache,
}

impl<'a> PivotCalculator<'a> {
    /// Creates a new calculator instance.
    pub fn new(table: &'a Table, request: &'a PivotRequest) -> Self {
        PivotCalculator {
            table,
            request,
            filter_mask: Vec::new(),
            row_axis: AxisCache::default(),
            col_axis: AxisCache::default(),
        }
    }

    /// Executes the full calculation and returns the result.
    pub fn calculate(&mut self, diagnostics: &mut Diagnostics) -> TableResult<PivotResult> {
        let grouping = self.group(diagnostics)?;
        let aggregate = self.request.aggregate;

        // Step 5: Aggregate every bucket of the dense grid
        let cells = (0..grouping.row_keys.len())
            .map(|row| {
                (0..grouping.col_keys.len())
                    .map(|col| aggregate_bucket(aggregate, grouping.bucket(row, col)))
                    .collect::<TableResult<Vec<_>>>()
            })
            .collect::<TableResult<Vec<_>>>()?;

        log_info!(
            "PIVOT",
            "pivot {} of {}: {}x{}",
            aggregate,
            self.request.target,
            grouping.row_keys.len(),
            grouping.col_keys.len()
        );

        Ok(PivotResult {
            target: self.request.target.clone(),
            row_factors: self.request.rows.clone(),
            col_factors: self.request.cols.clone(),
            aggregate,
            exclusions: self.request.exclude.clone(),
            row_keys: grouping.row_keys,
            col_keys: grouping.col_keys,
            cells,
        })
    }

    /// Runs steps 1-4: validation, filtering, axes and bucketing.
    pub fn group(&mut self, diagnostics: &mut Diagnostics) -> TableResult<Grouping> {
        // Step 1: Every referenced column must exist and be equally long
        let row_count = self.validate()?;

        // Step 2: Apply exclusions
        self.filter_mask =
            build_filter_mask(self.table, &self.request.exclude, row_count, diagnostics)?;

        // Step 3: Build axes from the surviving rows
        self.row_axis = AxisCache::build(self.table, &self.request.rows, &self.filter_mask)?;
        self.col_axis = AxisCache::build(self.table, &self.request.cols, &self.filter_mask)?;

        // Step 4: Fill the buckets
        let col_count = self.col_axis.len();
        let mut buckets = vec![Vec::new(); self.row_axis.len() * col_count];
        let target = self.table.get_column(&self.request.target)?;

        for (row, value) in target.iter().enumerate().take(row_count) {
            if !self.filter_mask[row] {
                continue;
            }
            let (Some(r), Some(c)) = (self.row_axis.index_of_row(row), self.col_axis.index_of_row(row))
            else {
                continue;
            };
            buckets[r * col_count + c].push(value.clone());
        }

        log_debug!(
            "PIVOT",
            "grouped {} of {} rows into {} buckets",
            self.filter_mask.iter().filter(|&&keep| keep).count(),
            row_count,
            buckets.len()
        );

        Ok(Grouping {
            row_keys: self.row_axis.keys(),
            col_keys: self.col_axis.keys(),
            buckets,
        })
    }

    /// Checks the referenced columns and returns the common row count.
    fn validate(&self) -> TableResult<usize> {
        let request = self.request;
        self.table.get_column(&request.target)?;

        // Factor names are checked before any computation, rows first.
        for factor in request.rows.iter().chain(request.cols.iter()) {
            self.table.get_column(factor)?;
        }

        let mut relevant: Vec<&str> = vec![request.target.as_str()];
        relevant.extend(request.rows.iter().map(String::as_str));
        relevant.extend(request.cols.iter().map(String::as_str));
        relevant.extend(request.exclude.fields().map(|(field, _)| field));
        self.table.validate_columns(&relevant)
    }
}

// ============================================================================
// BUCKET AGGREGATION
// ============================================================================

/// Extracts the numbers of a bucket for a numeric statistic.
/// Blank cells are skipped; any other text fails.
pub fn bucket_numbers(aggregate: AggregationType, values: &[CellValue]) -> TableResult<Vec<f64>> {
    let mut numbers = Vec::with_capacity(values.len());
    for value in values.iter().filter(|v| !v.is_blank()) {
        match value {
            CellValue::Number(n) => numbers.push(*n),
            CellValue::Text(s) => {
                return Err(TableError::TypeError(format!(
                    "cannot compute {} of non-numeric value '{}'",
                    aggregate, s
                )))
            }
            CellValue::Missing => {}
        }
    }
    Ok(numbers)
}

/// Applies `aggregate` to one bucket. Empty buckets are `Missing`, except
/// under count which yields zero.
pub fn aggregate_bucket(aggregate: AggregationType, values: &[CellValue]) -> TableResult<PivotValue> {
    if !aggregate.is_numeric() {
        let present = values.iter().filter(|v| !v.is_blank());
        return Ok(match aggregate {
            AggregationType::Count => PivotValue::Count(present.count()),
            _ => {
                let present: Vec<CellValue> = present.cloned().collect();
                if present.is_empty() {
                    PivotValue::Missing
                } else {
                    PivotValue::List(present)
                }
            }
        });
    }

    let numbers = bucket_numbers(aggregate, values)?;
    if numbers.is_empty() {
        return Ok(PivotValue::Missing);
    }

    let value = match aggregate {
        AggregationType::Sum => Some(stats::sum(&numbers)),
        AggregationType::Average => stats::mean(&numbers),
        AggregationType::StdDev => stats::sample_stdev(&numbers),
        AggregationType::Sem => stats::sem(&numbers),
        AggregationType::Var => stats::sample_variance(&numbers),
        AggregationType::Rms => stats::rms(&numbers),
        AggregationType::Min => stats::min(&numbers),
        AggregationType::Max => stats::max(&numbers),
        AggregationType::Range => stats::range(&numbers),
        AggregationType::Median => stats::median(&numbers),
        AggregationType::Skew => stats::skewness(&numbers),
        AggregationType::Count | AggregationType::GroupConcat => None,
    };
    Ok(PivotValue::from(value))
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates a pivot result from a request and a table.
/// This is the main entry point for the calculation engine.
pub fn calculate_pivot(
    table: &Table,
    request: &PivotRequest,
    diagnostics: &mut Diagnostics,
) -> TableResult<PivotResult> {
    let mut calculator = PivotCalculator::new(table, request);
    calculator.calculate(diagnostics)
}
