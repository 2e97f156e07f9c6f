//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot and statistics subsystem.
//!
//! This crate groups the rows of an `engine::Table` by factor columns and
//! summarizes a target column per group. It depends on `engine` only for
//! shared types (CellValue, Table, TableError, Diagnostics).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `stats`: Pure statistics over numeric samples
//! - `cache`: Interned, sorted factor levels (HOW we group)
//! - `engine`: Calculation engine (HOW we calculate)
//! - `view`: The dense result tensor (WHAT we report)
//! - `marginals`: Per-cell means with error terms, whole-column descriptives
//! - `dataset`: A table plus the slot holding its last pivot

pub mod definition;
pub mod stats;
pub mod cache;
pub mod engine;
pub mod view;
pub mod marginals;
pub mod dataset;

pub use definition::*;
pub use cache::{build_filter_mask, AxisCache, FactorCache};
pub use view::*;
pub use crate::engine::{aggregate_bucket, calculate_pivot, Grouping, PivotCalculator};
pub use marginals::{descriptives, marginals, select_column, Descriptives, ErrorBarStyle, Marginals};
pub use dataset::Dataset;
