//! FILENAME: core/pivot-engine/src/dataset.rs
//! Dataset - A table together with the result of its most recent pivot.
//!
//! The dataset owns a single pivot slot. Every pivot call overwrites it and
//! every mutation made through the dataset clears it, so a stored result
//! always describes the current table.

use engine::logging::log_debug;
use engine::{CellValue, Diagnostics, Table, TableError, TableResult};

use crate::definition::{Exclusions, PivotRequest};
use crate::engine::calculate_pivot;
use crate::marginals::{self, Descriptives, Marginals};
use crate::view::PivotResult;

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    table: Table,
    last_pivot: Option<PivotResult>,
    diagnostics: Diagnostics,
}

impl Dataset {
    pub fn new(table: Table) -> Self {
        Dataset {
            table,
            last_pivot: None,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Wraps a freshly loaded table, keeping the warnings raised while
    /// loading it.
    pub fn with_diagnostics(table: Table, diagnostics: Diagnostics) -> Self {
        Dataset {
            table,
            last_pivot: None,
            diagnostics,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Mutable access to the table. Clears the stored pivot.
    pub fn table_mut(&mut self) -> &mut Table {
        self.invalidate();
        &mut self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn set_column(&mut self, label: impl Into<String>, values: Vec<CellValue>) {
        self.invalidate();
        self.table.set_column(label, values);
    }

    /// Appends the rows of `other`. On a schema mismatch nothing changes,
    /// the stored pivot included.
    pub fn attach(&mut self, other: &Table) -> TableResult<()> {
        self.table.attach(other)?;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        if self.last_pivot.take().is_some() {
            log_debug!("PIVOT", "table changed, stored pivot dropped");
        }
    }

    /// Computes a pivot and stores it as the last result.
    pub fn pivot(&mut self, request: &PivotRequest) -> TableResult<&PivotResult> {
        let result = calculate_pivot(&self.table, request, &mut self.diagnostics)?;
        Ok(self.last_pivot.insert(result))
    }

    /// The result of the most recent pivot.
    pub fn last_pivot(&self) -> TableResult<&PivotResult> {
        self.last_pivot.as_ref().ok_or_else(|| {
            TableError::IllegalState("must call pivot before writing pivot table".to_string())
        })
    }

    pub fn descriptives(&self, column: &str) -> TableResult<Descriptives> {
        marginals::descriptives(&self.table, column)
    }

    pub fn marginals(
        &mut self,
        column: &str,
        factors: &[String],
        exclude: &Exclusions,
    ) -> TableResult<Marginals> {
        marginals::marginals(&self.table, column, factors, exclude, &mut self.diagnostics)
    }

    pub fn select_column(&mut self, column: &str, exclude: &Exclusions) -> TableResult<Vec<CellValue>> {
        marginals::select_column(&self.table, column, exclude, &mut self.diagnostics)
    }

    /// Warnings accumulated so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        self.diagnostics.take()
    }
}

impl From<Table> for Dataset {
    fn from(table: Table) -> Self {
        Dataset::new(table)
    }
}
