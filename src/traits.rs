use anyhow::Result;

use crate::{
    models::BillRow,
    report::{MonthlyLine, PeriodReport},
};

/// ReportWrite trait provides the sink the aggregators emit their reports to.
pub trait ReportWrite {
    /// Writes the report of one completed billing date.
    ///
    /// # Arguments
    /// * `report` - The per-instance-type totals of the date.
    ///
    /// # Returns
    /// A Result indicating success or failure.
    fn write_period(&mut self, report: &PeriodReport) -> Result<()>;

    /// Writes the separator between two consecutive period reports.
    fn write_separator(&mut self) -> Result<()>;

    /// Writes the totals of one instance type within one billing period.
    ///
    /// # Arguments
    /// * `line` - The fee and core-hour totals of the cell.
    ///
    /// # Returns
    /// A Result indicating success or failure.
    fn write_monthly(&mut self, line: &MonthlyLine) -> Result<()>;
}

/// Aggregating trait provides a fold over qualifying bill rows.
pub trait Aggregating {
    /// Folds one qualifying row into the running totals, emitting any report
    /// the row completes.
    ///
    /// # Arguments
    /// * `row` - The row to fold in.
    /// * `writer` - The sink for completed reports.
    ///
    /// # Returns
    /// A Result indicating success or failure.
    fn apply_row(&mut self, row: &BillRow<'_>, writer: &mut impl ReportWrite) -> Result<()>;

    /// Emits whatever is still pending once the input is exhausted.
    ///
    /// # Returns
    /// The number of reports written over the whole run.
    fn finish(&mut self, writer: &mut impl ReportWrite) -> Result<usize>;
}
