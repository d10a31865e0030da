use std::io::Read;

use crate::{
    errors::BillingError,
    header::HeaderIndex,
    models::BillRow,
    traits::{Aggregating, ReportWrite},
};
use anyhow::Result;
use csv::{Reader, StringRecord};
use tracing::info;

/// A fully read billing export: the header row and every data record.
pub struct BillTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl BillTable {
    /// Reads the whole input before anything is aggregated, so a malformed
    /// record fails the load without any report having been written.
    pub fn from_reader<R: Read>(mut reader: Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(BillingError::EmptyInput.into());
        }

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, records })
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

pub struct Engine<T, P, M> {
    writer: T,
    table: BillTable,
    period: P,
    monthly: M,
}

impl<T, P, M> Engine<T, P, M>
where
    T: ReportWrite,
    P: Aggregating,
    M: Aggregating,
{
    pub fn new(writer: T, table: BillTable, period: P, monthly: M) -> Self {
        Self {
            writer,
            table,
            period,
            monthly,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let index = HeaderIndex::resolve(&self.table.headers);
        let mut qualifying = 0usize;

        for (position, record) in self.table.records.iter().enumerate() {
            let line = record
                .position()
                .map(|pos| pos.line())
                .unwrap_or(position as u64 + 2);
            let row = BillRow::new(record, &index, line);
            if !row.is_pay_as_you_go_instance() {
                continue;
            }
            qualifying += 1;

            self.monthly.apply_row(&row, &mut self.writer)?;
            self.period.apply_row(&row, &mut self.writer)?;
        }

        let periods = self.period.finish(&mut self.writer)?;
        let cells = self.monthly.finish(&mut self.writer)?;

        info!(
            rows = self.table.record_count(),
            qualifying,
            periods,
            cells,
            "bill aggregated"
        );
        Ok(())
    }
}

#[cfg(test)]
impl<T, P, M> Engine<T, P, M> {
    pub fn into_writer(self) -> T {
        self.writer
    }
}
