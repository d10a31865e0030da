use crate::{
    cores::cores_from_config,
    models::{BillRow, InstanceFee, MonthlyTypeFee},
    report::{MonthlyLine, PeriodReport},
    traits::{Aggregating, ReportWrite},
};
use anyhow::Result;
use std::{
    collections::{BTreeMap, HashMap, btree_map::Entry},
    mem,
};
use tracing::debug;

/// Per-instance-type totals of consecutive rows sharing a billing date.
///
/// A change of date flushes the collected totals to the writer; equal dates
/// that are not adjacent in the input start a fresh period.
pub struct PeriodAggregator {
    current_date: Option<String>,
    fees: BTreeMap<String, InstanceFee>,
    seen_instances: HashMap<String, i64>,
    periods_flushed: usize,
}

impl PeriodAggregator {
    pub fn new() -> Self {
        Self {
            current_date: None,
            fees: BTreeMap::new(),
            seen_instances: HashMap::new(),
            periods_flushed: 0,
        }
    }

    fn flush(&mut self, writer: &mut impl ReportWrite) -> Result<()> {
        let date = self.current_date.take().unwrap_or_default();
        let fees = mem::take(&mut self.fees);
        self.seen_instances.clear();

        let report = PeriodReport::build(date, &fees)?;
        debug!(date = %report.date(), types = report.lines().len(), "period flushed");
        writer.write_period(&report)?;
        self.periods_flushed += 1;
        Ok(())
    }
}

impl Aggregating for PeriodAggregator {
    fn apply_row(&mut self, row: &BillRow<'_>, writer: &mut impl ReportWrite) -> Result<()> {
        let date = row.date();
        match self.current_date.as_deref() {
            Some(current) if current != date => {
                self.flush(writer)?;
                writer.write_separator()?;
            }
            _ => {}
        }
        if self.current_date.is_none() {
            self.current_date = Some(date.to_owned());
        }

        let duration = row.duration_or_zero();
        let fee = row.fee_or_zero();
        let instance_id = row.instance_id();
        let first_sighting = !self.seen_instances.contains_key(instance_id);

        // A type's first row always brings one instance, even when the id was
        // already billed under another type earlier in the period.
        match self.fees.entry(row.instance_type().to_owned()) {
            Entry::Vacant(entry) => entry.insert(InstanceFee::default()).record(duration, fee, true)?,
            Entry::Occupied(entry) => entry.into_mut().record(duration, fee, first_sighting)?,
        }

        let seen = self.seen_instances.entry(instance_id.to_owned()).or_insert(0);
        *seen = seen.saturating_add(duration);
        Ok(())
    }

    fn finish(&mut self, writer: &mut impl ReportWrite) -> Result<usize> {
        self.flush(writer)?;
        Ok(self.periods_flushed)
    }
}

/// Fee and core-time per instance type and billing period over the whole run.
pub struct MonthlyAggregator {
    cells: BTreeMap<String, BTreeMap<String, MonthlyTypeFee>>,
}

impl MonthlyAggregator {
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
impl MonthlyAggregator {
    pub fn cell(&self, instance_type: &str, billing_period: &str) -> Option<&MonthlyTypeFee> {
        self.cells
            .get(instance_type)
            .and_then(|periods| periods.get(billing_period))
    }
}

impl Aggregating for MonthlyAggregator {
    fn apply_row(&mut self, row: &BillRow<'_>, _writer: &mut impl ReportWrite) -> Result<()> {
        let fee = row.fee()?;
        let duration = row.duration()?;
        let cores = match cores_from_config(row.instance_config(), row.line())? {
            Some(cores) => cores,
            None => {
                debug!(line = row.line(), "instance configuration has no CPU attribute, counting 0 cores");
                0
            }
        };

        self.cells
            .entry(row.instance_type().to_owned())
            .or_default()
            .entry(row.billing_period().to_owned())
            .or_default()
            .add(fee, duration, cores)
    }

    fn finish(&mut self, writer: &mut impl ReportWrite) -> Result<usize> {
        let mut written = 0;
        for (instance_type, periods) in &self.cells {
            for (billing_period, cell) in periods {
                writer.write_monthly(&MonthlyLine::new(instance_type, billing_period, cell))?;
                written += 1;
            }
        }
        Ok(written)
    }
}
