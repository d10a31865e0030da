use crate::{
    report::{MonthlyLine, PeriodReport, fixed},
    traits::ReportWrite,
};
use anyhow::Result;
use rust_decimal::Decimal;
use std::io::{self, Stdout, Write};

const UNDEFINED: &str = "n/a";

fn fixed_or_undefined(value: &Option<Decimal>, places: u32) -> String {
    value
        .as_ref()
        .map(|value| fixed(value, places))
        .unwrap_or_else(|| UNDEFINED.to_owned())
}

/// Human-readable report, one line per instance type.
pub struct TextReportWriter<W: Write> {
    out: W,
}

impl TextReportWriter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TextReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

#[cfg(test)]
impl<W: Write> TextReportWriter<W> {
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportWrite for TextReportWriter<W> {
    fn write_period(&mut self, report: &PeriodReport) -> Result<()> {
        writeln!(self.out, "日期：{}", report.date())?;
        for line in report.lines() {
            writeln!(
                self.out,
                "InstanceType: {:>30} Amount: {:>10} Cores: {:>10} Fee/Core: {:>10} Fee：{:>10}",
                line.instance_type(),
                line.instances(),
                line.cores(),
                fixed_or_undefined(line.fee_per_core(), 5),
                fixed(line.fee(), 3),
            )?;
        }
        writeln!(self.out, "按量付费ECS总费用：{}", fixed(report.total_fee(), 6))?;
        Ok(())
    }

    fn write_separator(&mut self) -> Result<()> {
        writeln!(self.out)?;
        Ok(())
    }

    fn write_monthly(&mut self, line: &MonthlyLine) -> Result<()> {
        let (instance_type, period) = (line.instance_type(), line.billing_period());
        writeln!(
            self.out,
            "The instanceType {instance_type} in {period} 总费用是 is {}",
            fixed(line.fee(), 6)
        )?;
        writeln!(
            self.out,
            "The instanceType {instance_type} in {period} 总核时是 is {}",
            line.core_hours()
        )?;
        writeln!(
            self.out,
            "The instanceType {instance_type} in {period} 核时单价是 is {}",
            fixed_or_undefined(line.fee_per_core_hour(), 6)
        )?;
        Ok(())
    }
}

/// One JSON object per line for every period report and monthly cell.
pub struct JsonReportWriter<W: Write> {
    out: W,
}

impl JsonReportWriter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

#[cfg(test)]
impl<W: Write> JsonReportWriter<W> {
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportWrite for JsonReportWriter<W> {
    fn write_period(&mut self, report: &PeriodReport) -> Result<()> {
        serde_json::to_writer(&mut self.out, report)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_separator(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_monthly(&mut self, line: &MonthlyLine) -> Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        writeln!(self.out)?;
        Ok(())
    }
}
