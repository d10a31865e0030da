use crate::{
    cores::cores_for_instance_type,
    errors::BillingError,
    models::{InstanceFee, MonthlyTypeFee},
};
use anyhow::Result;
use getset::{CopyGetters, Getters};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

const SECONDS_PER_HOUR: i64 = 3600;

/// Fixed-point rendering with half-away-from-zero rounding.
pub fn fixed(value: &Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", places as usize, rounded)
}

fn fixed_three<S: serde::Serializer>(x: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&fixed(x, 3))
}

fn fixed_five<S: serde::Serializer>(x: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
    match x {
        Some(x) => s.serialize_str(&fixed(x, 5)),
        None => s.serialize_none(),
    }
}

fn fixed_six<S: serde::Serializer>(x: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&fixed(x, 6))
}

fn fixed_six_opt<S: serde::Serializer>(x: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
    match x {
        Some(x) => s.serialize_str(&fixed(x, 6)),
        None => s.serialize_none(),
    }
}

/// One instance type's line in a period report.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, CopyGetters)]
pub struct PeriodLine {
    #[getset(get = "pub")]
    instance_type: String,
    #[getset(get_copy = "pub")]
    instances: u32,
    /// Cores of one instance times the instance count.
    #[getset(get_copy = "pub")]
    cores: u64,
    /// Fee per core-hour; `None` when no core time was billed.
    #[getset(get = "pub")]
    #[serde(serialize_with = "fixed_five")]
    fee_per_core: Option<Decimal>,
    #[getset(get = "pub")]
    #[serde(serialize_with = "fixed_three")]
    fee: Decimal,
}

impl PeriodLine {
    fn new(instance_type: &str, totals: &InstanceFee) -> Result<Self> {
        let cores = cores_for_instance_type(instance_type);
        let core_seconds = totals
            .duration()
            .checked_mul(i64::from(cores))
            .ok_or(BillingError::ValueOverflow)?;

        let fee_per_core = totals
            .fee()
            .checked_mul(Decimal::from(SECONDS_PER_HOUR))
            .and_then(|fee| fee.checked_div(Decimal::from(core_seconds)));

        Ok(Self {
            instance_type: instance_type.to_owned(),
            instances: totals.instances(),
            cores: u64::from(cores) * u64::from(totals.instances()),
            fee_per_core,
            fee: *totals.fee(),
        })
    }
}

/// Everything printed when a billing date's rows are complete.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[getset(get = "pub")]
pub struct PeriodReport {
    date: String,
    lines: Vec<PeriodLine>,
    #[serde(serialize_with = "fixed_six")]
    total_fee: Decimal,
}

impl PeriodReport {
    pub fn build(date: String, fees: &BTreeMap<String, InstanceFee>) -> Result<Self> {
        let lines = fees
            .iter()
            .map(|(instance_type, totals)| PeriodLine::new(instance_type, totals))
            .collect::<Result<Vec<_>>>()?;

        let total_fee = lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.fee))
            .ok_or(BillingError::ValueOverflow)?;

        Ok(Self {
            date,
            lines,
            total_fee,
        })
    }
}

/// Totals of one instance type over one billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, CopyGetters)]
pub struct MonthlyLine {
    #[getset(get = "pub")]
    instance_type: String,
    #[getset(get = "pub")]
    billing_period: String,
    #[getset(get = "pub")]
    #[serde(serialize_with = "fixed_six")]
    fee: Decimal,
    #[getset(get_copy = "pub")]
    core_hours: i64,
    /// Fee per whole core-hour; `None` below one core-hour.
    #[getset(get = "pub")]
    #[serde(serialize_with = "fixed_six_opt")]
    fee_per_core_hour: Option<Decimal>,
}

impl MonthlyLine {
    pub fn new(instance_type: &str, billing_period: &str, cell: &MonthlyTypeFee) -> Self {
        let core_hours = cell.core_hours();
        Self {
            instance_type: instance_type.to_owned(),
            billing_period: billing_period.to_owned(),
            fee: *cell.fee(),
            core_hours,
            fee_per_core_hour: cell.fee().checked_div(Decimal::from(core_hours)),
        }
    }
}
