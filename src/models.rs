use crate::{
    errors::BillingError,
    header::{Field, HeaderIndex},
};
use anyhow::Result;
use csv::StringRecord;
use getset::{CopyGetters, Getters};
use rust_decimal::prelude::*;

pub const PRODUCT_CODE_ECS: &str = "ecs";
pub const PAY_TYPE_POST_PAID: &str = "后付费";
pub const LINE_ITEM_SERVER_CONFIG: &str = "云服务器配置";

/// One data record of the export, read through the resolved header index.
#[derive(Debug, Clone, Copy)]
pub struct BillRow<'a> {
    record: &'a StringRecord,
    index: &'a HeaderIndex,
    line: u64,
}

impl<'a> BillRow<'a> {
    pub fn new(record: &'a StringRecord, index: &'a HeaderIndex, line: u64) -> Self {
        Self {
            record,
            index,
            line,
        }
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    /// The cell for `field`, or `None` when the column is unresolved or the
    /// record is too short to hold it.
    pub fn get(&self, field: Field) -> Option<&'a str> {
        self.index
            .position(field)
            .and_then(|position| self.record.get(position))
    }

    fn text(&self, field: Field) -> &'a str {
        self.get(field).unwrap_or_default()
    }

    pub fn instance_type(&self) -> &'a str {
        self.text(Field::InstanceType)
    }

    pub fn instance_id(&self) -> &'a str {
        self.text(Field::InstanceId)
    }

    pub fn date(&self) -> &'a str {
        self.text(Field::Date)
    }

    pub fn billing_period(&self) -> &'a str {
        self.text(Field::BillingPeriod)
    }

    pub fn instance_config(&self) -> &'a str {
        self.text(Field::InstanceConfig)
    }

    /// Pay-as-you-go ECS server charge. The line-item check only applies when
    /// the export carries a line-item column.
    pub fn is_pay_as_you_go_instance(&self) -> bool {
        let line_item_matches = match self.index.line_item_type() {
            None => true,
            Some(_) => self.get(Field::LineItemType) == Some(LINE_ITEM_SERVER_CONFIG),
        };

        self.get(Field::ProductCode) == Some(PRODUCT_CODE_ECS)
            && self.get(Field::PayType) == Some(PAY_TYPE_POST_PAID)
            && line_item_matches
    }

    /// Duration in seconds, zero when the cell is not an integer.
    pub fn duration_or_zero(&self) -> i64 {
        self.text(Field::Duration).parse().unwrap_or(0)
    }

    /// Fee, zero when the cell is not a number.
    pub fn fee_or_zero(&self) -> Decimal {
        parse_fee(self.text(Field::Fee)).unwrap_or(Decimal::ZERO)
    }

    pub fn duration(&self) -> Result<i64> {
        let value = self.text(Field::Duration);
        Ok(value.parse::<i64>().map_err(|_| BillingError::InvalidDuration {
            line: self.line,
            value: value.to_owned(),
        })?)
    }

    pub fn fee(&self) -> Result<Decimal> {
        let value = self.text(Field::Fee);
        Ok(parse_fee(value).ok_or_else(|| BillingError::InvalidFee {
            line: self.line,
            value: value.to_owned(),
        })?)
    }
}

fn parse_fee(value: &str) -> Option<Decimal> {
    value
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

/// Running totals of one instance type within the current billing date.
#[derive(Debug, Clone, Default, PartialEq, Getters, CopyGetters)]
pub struct InstanceFee {
    #[getset(get_copy = "pub")]
    duration: i64,
    #[getset(get = "pub")]
    fee: Decimal,
    #[getset(get_copy = "pub")]
    instances: u32,
}

impl InstanceFee {
    /// Folds one row in. `first_sighting` is true when the row's instance id
    /// has not been seen yet in the current period.
    pub fn record(&mut self, duration: i64, fee: Decimal, first_sighting: bool) -> Result<()> {
        if first_sighting {
            self.instances = self
                .instances
                .checked_add(1)
                .ok_or(BillingError::ValueOverflow)?;
        }

        self.duration = self
            .duration
            .checked_add(duration)
            .ok_or(BillingError::ValueOverflow)?;

        self.fee = self.fee.checked_add(fee).ok_or(BillingError::ValueOverflow)?;
        Ok(())
    }
}

/// Totals of one instance type within one billing period, kept for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Getters, CopyGetters)]
pub struct MonthlyTypeFee {
    #[getset(get = "pub")]
    fee: Decimal,
    #[getset(get_copy = "pub")]
    core_time: i64,
}

impl MonthlyTypeFee {
    pub fn add(&mut self, fee: Decimal, duration: i64, cores: u32) -> Result<()> {
        let core_time = duration
            .checked_mul(i64::from(cores))
            .ok_or(BillingError::ValueOverflow)?;

        self.core_time = self
            .core_time
            .checked_add(core_time)
            .ok_or(BillingError::ValueOverflow)?;

        self.fee = self.fee.checked_add(fee).ok_or(BillingError::ValueOverflow)?;
        Ok(())
    }

    /// Whole core-hours; partial hours are dropped.
    pub fn core_hours(&self) -> i64 {
        self.core_time / 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> HeaderIndex {
        HeaderIndex::resolve(&StringRecord::from(vec![
            "产品Code", "消费类型", "服务时长", "实例规格", "应付金额", "日期", "实例ID", "计费项",
        ]))
    }

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_qualifying_row() {
        let index = index();
        let rec = record(&["ecs", "后付费", "100", "ecs.g5.large", "10.0", "2024-01", "i-1", "云服务器配置"]);
        let row = BillRow::new(&rec, &index, 2);
        assert!(row.is_pay_as_you_go_instance());
        assert_eq!(row.instance_type(), "ecs.g5.large");
        assert_eq!(row.date(), "2024-01");
        assert_eq!(row.billing_period(), "");
    }

    #[test]
    fn test_line_item_mismatch_is_excluded() {
        let index = index();
        let rec = record(&["ecs", "后付费", "100", "ecs.g5.large", "10.0", "2024-01", "i-1", "系统盘"]);
        assert!(!BillRow::new(&rec, &index, 2).is_pay_as_you_go_instance());
    }

    #[test]
    fn test_line_item_check_skipped_without_column() {
        let index = HeaderIndex::resolve(&record(&["计费项x", "产品Code", "消费类型"]));
        let rec = record(&["anything", "ecs", "后付费"]);
        assert!(BillRow::new(&rec, &index, 2).is_pay_as_you_go_instance());
    }

    #[test]
    fn test_wrong_product_or_pay_type_is_excluded() {
        let index = index();
        let rec = record(&["rds", "后付费", "100", "t", "1", "d", "i", "云服务器配置"]);
        assert!(!BillRow::new(&rec, &index, 2).is_pay_as_you_go_instance());

        let rec = record(&["ecs", "预付费", "100", "t", "1", "d", "i", "云服务器配置"]);
        assert!(!BillRow::new(&rec, &index, 2).is_pay_as_you_go_instance());
    }

    #[test]
    fn test_lenient_parsing_degrades_to_zero() {
        let index = index();
        let rec = record(&["ecs", "后付费", "abc", "t", "n/a", "d", "i", "云服务器配置"]);
        let row = BillRow::new(&rec, &index, 2);
        assert_eq!(row.duration_or_zero(), 0);
        assert_eq!(row.fee_or_zero(), Decimal::ZERO);
    }

    #[test]
    fn test_strict_parsing_reports_line() {
        let index = index();
        let rec = record(&["ecs", "后付费", "abc", "t", "n/a", "d", "i", "云服务器配置"]);
        let row = BillRow::new(&rec, &index, 9);

        let err = row.fee().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BillingError>(),
            Some(BillingError::InvalidFee { line: 9, .. })
        ));
        assert!(row.duration().is_err());
    }

    #[test]
    fn test_fee_accepts_scientific_notation() -> Result<()> {
        let index = index();
        let rec = record(&["ecs", "后付费", "1", "t", "1.5e2", "d", "i", "云服务器配置"]);
        assert_eq!(BillRow::new(&rec, &index, 2).fee()?, dec!(150));
        Ok(())
    }

    #[test]
    fn test_instance_fee_counts_first_sighting_only() -> Result<()> {
        let mut fee = InstanceFee::default();
        fee.record(100, dec!(1.5), true)?;
        fee.record(50, dec!(0.5), false)?;
        fee.record(10, dec!(1), false)?;

        assert_eq!(fee.instances(), 1);
        assert_eq!(fee.duration(), 160);
        assert_eq!(*fee.fee(), dec!(3.0));
        Ok(())
    }

    #[test]
    fn test_monthly_type_fee_accumulates_core_time() -> Result<()> {
        let mut cell = MonthlyTypeFee::default();
        cell.add(dec!(10), 3600, 4)?;
        cell.add(dec!(2.5), 1800, 4)?;

        assert_eq!(*cell.fee(), dec!(12.5));
        assert_eq!(cell.core_time(), 21600);
        assert_eq!(cell.core_hours(), 6);
        Ok(())
    }

    #[test]
    fn test_monthly_type_fee_overflow() {
        let mut cell = MonthlyTypeFee::default();
        assert!(cell.add(dec!(1), i64::MAX, 2).is_err());
    }
}
