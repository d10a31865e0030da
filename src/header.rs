use csv::StringRecord;
use getset::CopyGetters;
use tracing::warn;

/// Logical columns of a billing export that the aggregators read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ProductCode,
    PayType,
    Duration,
    InstanceId,
    Fee,
    InstanceType,
    Date,
    LineItemType,
    BillingPeriod,
    InstanceConfig,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::ProductCode,
        Field::PayType,
        Field::Duration,
        Field::InstanceId,
        Field::Fee,
        Field::InstanceType,
        Field::Date,
        Field::LineItemType,
        Field::BillingPeriod,
        Field::InstanceConfig,
    ];

    /// Header labels identifying the column, as written by the export.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Field::ProductCode => &["产品Code"],
            Field::PayType => &["消费类型"],
            Field::Duration => &["服务时长"],
            Field::InstanceId => &["实例ID"],
            Field::Fee => &["应付金额"],
            Field::InstanceType => &["实例规格"],
            Field::Date => &["日期", "消费时间"],
            Field::LineItemType => &["计费项"],
            Field::BillingPeriod => &["账期"],
            Field::InstanceConfig => &["实例配置"],
        }
    }
}

/// Column positions resolved from the header row. `None` means the export has
/// no column with any of the field's labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct HeaderIndex {
    product_code: Option<usize>,
    pay_type: Option<usize>,
    duration: Option<usize>,
    instance_id: Option<usize>,
    fee: Option<usize>,
    instance_type: Option<usize>,
    date: Option<usize>,
    line_item_type: Option<usize>,
    billing_period: Option<usize>,
    instance_config: Option<usize>,
}

impl HeaderIndex {
    /// Scans every header cell; when a label appears more than once the last
    /// occurrence wins.
    pub fn resolve(headers: &StringRecord) -> Self {
        let mut index = HeaderIndex::default();
        for (position, label) in headers.iter().enumerate() {
            for field in Field::ALL {
                if field.labels().contains(&label) {
                    *index.slot_mut(field) = Some(position);
                }
            }
        }

        for field in index.unresolved() {
            warn!(?field, labels = ?field.labels(), "column not found in header row");
        }

        index
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        match field {
            Field::ProductCode => self.product_code,
            Field::PayType => self.pay_type,
            Field::Duration => self.duration,
            Field::InstanceId => self.instance_id,
            Field::Fee => self.fee,
            Field::InstanceType => self.instance_type,
            Field::Date => self.date,
            Field::LineItemType => self.line_item_type,
            Field::BillingPeriod => self.billing_period,
            Field::InstanceConfig => self.instance_config,
        }
    }

    pub fn unresolved(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.position(*field).is_none())
            .collect()
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::ProductCode => &mut self.product_code,
            Field::PayType => &mut self.pay_type,
            Field::Duration => &mut self.duration,
            Field::InstanceId => &mut self.instance_id,
            Field::Fee => &mut self.fee,
            Field::InstanceType => &mut self.instance_type,
            Field::Date => &mut self.date,
            Field::LineItemType => &mut self.line_item_type,
            Field::BillingPeriod => &mut self.billing_period,
            Field::InstanceConfig => &mut self.instance_config,
        }
    }
}
