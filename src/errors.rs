use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("input has no header row")]
    EmptyInput,

    #[error("line {line}: fee {value:?} is not a number")]
    InvalidFee { line: u64, value: String },

    #[error("line {line}: duration {value:?} is not an integer")]
    InvalidDuration { line: u64, value: String },

    #[error("line {line}: cannot read core count from instance configuration attribute {attribute:?}")]
    InvalidCpuAttribute { line: u64, attribute: String },

    #[error("value overflow")]
    ValueOverflow,
}
