use crate::errors::BillingError;
use anyhow::Result;
use tracing::warn;

const UNKNOWN_TYPE_CORES: u32 = 16;
const FALLBACK_CORES: u32 = 4;
const CORES_PER_XLARGE: u32 = 4;

/// Core count implied by an instance type named `family.generation.size`.
///
/// `small` is one core, `medium` and `large` are two, `xlarge` is four and
/// `Nxlarge` is `N * 4`, or zero when `N` is unreadable or too large. Any other
/// size falls back to four cores; a name that is not exactly three segments is
/// counted as sixteen.
pub fn cores_for_instance_type(instance_type: &str) -> u32 {
    let segments: Vec<&str> = instance_type.split('.').collect();
    let [_, _, size] = segments.as_slice() else {
        warn!(instance_type, "unexpected instance type name, assuming {UNKNOWN_TYPE_CORES} cores");
        return UNKNOWN_TYPE_CORES;
    };

    match *size {
        "small" => 1,
        "medium" | "large" => 2,
        size => {
            let parts: Vec<&str> = size.split("large").collect();
            match parts.as_slice() {
                [prefix, _] if prefix.len() > 1 => {
                    let multiplier = prefix.split('x').next().unwrap_or_default();
                    multiplier
                        .parse::<u32>()
                        .ok()
                        .and_then(|n| n.checked_mul(CORES_PER_XLARGE))
                        .unwrap_or(0)
                }
                [_, _] => CORES_PER_XLARGE,
                _ => FALLBACK_CORES,
            }
        }
    }
}

/// Reads the CPU core count from a `key:value;key:value` instance
/// configuration. The last attribute mentioning `CPU` wins; `None` when no
/// attribute does.
pub fn cores_from_config(config: &str, line: u64) -> Result<Option<u32>> {
    let mut cores = None;
    for attribute in config.split(';').filter(|attr| attr.contains("CPU")) {
        let parsed = attribute
            .split(':')
            .nth(1)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .ok_or_else(|| BillingError::InvalidCpuAttribute {
                line,
                attribute: attribute.to_owned(),
            })?;
        cores = Some(parsed);
    }
    Ok(cores)
}
