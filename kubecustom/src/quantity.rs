//! Conversion of Kubernetes resource quantities into whole CPU cores and
//! decimal gigabytes.

use snafu::{OptionExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Quantity '{quantity}' does not start with a number"))]
    InvalidNumber { quantity: String },

    #[snafu(display(
        "The CPU unit '{unit}' of quantity '{quantity}' is not supported, expected one of n, u, m \
         or no unit"
    ))]
    UnsupportedCpuUnit { quantity: String, unit: String },

    #[snafu(display(
        "The memory unit '{unit}' of quantity '{quantity}' is not supported, expected one of Ki, \
         Mi, Gi, Ti, Pi, Ei, k, M, G, T, P, E, m or no unit"
    ))]
    UnsupportedMemoryUnit { quantity: String, unit: String },
}

/// CPU usage in whole cores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpuCores {
    pub cores: f64,

    /// Set when the quantity carried no unit and was read as whole cores.
    pub unit_inferred: bool,
}

/// Parses a CPU quantity such as `250m`, `1234567n` or `2`.
///
/// # Errors
///
/// Fails when the number cannot be read or the suffix is not a CPU unit.
pub fn parse_cpu(quantity: &str) -> Result<CpuCores, Error> {
    let (value, unit) = split(quantity)?;
    let factor = match unit {
        "" => return Ok(CpuCores { cores: value, unit_inferred: true }),
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        _ => {
            return UnsupportedCpuUnitSnafu { quantity: quantity.to_string(), unit: unit.to_string() }
                .fail();
        }
    };
    Ok(CpuCores { cores: value * factor, unit_inferred: false })
}

/// Parses a memory quantity such as `512Mi` or `2G` into decimal gigabytes.
/// A bare number is a count of bytes.
///
/// # Errors
///
/// Fails when the number cannot be read or the suffix is not a memory unit.
pub fn parse_memory_gb(quantity: &str) -> Result<f64, Error> {
    const BYTES_PER_GB: f64 = 1e9;
    const KIBI: f64 = 1024.0;

    let (value, unit) = split(quantity)?;
    let bytes_per_unit = match unit {
        "" => 1.0,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => KIBI,
        "Mi" => KIBI.powi(2),
        "Gi" => KIBI.powi(3),
        "Ti" => KIBI.powi(4),
        "Pi" => KIBI.powi(5),
        "Ei" => KIBI.powi(6),
        _ => {
            return UnsupportedMemoryUnitSnafu {
                quantity: quantity.to_string(),
                unit: unit.to_string(),
            }
            .fail();
        }
    };
    Ok(value * bytes_per_unit / BYTES_PER_GB)
}

fn split(quantity: &str) -> Result<(f64, &str), Error> {
    let quantity = quantity.trim();
    let boundary =
        quantity.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(quantity.len());
    let (number, unit) = quantity.split_at(boundary);
    let value = number
        .parse::<f64>()
        .ok()
        .context(InvalidNumberSnafu { quantity: quantity.to_string() })?;
    Ok((value, unit))
}
