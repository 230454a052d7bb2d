//! Byte-multiple unit conversion
//!
//! Converts magnitudes between decimal (`kb`, `mb`, ...) and binary (`kib`,
//! `mib`, ...) byte multiples. Both short names and the long names used by the
//! billing catalog (`gibibyte`, `terabyte`, ...) are accepted. Matching is
//! exact and case-sensitive.

use crate::error::{CostError, Result};

const KILO: f64 = 1000.0;
const KIBI: f64 = 1024.0;

/// Size of one unit in bytes, or `None` for unknown units.
pub fn factor(unit: &str) -> Option<f64> {
    let f = match unit {
        "b" | "byte" => 1.0,
        "kb" | "kilobyte" => KILO,
        "mb" | "megabyte" => KILO.powi(2),
        "gb" | "gigabyte" => KILO.powi(3),
        "tb" | "terabyte" => KILO.powi(4),
        "pb" | "petabyte" => KILO.powi(5),
        "kib" | "kibibyte" => KIBI,
        "mib" | "mebibyte" => KIBI.powi(2),
        "gib" | "gibibyte" => KIBI.powi(3),
        "tib" | "tebibyte" => KIBI.powi(4),
        "pib" | "pebibyte" => KIBI.powi(5),
        _ => return None,
    };
    Some(f)
}

/// Whether `unit` is a known unit name.
pub fn is_supported(unit: &str) -> bool {
    factor(unit).is_some()
}

/// Convert `amount` expressed in `from` into `to`.
pub fn convert(from: &str, amount: f64, to: &str) -> Result<f64> {
    let from_factor = factor(from).ok_or_else(|| CostError::UnknownUnit(from.to_string()))?;
    let to_factor = factor(to).ok_or_else(|| CostError::UnknownUnit(to.to_string()))?;
    Ok(amount * from_factor / to_factor)
}
