//! Small numeric helpers shared by the reporting services.
//!
//! Amounts and percentages are `Decimal` and are rounded with `round_dp(2)`
//! at reporting boundaries. Dispersion needs a square root, so standard
//! deviations and z-scores are computed in `f64`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

pub fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Decimal from a statistic computed in `f64`; non-finite input maps to zero.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    sum.checked_div(Decimal::from(values.len()))
}

/// Population standard deviation (divides by N).
pub fn population_std(values: &[Decimal]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let xs: Vec<f64> = values.iter().map(|v| as_f64(*v)).collect();
    let avg = xs.iter().sum::<f64>() / xs.len() as f64;
    let variance = xs.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / xs.len() as f64;
    Some(variance.sqrt())
}

/// Percentage of `part` over `whole`, or `fallback` when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal, fallback: Decimal) -> Decimal {
    if whole.is_zero() {
        return fallback;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(fallback)
}
