//! Inequality of a per-person load distribution.
//!
//! injustice = population std-dev / mean (coefficient of variation).
//! 0 means perfectly even load; there is no upper bound.

use crate::types::PersonId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Returned for an empty distribution instead of failing.
pub const EMPTY_DISTRIBUTION_INJUSTICE: f64 = 999.0;

pub fn injustice<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    match LoadSummary::of(values) {
        Some(summary) => summary.coefficient_of_variation,
        None => EMPTY_DISTRIBUTION_INJUSTICE,
    }
}

pub fn injustice_of(loads: &BTreeMap<PersonId, u32>) -> f64 {
    injustice(loads.values().map(|&v| f64::from(v)))
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LoadSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// max - min
    pub gap: f64,
    pub coefficient_of_variation: f64,
}

impl LoadSummary {
    pub fn of<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let min = values.iter().copied().fold(f64::MAX, f64::min);

        // An all-zero distribution is perfectly even.
        let coefficient_of_variation = if mean == 0.0 { 0.0 } else { std_dev / mean };

        Some(Self {
            count: values.len(),
            mean,
            std_dev,
            gap: max - min,
            coefficient_of_variation,
        })
    }
}
