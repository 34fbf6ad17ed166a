//! Fairness priority score. Lower score = higher priority.
//!
//!   score = 5 * max(0, special - avg_special)
//!         + 3 * max(0, total - avg_total)
//!   SPECIAL day: - 4 * max(0, avg_special - special)
//!                + 2 * max(0, special - avg_special)
//!   otherwise:   + 0.5 * special
//!   total below average: - 2

use crate::{
    calendar::DayCategory,
    stats::{CohortAverages, CohortStats},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FairnessCoefficients {
    pub special_excess: f64,
    pub total_excess: f64,
    pub special_day_deficit_bonus: f64,
    pub special_day_excess: f64,
    pub other_day_special: f64,
    pub recovery_bonus: f64,
}

impl Default for FairnessCoefficients {
    fn default() -> Self {
        Self {
            special_excess: 5.0,
            total_excess: 3.0,
            special_day_deficit_bonus: 4.0,
            special_day_excess: 2.0,
            other_day_special: 0.5,
            recovery_bonus: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FairnessScorer {
    pub coefficients: FairnessCoefficients,
}

impl FairnessScorer {
    pub fn new(coefficients: FairnessCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn score(&self, stats: &CohortStats, averages: &CohortAverages, category: DayCategory) -> f64 {
        let c = &self.coefficients;
        let special = f64::from(stats.special);
        let total = f64::from(stats.total);

        let special_excess = (special - averages.special).max(0.0);
        let mut score = c.special_excess * special_excess
            + c.total_excess * (total - averages.total).max(0.0);

        if category == DayCategory::Special {
            score -= c.special_day_deficit_bonus * (averages.special - special).max(0.0);
            score += c.special_day_excess * special_excess;
        } else {
            score += c.other_day_special * special;
        }

        if total < averages.total {
            score -= c.recovery_bonus;
        }

        score
    }
}
