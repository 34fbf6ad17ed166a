//! Historical titular statistics per person.
//!
//! CohortStats are queried fresh at the start of every allocation run.
//! `RunStats` layers the titulars placed during the run on top, so
//! later pulls in the same week see the updated totals.

use crate::{
    calendar::DayCategory,
    model::{AllocationRecord, AllocationRole},
    types::PersonId,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_WINDOW_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CohortStats {
    pub total: u32,
    pub regular: u32,
    pub special: u32,
}

impl CohortStats {
    pub fn add_titular(&mut self, category: DayCategory) {
        self.total += 1;
        match category {
            DayCategory::Regular => self.regular += 1,
            DayCategory::Special => self.special += 1,
            DayCategory::Off => {}
        }
    }

    /// Tally TITULAR records dated within `[as_of - window_days, as_of)`.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a AllocationRecord>,
        as_of: NaiveDate,
        window_days: i64,
    ) -> HashMap<PersonId, CohortStats> {
        let start = as_of - Duration::days(window_days);
        let mut out: HashMap<PersonId, CohortStats> = HashMap::new();
        for record in records {
            if record.role != AllocationRole::Titular {
                continue;
            }
            if record.date < start || record.date >= as_of {
                continue;
            }
            out.entry(record.person_id.clone())
                .or_default()
                .add_titular(record.category);
        }
        out
    }
}

/// Mean of each stat across the people considered for a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CohortAverages {
    pub total: f64,
    pub regular: f64,
    pub special: f64,
}

/// Base stats plus the titulars tallied during one allocation run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    stats: HashMap<PersonId, CohortStats>,
}

impl RunStats {
    pub fn new(base: HashMap<PersonId, CohortStats>) -> Self {
        Self { stats: base }
    }

    pub fn get(&self, person_id: &str) -> CohortStats {
        self.stats.get(person_id).copied().unwrap_or_default()
    }

    pub fn note_titular(&mut self, person_id: &str, category: DayCategory) {
        self.stats
            .entry(person_id.to_string())
            .or_default()
            .add_titular(category);
    }

    /// Averages over `members`; people without history count as zero.
    pub fn averages<'a>(&self, members: impl IntoIterator<Item = &'a PersonId>) -> CohortAverages {
        let mut sum = CohortAverages::default();
        let mut n = 0usize;
        for id in members {
            let s = self.get(id);
            sum.total += f64::from(s.total);
            sum.regular += f64::from(s.regular);
            sum.special += f64::from(s.special);
            n += 1;
        }
        if n == 0 {
            return CohortAverages::default();
        }
        let n = n as f64;
        CohortAverages {
            total: sum.total / n,
            regular: sum.regular / n,
            special: sum.special / n,
        }
    }
}
